//! The session fingerprint: a deterministic, structured summary of one
//! verification request, used both as the vector-store payload and as the
//! source text for its embedding.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse-grained risk bucket derived from the location/environment scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    Low,
    Medium,
    High,
    Unknown,
}

/// Normalised location subset carried on the fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub response_time_ms: Option<u64>,
    pub is_vpn: bool,
    pub vpn_confidence: u32,
}

/// Normalised environment subset carried on the fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintEnvironment {
    pub platform: Option<String>,
    pub resolution: Option<String>,
    pub gpu: Option<String>,
    pub user_agent: Option<String>,
    pub color_depth_bits: Option<u32>,
}

/// Normalised network subset carried on the fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintNetwork {
    pub client_ip: Option<String>,
    pub candidate_ips: Vec<String>,
}

/// Derived, lightweight summary of the fingerprint, used by the lite risk
/// evaluator and displayed to operators without re-deriving the full scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintSummary {
    pub location_score: Option<u32>,
    pub environment_score: Option<u32>,
    pub overall_risk: RiskBucket,
    /// Concatenation of every warning/fail flag message, in the order the
    /// scoring rules produced them. Critical flags are surfaced in the
    /// location verdict's own flag list, not duplicated here.
    pub spoofing_indicators: Vec<String>,
}

/// The canonical, deterministic session fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFingerprint {
    pub id: Uuid,
    pub timestamp_ms: i64,
    pub location: FingerprintLocation,
    pub environment: FingerprintEnvironment,
    pub network: FingerprintNetwork,
    pub summary: FingerprintSummary,
}

impl FingerprintSummary {
    /// avg < 40 -> high, < 70 -> medium, else low; either score missing ->
    /// unknown.
    pub fn bucket_for(location_score: Option<u32>, environment_score: Option<u32>) -> RiskBucket {
        match (location_score, environment_score) {
            (Some(l), Some(e)) => {
                let avg = (l as f64 + e as f64) / 2.0;
                if avg < 40.0 {
                    RiskBucket::High
                } else if avg < 70.0 {
                    RiskBucket::Medium
                } else {
                    RiskBucket::Low
                }
            }
            _ => RiskBucket::Unknown,
        }
    }
}

/// Fixed line-prefixes for the canonical text projection. Order and exact
/// prefixes matter: identical fingerprints must yield byte-identical text so
/// that embeddings (and hence vector-store ids derived from them) agree.
mod projection {
    pub const LOCATION: &str = "location";
    pub const ACCURACY: &str = "accuracy_m";
    pub const VPN: &str = "vpn";
    pub const PLATFORM: &str = "platform";
    pub const RESOLUTION: &str = "resolution";
    pub const GPU: &str = "gpu";
    pub const USER_AGENT: &str = "user_agent";
    pub const IPS: &str = "observed_ips";
    pub const RISK: &str = "risk";
    pub const LOCATION_SCORE: &str = "location_score";
    pub const ENVIRONMENT_SCORE: &str = "environment_score";
    pub const INDICATORS: &str = "spoofing_indicators";
}

impl SessionFingerprint {
    /// Canonical line-oriented text projection used as embedding input.
    pub fn text_projection(&self) -> String {
        let mut lines = Vec::with_capacity(11);

        lines.push(format!(
            "{}: {}",
            projection::LOCATION,
            match (self.location.latitude, self.location.longitude) {
                (Some(lat), Some(lon)) => format!("{lat},{lon}"),
                _ => "unknown".to_string(),
            }
        ));
        lines.push(format!(
            "{}: {}",
            projection::ACCURACY,
            self.location
                .accuracy_m
                .map(|a| a.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));
        lines.push(format!(
            "{}: {} ({}%)",
            projection::VPN,
            self.location.is_vpn,
            self.location.vpn_confidence
        ));
        lines.push(format!(
            "{}: {}",
            projection::PLATFORM,
            self.environment.platform.as_deref().unwrap_or("unknown")
        ));
        lines.push(format!(
            "{}: {}",
            projection::RESOLUTION,
            self.environment.resolution.as_deref().unwrap_or("unknown")
        ));
        lines.push(format!(
            "{}: {}",
            projection::GPU,
            self.environment.gpu.as_deref().unwrap_or("unknown")
        ));
        lines.push(format!(
            "{}: {}",
            projection::USER_AGENT,
            self.environment.user_agent.as_deref().unwrap_or("unknown")
        ));
        lines.push(format!(
            "{}: {}",
            projection::IPS,
            if self.network.candidate_ips.is_empty() {
                "none".to_string()
            } else {
                self.network.candidate_ips.join(",")
            }
        ));
        lines.push(format!(
            "{}: {:?}",
            projection::RISK,
            self.summary.overall_risk
        ));
        lines.push(format!(
            "{}: {}",
            projection::LOCATION_SCORE,
            self.summary
                .location_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));
        lines.push(format!(
            "{}: {}",
            projection::ENVIRONMENT_SCORE,
            self.summary
                .environment_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));
        lines.push(format!(
            "{}: {}",
            projection::INDICATORS,
            if self.summary.spoofing_indicators.is_empty() {
                "none".to_string()
            } else {
                self.summary.spoofing_indicators.join("; ")
            }
        ));

        lines.join("\n")
    }
}
