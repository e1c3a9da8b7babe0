//! Configuration surface: outbound credentials and the threshold document.
//!
//! Loading a configuration is always two independent, fallible-but-never-
//! fatal steps: reading credentials from the environment (an absent
//! credential disables exactly one provider, never the process) and parsing
//! the threshold JSON document (a missing or malformed document falls back
//! to [`crate::thresholds::ThresholdSnapshot::default`]).

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::thresholds::ThresholdSnapshot;

/// Outbound credentials and endpoints, one field per collaborator named in
/// the external interfaces.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub ipinfo_token: Option<String>,
    pub vpnapi_key: Option<String>,
    pub ipqualityscore_key: Option<String>,
    pub iphub_key: Option<String>,
    pub abstractapi_key: Option<String>,
    pub ipapi_key: Option<String>,
    pub generative_model_key: Option<String>,
    pub qdrant_url: Option<String>,
    pub qdrant_api_key: Option<String>,
}

impl Credentials {
    /// Reads the environment-style key/value pairs named in the external
    /// interfaces section. Every field is independently optional.
    pub fn from_env() -> Self {
        Self {
            ipinfo_token: std::env::var("IPINFO_TOKEN").ok(),
            vpnapi_key: std::env::var("VPNAPI_KEY").ok(),
            ipqualityscore_key: std::env::var("IPQUALITYSCORE_KEY").ok(),
            iphub_key: std::env::var("IPHUB_KEY").ok(),
            abstractapi_key: std::env::var("ABSTRACTAPI_KEY").ok(),
            ipapi_key: std::env::var("IPAPI_KEY").ok(),
            generative_model_key: std::env::var("GEMINI_API_KEY").ok(),
            qdrant_url: std::env::var("QDRANT_URL").ok(),
            qdrant_api_key: std::env::var("QDRANT_API_KEY").ok(),
        }
    }
}

/// Default per-provider call deadline (§4.B, §5).
pub const DEFAULT_PROVIDER_DEADLINE: Duration = Duration::from_secs(5);

/// Timeout overrides, one per suspendable collaborator.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub vpn_provider: Duration,
    pub embedding: Duration,
    pub vector_store: Duration,
    pub generative_model: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            vpn_provider: DEFAULT_PROVIDER_DEADLINE,
            embedding: DEFAULT_PROVIDER_DEADLINE,
            vector_store: DEFAULT_PROVIDER_DEADLINE,
            generative_model: Duration::from_secs(15),
        }
    }
}

/// Process-wide configuration: credentials, timeouts, and the threshold
/// document that seeds the [`crate::thresholds::ThresholdRegistry`].
#[derive(Debug, Clone)]
pub struct GeoVerityConfig {
    pub credentials: Credentials,
    pub timeouts: Timeouts,
}

impl GeoVerityConfig {
    pub fn from_env() -> Self {
        Self {
            credentials: Credentials::from_env(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Raw threshold document as loaded from JSON, before being resolved into a
/// [`ThresholdSnapshot`]. Top-level keys outside the known groups are kept
/// in `unknown` but never read by anything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThresholdDocument {
    #[serde(default)]
    location: Option<PartialLocation>,
    #[serde(default)]
    environment: Option<PartialEnvironment>,
    #[serde(default)]
    vpn: Option<PartialVpn>,
    #[serde(default)]
    scoring: Option<PartialScoring>,
    #[serde(default, rename = "patternAnalysis")]
    pattern_analysis: Option<PartialPatternAnalysis>,
    #[serde(flatten)]
    unknown: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialLocation {
    #[serde(rename = "responseTime")]
    response_time: Option<PartialRange<u64>>,
    accuracy: Option<PartialRange<f64>>,
    score: Option<PartialScoreRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialRange<T> {
    suspicious: Option<T>,
    low: Option<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialScoreRange {
    #[serde(rename = "likelySpoofed")]
    likely_spoofed: Option<u32>,
    suspicious: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialEnvironment {
    score: Option<PartialEnvScore>,
    #[serde(rename = "colorDepth")]
    color_depth: Option<PartialColorDepth>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialEnvScore {
    #[serde(rename = "likelyRemote")]
    likely_remote: Option<u32>,
    #[serde(rename = "possiblyRemote")]
    possibly_remote: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialColorDepth {
    #[serde(rename = "rdpIndicator")]
    rdp_indicator: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialVpn {
    confidence: Option<PartialVpnConfidence>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialVpnConfidence {
    detected: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialScoring {
    deductions: Option<PartialDeductions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialDeductions {
    #[serde(rename = "locationWarning")]
    location_warning: Option<u32>,
    #[serde(rename = "locationFail")]
    location_fail: Option<u32>,
    #[serde(rename = "environmentWarning")]
    environment_warning: Option<u32>,
    #[serde(rename = "environmentFail")]
    environment_fail: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialPatternAnalysis {
    #[serde(rename = "vpnDetected")]
    vpn_detected: Option<u32>,
    #[serde(rename = "lowAccuracy")]
    low_accuracy: Option<u32>,
    #[serde(rename = "fastResponse")]
    fast_response: Option<u32>,
    #[serde(rename = "virtualGpu")]
    virtual_gpu: Option<u32>,
    #[serde(rename = "lowColorDepth")]
    low_color_depth: Option<u32>,
    #[serde(rename = "riskyNeighbours")]
    risky_neighbours: Option<u32>,
}

impl ThresholdDocument {
    /// Parse the document, falling back to an empty (all-default) document
    /// on any parse failure. Never returns an error: a malformed
    /// configuration file degrades to defaults rather than blocking startup.
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    /// Resolve this document over [`ThresholdSnapshot::default`], filling in
    /// only the keys that were actually present.
    pub fn resolve(&self) -> ThresholdSnapshot {
        let mut snapshot = ThresholdSnapshot::default();

        if let Some(loc) = &self.location {
            if let Some(rt) = &loc.response_time {
                if let Some(v) = rt.suspicious {
                    snapshot.location.response_time_suspicious_ms = v;
                }
            }
            if let Some(acc) = &loc.accuracy {
                if let Some(v) = acc.low {
                    snapshot.location.accuracy_low_m = v;
                }
            }
            if let Some(score) = &loc.score {
                if let Some(v) = score.likely_spoofed {
                    snapshot.location.score_likely_spoofed = v;
                }
                if let Some(v) = score.suspicious {
                    snapshot.location.score_suspicious = v;
                }
            }
        }

        if let Some(env) = &self.environment {
            if let Some(score) = &env.score {
                if let Some(v) = score.likely_remote {
                    snapshot.environment.score_likely_remote = v;
                }
                if let Some(v) = score.possibly_remote {
                    snapshot.environment.score_possibly_remote = v;
                }
            }
            if let Some(cd) = &env.color_depth {
                if let Some(v) = cd.rdp_indicator {
                    snapshot.environment.color_depth_rdp_indicator_bits = v;
                }
            }
        }

        if let Some(vpn) = &self.vpn {
            if let Some(conf) = &vpn.confidence {
                if let Some(v) = conf.detected {
                    snapshot.vpn.confidence_detected_pct = v;
                }
            }
        }

        if let Some(scoring) = &self.scoring {
            if let Some(d) = &scoring.deductions {
                if let Some(v) = d.location_warning {
                    snapshot.scoring.location_warning = v;
                }
                if let Some(v) = d.location_fail {
                    snapshot.scoring.location_fail = v;
                }
                if let Some(v) = d.environment_warning {
                    snapshot.scoring.environment_warning = v;
                }
                if let Some(v) = d.environment_fail {
                    snapshot.scoring.environment_fail = v;
                }
            }
        }

        if let Some(pa) = &self.pattern_analysis {
            if let Some(v) = pa.vpn_detected {
                snapshot.pattern_analysis.vpn_detected_bonus = v;
            }
            if let Some(v) = pa.low_accuracy {
                snapshot.pattern_analysis.low_accuracy_bonus = v;
            }
            if let Some(v) = pa.fast_response {
                snapshot.pattern_analysis.fast_response_bonus = v;
            }
            if let Some(v) = pa.virtual_gpu {
                snapshot.pattern_analysis.virtual_gpu_bonus = v;
            }
            if let Some(v) = pa.low_color_depth {
                snapshot.pattern_analysis.low_color_depth_bonus = v;
            }
            if let Some(v) = pa.risky_neighbours {
                snapshot.pattern_analysis.risky_neighbours_bonus = v;
            }
        }

        snapshot
    }

    /// Unknown top-level keys, preserved for forward-compatibility but never
    /// consulted by this crate.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.unknown.keys().map(String::as_str)
    }
}
