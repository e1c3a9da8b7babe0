//! VPN/proxy reputation provider result types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalised result of a single IP-reputation provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnProviderResult {
    pub provider: String,
    pub is_vpn: bool,
    pub is_proxy: bool,
    pub is_tor: bool,
    pub is_hosting: bool,
    pub is_relay: bool,
    /// 0-100 fraud score, when the provider exposes one.
    pub fraud_score: Option<f64>,
    pub organization: Option<String>,
    pub asn: Option<String>,
    pub isp: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    /// Set when the call failed; `is_vpn` etc. are meaningless in that case.
    pub error: Option<String>,
    /// Provider-specific fields that don't map onto the normalised shape.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl VpnProviderResult {
    pub fn errored(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            is_vpn: false,
            is_proxy: false,
            is_tor: false,
            is_hosting: false,
            is_relay: false,
            fraud_score: None,
            organization: None,
            asn: None,
            isp: None,
            city: None,
            region: None,
            country: None,
            error: Some(error.into()),
            extra: HashMap::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Diagnostics accompanying a [`VpnAggregateResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnAggregateDetails {
    pub total_checks: usize,
    pub vpn_detections: usize,
    /// Every provider result, successes and failures, in registry order.
    pub services: Vec<VpnProviderResult>,
    /// Set for short-circuit outcomes (private IP) or all-provider-error
    /// outcomes; absent otherwise.
    pub error: Option<String>,
}

/// Consensus verdict across all enabled providers for one IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnAggregateResult {
    pub ip: String,
    pub is_vpn: bool,
    /// 0-100, `round(100 * detections / successful_checks)`.
    pub confidence: u32,
    /// Providers that returned without error and flagged VPN/proxy.
    pub flagged_by: Vec<VpnProviderResult>,
    pub details: VpnAggregateDetails,
}

impl VpnAggregateResult {
    pub fn private_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            is_vpn: false,
            confidence: 0,
            flagged_by: Vec::new(),
            details: VpnAggregateDetails {
                total_checks: 0,
                vpn_detections: 0,
                services: Vec::new(),
                error: Some("Private IP".to_string()),
            },
        }
    }

    pub fn any_tor(&self) -> bool {
        self.details
            .services
            .iter()
            .any(|p| p.succeeded() && p.is_tor)
    }

    pub fn any_high_fraud_score(&self, threshold: f64) -> bool {
        self.details
            .services
            .iter()
            .any(|p| p.succeeded() && p.fraud_score.map(|s| s > threshold).unwrap_or(false))
    }
}
