//! The final response record the orchestrator returns.

use serde::{Deserialize, Serialize};

use super::flag::Flag;
use super::fingerprint::SessionFingerprint;
use super::risk::RiskEvaluation;
use super::vpn::VpnAggregateResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Authentic,
    Suspicious,
    LikelySpoofed,
    UnableToVerify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    LocalDesktop,
    PossiblyRemote,
    RemoteDesktop,
    VirtualMachine,
}

/// Full response of one `verify` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerificationStatus,
    pub location_score: u32,
    pub environment_score: u32,
    pub environment_kind: EnvironmentKind,
    pub location_flags: Vec<Flag>,
    pub environment_flags: Vec<Flag>,
    pub vpn: VpnAggregateResult,
    pub fingerprint: Option<SessionFingerprint>,
    pub risk: Option<RiskEvaluation>,
    /// Non-fatal problems encountered while assembling the verdict (a vector
    /// store or generative-model outage, for instance). Never populated from
    /// an `InputInvalid` failure — that short-circuits before a verdict is
    /// built at all.
    pub diagnostics: Vec<String>,
}
