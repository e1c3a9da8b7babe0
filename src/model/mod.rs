//! Request-scoped data types shared across the pipeline.

mod fingerprint;
mod flag;
mod risk;
mod signal;
mod verdict;
mod vpn;

pub use fingerprint::{
    FingerprintEnvironment, FingerprintLocation, FingerprintNetwork, FingerprintSummary,
    RiskBucket, SessionFingerprint,
};
pub use flag::{Flag, Severity};
pub use risk::{ProcessingMarker, RiskEvaluation, RiskTier};
pub use signal::{EnvironmentSignal, LocationSignal, NetworkSignal};
pub use verdict::{EnvironmentKind, Verdict, VerificationStatus};
pub use vpn::{VpnAggregateDetails, VpnAggregateResult, VpnProviderResult};
