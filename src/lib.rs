//! # geo-verity-core
//!
//! Location/device fraud-detection core: scores whether a client-reported
//! geographic location is authentic, whether the client's environment looks
//! like a real device, and aggregates IP-reputation evidence across
//! multiple providers. Ships a deterministic fast risk path and an optional
//! generative one, both backed by a session-fingerprint vector index for
//! pattern analysis.
//!
//! ## Core Components
//!
//! - **Orchestrator**: drives one verification request end-to-end
//! - **VPN Aggregator**: concurrent multi-provider IP-reputation dispatch
//! - **Fingerprint Builder**: deterministic per-session structured summary
//! - **Risk Evaluator**: lite (deterministic) and full (generative) paths
//!
//! ## Example
//!
//! ```rust,ignore
//! use geo_verity_core::{Orchestrator, RiskMode, LocationSignal, EnvironmentSignal, NetworkSignal};
//!
//! let verdict = orchestrator
//!     .verify(location, environment, network, "203.0.113.5", RiskMode::Lite)
//!     .await?;
//! println!("{:?}", verdict.status);
//! ```

pub mod config;
pub mod embedding;
pub mod environment;
pub mod error;
pub mod fingerprint;
pub mod location;
pub mod model;
pub mod net;
pub mod orchestrator;
pub mod risk;
pub mod thresholds;
pub mod vpn;

pub use config::{Credentials, GeoVerityConfig, ThresholdDocument, Timeouts};
pub use error::{Error, Result};
pub use model::{
    EnvironmentKind, EnvironmentSignal, Flag, LocationSignal, NetworkSignal, ProcessingMarker,
    RiskBucket, RiskEvaluation, RiskTier, Severity, SessionFingerprint, Verdict,
    VerificationStatus, VpnAggregateDetails, VpnAggregateResult, VpnProviderResult,
};
pub use orchestrator::{Orchestrator, RiskMode};
pub use risk::{RiskContext, RiskEvaluator};
pub use thresholds::{ThresholdRegistry, ThresholdSnapshot};
pub use vpn::{VpnAggregator, VpnProvider};
