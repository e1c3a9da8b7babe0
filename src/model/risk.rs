//! Risk evaluator output shape, shared by the lite and full paths.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Unknown,
}

/// Which evaluator path produced a [`RiskEvaluation`], and whether it
/// completed normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMarker {
    Fast,
    Full,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvaluation {
    pub tier: RiskTier,
    /// 0-100.
    pub confidence: u32,
    pub explanation: String,
    pub risk_factors: Vec<String>,
    pub patterns: Vec<String>,
    pub recommendations: Vec<String>,
    pub similarity_insights: Option<String>,
    pub processing: ProcessingMarker,
}

impl RiskEvaluation {
    /// The evaluator never propagates an internal error; it downgrades to
    /// this instead.
    pub fn unknown(explanation: impl Into<String>) -> Self {
        Self {
            tier: RiskTier::Unknown,
            confidence: 0,
            explanation: explanation.into(),
            risk_factors: Vec::new(),
            patterns: Vec::new(),
            recommendations: Vec::new(),
            similarity_insights: None,
            processing: ProcessingMarker::Error,
        }
    }
}
