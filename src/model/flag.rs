//! Evidence flags shared by every scoring component.

use serde::{Deserialize, Serialize};

/// Severity of a single piece of scoring evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Fail,
    Critical,
}

/// One piece of evidence raised by a scoring rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
    pub severity: Severity,
    /// Short machine-readable message (stable across releases; matched on in
    /// tests and by the lite risk evaluator's pattern rules).
    pub message: String,
    pub explanation: Option<String>,
}

impl Flag {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn is_spoofing_indicator(&self) -> bool {
        matches!(self.severity, Severity::Warning | Severity::Fail)
    }
}
