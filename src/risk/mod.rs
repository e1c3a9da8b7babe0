//! Risk evaluation: a deterministic "lite" path and a generative "full"
//! path, both producing the same [`RiskEvaluation`] shape.

pub mod full;
pub mod lite;

use async_trait::async_trait;

use crate::model::{RiskEvaluation, SessionFingerprint};

/// One fingerprint plus its nearest neighbours from the vector store, the
/// shared input to both evaluator paths.
pub struct RiskContext<'a> {
    pub fingerprint: &'a SessionFingerprint,
    pub neighbours: &'a [SessionFingerprint],
}

/// Produces a [`RiskEvaluation`] for a fingerprint and its neighbours.
/// Neither path is allowed to propagate an error to the caller: internal
/// failures degrade to [`RiskEvaluation::unknown`].
#[async_trait]
pub trait RiskEvaluator: Send + Sync {
    async fn evaluate(&self, context: &RiskContext<'_>) -> RiskEvaluation;
}
