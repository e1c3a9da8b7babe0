//! Generative risk evaluation: a single prompt over the fingerprint and up
//! to five neighbours, asking an external model for a structured verdict.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::Result;
use crate::model::{ProcessingMarker, RiskEvaluation, RiskTier};

use super::{RiskContext, RiskEvaluator};

const MAX_NEIGHBOURS_IN_PROMPT: usize = 5;

/// A call to an external text-generation model. `generate` must not retry
/// internally.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// The JSON shape requested from the model. Field names mirror the prompt's
/// instructions exactly so a well-behaved model's output deserialises
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerativeRiskResponse {
    #[serde(rename = "riskAssessment")]
    risk_assessment: String,
    confidence: u32,
    explanation: String,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default, rename = "technicalIndicators")]
    technical_indicators: Vec<String>,
    #[serde(default, rename = "spoofingTechniques")]
    spoofing_techniques: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(rename = "similarityInsights")]
    similarity_insights: Option<String>,
}

/// Result of attempting to parse the model's response as the requested
/// JSON object, replacing exception-based control flow around a malformed
/// response.
pub enum GenerativeOutcome {
    Parsed(GenerativeRiskResponse),
    Fallback(String),
}

fn parse_tier(raw: &str) -> RiskTier {
    match raw.to_uppercase().as_str() {
        "LOW" => RiskTier::Low,
        "MEDIUM" => RiskTier::Medium,
        "HIGH" => RiskTier::High,
        _ => RiskTier::Unknown,
    }
}

fn build_prompt(context: &RiskContext<'_>) -> String {
    let fingerprint_text = context.fingerprint.text_projection();
    let neighbour_text: Vec<String> = context
        .neighbours
        .iter()
        .take(MAX_NEIGHBOURS_IN_PROMPT)
        .map(|n| n.text_projection())
        .collect();

    format!(
        "You are assessing fraud risk for a client session.\n\n\
         Session fingerprint:\n{fingerprint_text}\n\n\
         Similar prior sessions ({count}):\n{neighbours}\n\n\
         Respond with a single JSON object with exactly these fields: \
         riskAssessment (one of LOW, MEDIUM, HIGH), confidence (0-100), \
         explanation, patterns, technicalIndicators, spoofingTechniques, \
         recommendations, similarityInsights.",
        count = neighbour_text.len(),
        neighbours = if neighbour_text.is_empty() {
            "none".to_string()
        } else {
            neighbour_text.join("\n---\n")
        }
    )
}

fn interpret(raw: &str) -> GenerativeOutcome {
    match serde_json::from_str::<GenerativeRiskResponse>(raw.trim()) {
        Ok(parsed) => GenerativeOutcome::Parsed(parsed),
        Err(_) => GenerativeOutcome::Fallback(raw.to_string()),
    }
}

/// Drives the generative path. Falls back to the provided `lite` evaluator
/// whenever the model is unreachable or misbehaves, so a full-path request
/// degrades gracefully rather than failing.
pub struct FullRiskEvaluator<C: GenerativeClient> {
    client: C,
}

impl<C: GenerativeClient> FullRiskEvaluator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: GenerativeClient> RiskEvaluator for FullRiskEvaluator<C> {
    #[instrument(name = "risk.evaluate_full", skip(self, context))]
    async fn evaluate(&self, context: &RiskContext<'_>) -> RiskEvaluation {
        let prompt = build_prompt(context);

        let raw = match self.client.generate(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "generative model unavailable, falling back");
                return RiskEvaluation {
                    tier: RiskTier::Medium,
                    confidence: 70,
                    explanation: format!("generative model unavailable: {err}"),
                    risk_factors: Vec::new(),
                    patterns: Vec::new(),
                    recommendations: Vec::new(),
                    similarity_insights: None,
                    processing: ProcessingMarker::Error,
                };
            }
        };

        match interpret(&raw) {
            GenerativeOutcome::Parsed(parsed) => RiskEvaluation {
                tier: parse_tier(&parsed.risk_assessment),
                confidence: parsed.confidence.min(100),
                explanation: parsed.explanation,
                risk_factors: parsed.technical_indicators,
                patterns: parsed.patterns,
                recommendations: parsed.recommendations,
                similarity_insights: parsed.similarity_insights,
                processing: ProcessingMarker::Full,
            },
            GenerativeOutcome::Fallback(text) => RiskEvaluation {
                tier: RiskTier::Medium,
                confidence: 70,
                explanation: text,
                risk_factors: Vec::new(),
                patterns: Vec::new(),
                recommendations: Vec::new(),
                similarity_insights: None,
                processing: ProcessingMarker::Full,
            },
        }
    }
}
