//! Deterministic, fast risk evaluation: a fixed tally of bonuses over the
//! fingerprint and its neighbours.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::model::{ProcessingMarker, RiskBucket, RiskEvaluation, RiskTier};
use crate::thresholds::{LocationThresholds, PatternAnalysisThresholds};

use super::full::GenerativeClient;
use super::{RiskContext, RiskEvaluator};

const FAST_RESPONSE_THRESHOLD_MS: u64 = 10;
const LOW_COLOR_DEPTH_THRESHOLD_BITS: u32 = 24;
const VM_GPU_KEYWORDS: &[&str] = &["vmware", "virtualbox", "microsoft basic", "llvmpipe"];

/// Tallies fixed per-signal bonuses into a risk score and a matching
/// explanation. Never returns an error: any computed value outside its
/// documented range is clamped and the evaluation downgrades to
/// [`RiskEvaluation::unknown`] rather than propagating.
///
/// When a generative client is attached, the explanation is a one-sentence
/// model summary requested on a best-effort basis; otherwise (or if that
/// call fails) a templated sentence is used. The tally itself is always
/// deterministic regardless of the client's availability.
pub struct LiteRiskEvaluator {
    pub location: LocationThresholds,
    pub pattern_analysis: PatternAnalysisThresholds,
    summary_client: Option<Arc<dyn GenerativeClient>>,
}

impl LiteRiskEvaluator {
    pub fn new(location: LocationThresholds, pattern_analysis: PatternAnalysisThresholds) -> Self {
        Self {
            location,
            pattern_analysis,
            summary_client: None,
        }
    }

    /// Attaches a generative client used for a best-effort one-sentence
    /// summary of the explanation. Falls back to [`Self::templated_explanation`]
    /// whenever the client is unreachable.
    pub fn with_summary_client(mut self, client: Arc<dyn GenerativeClient>) -> Self {
        self.summary_client = Some(client);
        self
    }

    fn summary_prompt(tier: RiskTier, factors: &[String]) -> String {
        if factors.is_empty() {
            "In one sentence, summarise that no notable fraud-risk signals \
             were found in this session."
                .to_string()
        } else {
            format!(
                "In one sentence, summarise why a session classified as \
                 {tier:?} risk triggered these signals: {}.",
                factors.join(", ")
            )
        }
    }

    async fn explain(&self, tier: RiskTier, factors: &[String]) -> String {
        let Some(client) = &self.summary_client else {
            return Self::templated_explanation(tier, factors);
        };
        let prompt = Self::summary_prompt(tier, factors);
        match client.generate(&prompt).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => Self::templated_explanation(tier, factors),
            Err(err) => {
                warn!(error = %err, "generative summary unavailable, falling back to templated explanation");
                Self::templated_explanation(tier, factors)
            }
        }
    }

    fn tally(&self, context: &RiskContext<'_>) -> (u32, Vec<String>) {
        let fp = context.fingerprint;
        let mut score: u32 = 0;
        let mut factors = Vec::new();

        if fp.location.is_vpn {
            score += self.pattern_analysis.vpn_detected_bonus;
            factors.push("VPN/proxy detected".to_string());
        }

        if fp
            .location
            .accuracy_m
            .map(|a| a > self.location.accuracy_low_m)
            .unwrap_or(false)
        {
            score += self.pattern_analysis.low_accuracy_bonus;
            factors.push("Low location accuracy".to_string());
        }

        if fp
            .location
            .response_time_ms
            .map(|rt| rt < FAST_RESPONSE_THRESHOLD_MS)
            .unwrap_or(false)
        {
            score += self.pattern_analysis.fast_response_bonus;
            factors.push("Suspiciously fast response time".to_string());
        }

        let gpu_is_virtual = fp
            .environment
            .gpu
            .as_deref()
            .map(|gpu| {
                let lower = gpu.to_lowercase();
                VM_GPU_KEYWORDS.iter().any(|kw| lower.contains(kw))
            })
            .unwrap_or(false);
        if gpu_is_virtual {
            score += self.pattern_analysis.virtual_gpu_bonus;
            factors.push("Virtual machine GPU signature".to_string());
        }

        if fp
            .environment
            .color_depth_bits
            .map(|depth| depth < LOW_COLOR_DEPTH_THRESHOLD_BITS)
            .unwrap_or(false)
        {
            score += self.pattern_analysis.low_color_depth_bonus;
            factors.push("Low colour depth".to_string());
        }

        if !context.neighbours.is_empty() {
            let high_count = context
                .neighbours
                .iter()
                .filter(|n| n.summary.overall_risk == RiskBucket::High)
                .count();
            if high_count * 2 > context.neighbours.len() {
                score += self.pattern_analysis.risky_neighbours_bonus;
                factors.push("Majority of similar sessions rated high risk".to_string());
            }
        }

        (score, factors)
    }

    fn tier_for(score: u32) -> RiskTier {
        if score >= 60 {
            RiskTier::High
        } else if score >= 30 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    fn templated_explanation(tier: RiskTier, factors: &[String]) -> String {
        if factors.is_empty() {
            "No notable risk signals were found in this session.".to_string()
        } else {
            format!(
                "Session classified as {tier:?} risk based on: {}.",
                factors.join(", ")
            )
        }
    }
}

#[async_trait]
impl RiskEvaluator for LiteRiskEvaluator {
    #[instrument(name = "risk.evaluate_lite", skip(self, context))]
    async fn evaluate(&self, context: &RiskContext<'_>) -> RiskEvaluation {
        let (score, risk_factors) = self.tally(context);

        if score > 1000 {
            // A per-signal bonus table bounded at six entries can never
            // actually reach this; treat it as a programming error rather
            // than silently clamping and hiding the bug.
            return RiskEvaluation::unknown("risk score exceeded the sane upper bound");
        }

        let tier = Self::tier_for(score);
        let confidence = (50 + 10 * risk_factors.len() as u32).min(90);
        let explanation = self.explain(tier, &risk_factors).await;

        RiskEvaluation {
            tier,
            confidence,
            explanation,
            risk_factors,
            patterns: Vec::new(),
            recommendations: Vec::new(),
            similarity_insights: None,
            processing: ProcessingMarker::Fast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FingerprintEnvironment, FingerprintLocation, FingerprintNetwork, FingerprintSummary,
        SessionFingerprint,
    };
    use crate::thresholds::ThresholdSnapshot;
    use uuid::Uuid;

    fn evaluator() -> LiteRiskEvaluator {
        let defaults = ThresholdSnapshot::default();
        LiteRiskEvaluator::new(defaults.location, defaults.pattern_analysis)
    }

    fn fingerprint(
        is_vpn: bool,
        accuracy_m: Option<f64>,
        response_time_ms: Option<u64>,
        gpu: Option<&str>,
        color_depth_bits: Option<u32>,
    ) -> SessionFingerprint {
        SessionFingerprint {
            id: Uuid::new_v4(),
            timestamp_ms: 0,
            location: FingerprintLocation {
                latitude: Some(1.0),
                longitude: Some(1.0),
                accuracy_m,
                response_time_ms,
                is_vpn,
                vpn_confidence: if is_vpn { 80 } else { 0 },
            },
            environment: FingerprintEnvironment {
                platform: None,
                resolution: None,
                gpu: gpu.map(str::to_string),
                user_agent: None,
                color_depth_bits,
            },
            network: FingerprintNetwork::default(),
            summary: FingerprintSummary {
                location_score: Some(100),
                environment_score: Some(100),
                overall_risk: RiskBucket::Low,
                spoofing_indicators: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn clean_session_is_low_risk() {
        let fp = fingerprint(false, Some(10.0), Some(200), Some("NVIDIA"), Some(24));
        let context = RiskContext {
            fingerprint: &fp,
            neighbours: &[],
        };
        let result = evaluator().evaluate(&context).await;
        assert_eq!(result.tier, RiskTier::Low);
        assert_eq!(result.processing, ProcessingMarker::Fast);
        assert!(result.risk_factors.is_empty());
    }

    #[tokio::test]
    async fn vpn_plus_virtual_gpu_reaches_high_tier() {
        let fp = fingerprint(true, Some(2000.0), Some(5), Some("VMware SVGA"), Some(16));
        let context = RiskContext {
            fingerprint: &fp,
            neighbours: &[],
        };
        let result = evaluator().evaluate(&context).await;
        // 30 + 15 + 20 + 25 + 15 = 105
        assert_eq!(result.tier, RiskTier::High);
        assert_eq!(result.risk_factors.len(), 5);
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn monotonicity_adding_a_factor_never_decreases_score() {
        let without_vpn = fingerprint(false, None, None, None, None);
        let with_vpn = fingerprint(true, None, None, None, None);
        let eval = evaluator();
        let (score_without, _) = eval.tally(&RiskContext {
            fingerprint: &without_vpn,
            neighbours: &[],
        });
        let (score_with, _) = eval.tally(&RiskContext {
            fingerprint: &with_vpn,
            neighbours: &[],
        });
        assert!(score_with >= score_without);
    }

    struct StaticSummaryClient {
        response: String,
    }

    #[async_trait]
    impl GenerativeClient for StaticSummaryClient {
        async fn generate(&self, _prompt: &str) -> crate::error::Result<String> {
            Ok(self.response.clone())
        }
    }

    struct UnreachableSummaryClient;

    #[async_trait]
    impl GenerativeClient for UnreachableSummaryClient {
        async fn generate(&self, _prompt: &str) -> crate::error::Result<String> {
            Err(crate::error::Error::GenerativeModelUnavailable(
                "connection refused".to_string(),
            ))
        }
    }

    #[tokio::test]
    async fn reachable_summary_client_overrides_the_templated_explanation() {
        let defaults = ThresholdSnapshot::default();
        let eval = LiteRiskEvaluator::new(defaults.location, defaults.pattern_analysis)
            .with_summary_client(Arc::new(StaticSummaryClient {
                response: "This session looks routine.".to_string(),
            }));
        let fp = fingerprint(false, Some(10.0), Some(200), Some("NVIDIA"), Some(24));
        let context = RiskContext {
            fingerprint: &fp,
            neighbours: &[],
        };
        let result = eval.evaluate(&context).await;
        assert_eq!(result.explanation, "This session looks routine.");
    }

    #[tokio::test]
    async fn unreachable_summary_client_falls_back_to_templated_explanation() {
        let defaults = ThresholdSnapshot::default();
        let eval = LiteRiskEvaluator::new(defaults.location, defaults.pattern_analysis)
            .with_summary_client(Arc::new(UnreachableSummaryClient));
        let fp = fingerprint(true, Some(2000.0), Some(5), Some("VMware SVGA"), Some(16));
        let context = RiskContext {
            fingerprint: &fp,
            neighbours: &[],
        };
        let result = eval.evaluate(&context).await;
        assert!(result.explanation.starts_with("Session classified as"));
    }
}

#[cfg(test)]
mod proptest_invariants {
    use proptest::prelude::*;

    use super::*;
    use crate::model::{
        FingerprintEnvironment, FingerprintLocation, FingerprintNetwork, FingerprintSummary,
        SessionFingerprint,
    };
    use crate::thresholds::ThresholdSnapshot;
    use uuid::Uuid;

    fn evaluator() -> LiteRiskEvaluator {
        let defaults = ThresholdSnapshot::default();
        LiteRiskEvaluator::new(defaults.location, defaults.pattern_analysis)
    }

    fn fingerprint(is_vpn: bool, accuracy_m: f64, response_time_ms: u64) -> SessionFingerprint {
        SessionFingerprint {
            id: Uuid::new_v4(),
            timestamp_ms: 0,
            location: FingerprintLocation {
                latitude: Some(1.0),
                longitude: Some(1.0),
                accuracy_m: Some(accuracy_m),
                response_time_ms: Some(response_time_ms),
                is_vpn,
                vpn_confidence: if is_vpn { 80 } else { 0 },
            },
            environment: FingerprintEnvironment {
                platform: None,
                resolution: None,
                gpu: None,
                user_agent: None,
                color_depth_bits: None,
            },
            network: FingerprintNetwork::default(),
            summary: FingerprintSummary {
                location_score: Some(100),
                environment_score: Some(100),
                overall_risk: RiskBucket::Low,
                spoofing_indicators: Vec::new(),
            },
        }
    }

    proptest! {
        /// `confidence = (50 + 10 * factor_count).min(90)` never leaves its
        /// documented `[50, 90]` range, no matter which signals fired.
        #[test]
        fn confidence_stays_within_its_documented_bounds(
            accuracy_m in 0.0f64..20_000.0,
            response_time_ms in 0u64..1_000,
            is_vpn in any::<bool>(),
        ) {
            let eval = evaluator();
            let fp = fingerprint(is_vpn, accuracy_m, response_time_ms);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let result = runtime.block_on(eval.evaluate(&RiskContext {
                fingerprint: &fp,
                neighbours: &[],
            }));
            prop_assert!((50..=90).contains(&result.confidence));
        }

        /// Adding the VPN signal on top of an otherwise-identical fingerprint
        /// never lowers the tallied score.
        #[test]
        fn vpn_signal_never_decreases_the_score(
            accuracy_m in 0.0f64..20_000.0,
            response_time_ms in 0u64..1_000,
        ) {
            let eval = evaluator();
            let without_vpn = fingerprint(false, accuracy_m, response_time_ms);
            let with_vpn = fingerprint(true, accuracy_m, response_time_ms);
            let (score_without, _) = eval.tally(&RiskContext {
                fingerprint: &without_vpn,
                neighbours: &[],
            });
            let (score_with, _) = eval.tally(&RiskContext {
                fingerprint: &with_vpn,
                neighbours: &[],
            });
            prop_assert!(score_with >= score_without);
        }
    }
}
