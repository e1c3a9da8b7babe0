//! Session Orchestrator: drives one verification request end-to-end.

use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};

use crate::embedding::vector_store::VectorStoreClient;
use crate::embedding::EmbeddingClient;
use crate::error::{Error, Result};
use crate::fingerprint::{self, SessionRecord};
use crate::model::{
    EnvironmentSignal, LocationSignal, NetworkSignal, SessionFingerprint, Verdict,
    VerificationStatus,
};
use crate::risk::{RiskContext, RiskEvaluator};
use crate::thresholds::ThresholdRegistry;
use crate::vpn::VpnAggregator;
use crate::{environment, location};

/// Which risk path to run for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskMode {
    Lite,
    Full,
}

/// Number of nearest neighbours retrieved for pattern analysis.
const NEIGHBOUR_COUNT: usize = 5;

/// Wires together every component named in the system overview. Owns no
/// per-request state; every field here is a long-lived, thread-safe
/// collaborator shared across concurrent requests.
pub struct Orchestrator {
    pub thresholds: Arc<ThresholdRegistry>,
    pub vpn: Arc<VpnAggregator>,
    pub embedding: Arc<dyn EmbeddingClient>,
    pub vector_store: Arc<dyn VectorStoreClient>,
    pub lite_risk: Arc<dyn RiskEvaluator>,
    pub full_risk: Option<Arc<dyn RiskEvaluator>>,
}

fn validate(location: &LocationSignal) -> Result<()> {
    if location.latitude.is_some() != location.longitude.is_some() {
        return Err(Error::input_invalid(
            "latitude and longitude must be both present or both absent",
        ));
    }
    Ok(())
}

impl Orchestrator {
    #[instrument(name = "orchestrator.verify", skip_all)]
    pub async fn verify(
        &self,
        location_signal: LocationSignal,
        environment_signal: EnvironmentSignal,
        network_signal: NetworkSignal,
        client_ip: &str,
        risk_mode: RiskMode,
    ) -> Result<Verdict> {
        validate(&location_signal)?;

        let snapshot = self.thresholds.get();
        let now_ms = Utc::now().timestamp_millis();

        let ip_for_vpn = network_signal.client_ip.as_deref().unwrap_or(client_ip);
        let vpn_threshold = snapshot.vpn.confidence_detected_pct;

        let (environment_verdict, vpn_result) = tokio::join!(
            async { environment::analyze(&environment_signal, &snapshot.environment) },
            async { self.vpn.detect(ip_for_vpn, vpn_threshold).await },
        );

        let location_verdict = location::verify(
            &location_signal,
            &vpn_result,
            now_ms,
            &snapshot.location,
        );

        let mut diagnostics = Vec::new();

        let record = SessionRecord {
            location: &location_signal,
            environment: &environment_signal,
            network: &network_signal,
            vpn: &vpn_result,
            location_score: Some(location_verdict.score),
            environment_score: Some(environment_verdict.score),
            location_flags: &location_verdict.flags,
            environment_flags: &environment_verdict.flags,
        };
        let session_fingerprint = fingerprint::build(&record, now_ms);

        let neighbours = self
            .embed_and_search(&session_fingerprint, &mut diagnostics)
            .await;

        let risk = self
            .evaluate_risk(&session_fingerprint, &neighbours, risk_mode)
            .await;

        let status = self.overall_status(&location_verdict.status, &environment_verdict.kind);

        Ok(Verdict {
            status,
            location_score: location_verdict.score,
            environment_score: environment_verdict.score,
            environment_kind: environment_verdict.kind,
            location_flags: location_verdict.flags,
            environment_flags: environment_verdict.flags,
            vpn: vpn_result,
            fingerprint: Some(session_fingerprint),
            risk: Some(risk),
            diagnostics,
        })
    }

    /// Directly exposes the VPN aggregator, per the `checkIP` collaborator
    /// contract.
    #[instrument(skip(self))]
    pub async fn check_ip(&self, ip: &str) -> crate::model::VpnAggregateResult {
        let threshold = self.thresholds.get().vpn.confidence_detected_pct;
        self.vpn.detect(ip, threshold).await
    }

    fn overall_status(
        &self,
        location_status: &VerificationStatus,
        environment_kind: &crate::model::EnvironmentKind,
    ) -> VerificationStatus {
        use crate::model::EnvironmentKind as K;
        if *location_status == VerificationStatus::UnableToVerify {
            return VerificationStatus::UnableToVerify;
        }
        if matches!(environment_kind, K::VirtualMachine | K::RemoteDesktop)
            && *location_status == VerificationStatus::Authentic
        {
            return VerificationStatus::Suspicious;
        }
        *location_status
    }

    /// Best-effort embed → upsert → search. Any failure here is recorded as
    /// a diagnostic; it never fails the enclosing request.
    async fn embed_and_search(
        &self,
        fingerprint: &SessionFingerprint,
        diagnostics: &mut Vec<String>,
    ) -> Vec<SessionFingerprint> {
        let text = fingerprint.text_projection();

        let vector = match self.embedding.embed(&text).await {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "embedding call failed");
                diagnostics.push(format!("embedding unavailable: {err}"));
                return Vec::new();
            }
        };

        if let Err(err) = self.vector_store.ensure_collection().await {
            warn!(error = %err, "vector store collection creation failed");
            diagnostics.push(format!("vector store unavailable: {err}"));
            return Vec::new();
        }

        let point_id = fingerprint::vector_point_id(&fingerprint.id);
        if let Err(err) = self
            .vector_store
            .upsert(point_id, vector.clone(), fingerprint)
            .await
        {
            warn!(error = %err, "vector store upsert failed");
            diagnostics.push(format!("vector store upsert failed: {err}"));
            return Vec::new();
        }

        match self.vector_store.search(vector, NEIGHBOUR_COUNT).await {
            Ok(hits) => hits.into_iter().map(|hit| hit.payload).collect(),
            Err(err) => {
                warn!(error = %err, "vector store search failed");
                diagnostics.push(format!("vector store search failed: {err}"));
                Vec::new()
            }
        }
    }

    async fn evaluate_risk(
        &self,
        fingerprint: &SessionFingerprint,
        neighbours: &[SessionFingerprint],
        mode: RiskMode,
    ) -> crate::model::RiskEvaluation {
        let context = RiskContext {
            fingerprint,
            neighbours,
        };

        match mode {
            RiskMode::Lite => self.lite_risk.evaluate(&context).await,
            RiskMode::Full => match &self.full_risk {
                Some(full) => full.evaluate(&context).await,
                None => self.lite_risk.evaluate(&context).await,
            },
        }
    }
}
