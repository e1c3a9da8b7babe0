//! Builds the canonical [`SessionFingerprint`] from one verification
//! request's aggregated evidence. The transformation is pure: identical
//! inputs always yield an identical fingerprint, aside from the random
//! identifier assigned to each session.

use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::model::{
    EnvironmentSignal, Flag, FingerprintEnvironment, FingerprintLocation, FingerprintNetwork,
    FingerprintSummary, LocationSignal, NetworkSignal, SessionFingerprint, VpnAggregateResult,
};

/// Evidence gathered by the orchestrator for one request, immediately prior
/// to fingerprint construction.
pub struct SessionRecord<'a> {
    pub location: &'a LocationSignal,
    pub environment: &'a EnvironmentSignal,
    pub network: &'a NetworkSignal,
    pub vpn: &'a VpnAggregateResult,
    pub location_score: Option<u32>,
    pub environment_score: Option<u32>,
    pub location_flags: &'a [Flag],
    pub environment_flags: &'a [Flag],
}

/// Build a fresh [`SessionFingerprint`], assigning a new random id and the
/// given capture timestamp. All other fields are a deterministic function of
/// `record`.
#[instrument(name = "fingerprint.build", skip_all)]
pub fn build(record: &SessionRecord<'_>, timestamp_ms: i64) -> SessionFingerprint {
    let location = FingerprintLocation {
        latitude: record.location.latitude,
        longitude: record.location.longitude,
        accuracy_m: record.location.accuracy_m,
        response_time_ms: record.location.response_time_ms,
        is_vpn: record.vpn.is_vpn,
        vpn_confidence: record.vpn.confidence,
    };

    let environment = FingerprintEnvironment {
        platform: record.environment.platform.clone(),
        resolution: record.environment.resolution_string(),
        gpu: record.environment.webgl_renderer.clone(),
        user_agent: record.environment.user_agent.clone(),
        color_depth_bits: record.environment.color_depth_bits,
    };

    let network = FingerprintNetwork {
        client_ip: record.network.client_ip.clone(),
        candidate_ips: record.network.candidate_ips.clone(),
    };

    let spoofing_indicators: Vec<String> = record
        .location_flags
        .iter()
        .chain(record.environment_flags.iter())
        .filter(|f| f.is_spoofing_indicator())
        .map(|f| f.message.clone())
        .collect();

    let summary = FingerprintSummary {
        location_score: record.location_score,
        environment_score: record.environment_score,
        overall_risk: FingerprintSummary::bucket_for(
            record.location_score,
            record.environment_score,
        ),
        spoofing_indicators,
    };

    SessionFingerprint {
        id: Uuid::new_v4(),
        timestamp_ms,
        location,
        environment,
        network,
        summary,
    }
}

/// Derive a 64-bit vector-store point id from a fingerprint's uuid: the
/// first 8 bytes of its SHA-256 digest, big-endian. Upserting the same
/// fingerprint id twice always lands on the same point, making the write
/// idempotent.
pub fn vector_point_id(fingerprint_id: &Uuid) -> u64 {
    let digest = Sha256::digest(fingerprint_id.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("digest is at least 8 bytes"))
}
