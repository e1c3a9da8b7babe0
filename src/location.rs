//! Scores a [`LocationSignal`] plus the VPN aggregate into a status, a
//! score, and an ordered flag list.

use tracing::instrument;

use crate::model::{Flag, LocationSignal, Severity, VerificationStatus, VpnAggregateResult};
use crate::thresholds::LocationThresholds;

/// Output of [`verify`].
#[derive(Debug, Clone)]
pub struct LocationVerdict {
    pub status: VerificationStatus,
    pub score: u32,
    pub flags: Vec<Flag>,
}

const NULL_ISLAND_EPSILON: f64 = f64::EPSILON;
const STALE_THRESHOLD_MS: i64 = 60_000;

/// Score `signal` against `vpn` using the fixed rule order from the
/// location-scoring table. Rules are evaluated in order and each applies at
/// most once; the resulting score is clamped to `[0, 100]`.
#[instrument(name = "location.verify", skip_all)]
pub fn verify(
    signal: &LocationSignal,
    vpn: &VpnAggregateResult,
    now_ms: i64,
    thresholds: &LocationThresholds,
) -> LocationVerdict {
    let Some((lat, lon)) = signal.coordinates() else {
        return LocationVerdict {
            status: VerificationStatus::UnableToVerify,
            score: 0,
            flags: vec![Flag::new(Severity::Fail, "Location data not provided")],
        };
    };

    let mut score: i64 = 100;
    let mut flags = Vec::new();

    if lat.abs() < NULL_ISLAND_EPSILON && lon.abs() < NULL_ISLAND_EPSILON {
        score -= 50;
        flags.push(
            Flag::new(Severity::Critical, "Null Island coordinates")
                .with_explanation("Latitude and longitude are both exactly zero"),
        );
    }

    if lat.fract() == 0.0 && lon.fract() == 0.0 {
        score -= 20;
        flags.push(Flag::new(Severity::Warning, "Integer coordinates"));
    }

    if let Some(accuracy) = signal.accuracy_m {
        if accuracy > thresholds.accuracy_low_m {
            score -= 30;
            flags.push(Flag::new(Severity::Warning, "Low location accuracy"));
        }
    }

    if let Some(ts) = signal.timestamp_ms {
        if now_ms - ts > STALE_THRESHOLD_MS {
            score -= 10;
            flags.push(Flag::new(Severity::Warning, "Stale location timestamp"));
        }
    }

    if let Some(rt) = signal.response_time_ms {
        if rt < thresholds.response_time_suspicious_ms {
            score -= 20;
            flags.push(Flag::new(Severity::Warning, "Suspiciously fast location response"));
        }
    }

    if vpn.is_vpn {
        score -= 30;
        flags.push(Flag::new(Severity::Warning, "VPN/Proxy detected"));
    }

    if vpn.any_tor() {
        score -= 20;
        flags.push(Flag::new(Severity::Fail, "Tor exit node detected"));
    }

    if vpn.any_high_fraud_score(90.0) {
        score -= 20;
        flags.push(Flag::new(Severity::Fail, "High fraud score reported by provider"));
    }

    let score = score.clamp(0, 100) as u32;

    let status = if score < thresholds.score_likely_spoofed {
        VerificationStatus::LikelySpoofed
    } else if score < thresholds.score_suspicious {
        VerificationStatus::Suspicious
    } else {
        VerificationStatus::Authentic
    };

    LocationVerdict {
        status,
        score,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VpnAggregateDetails, VpnAggregateResult};

    fn thresholds() -> LocationThresholds {
        LocationThresholds {
            response_time_suspicious_ms: 10,
            accuracy_low_m: 1000.0,
            score_likely_spoofed: 60,
            score_suspicious: 80,
        }
    }

    fn no_vpn() -> VpnAggregateResult {
        VpnAggregateResult {
            ip: "1.2.3.4".into(),
            is_vpn: false,
            confidence: 0,
            flagged_by: Vec::new(),
            details: VpnAggregateDetails {
                total_checks: 1,
                vpn_detections: 0,
                services: Vec::new(),
                error: None,
            },
        }
    }

    #[test]
    fn missing_coordinates_short_circuit() {
        let result = verify(&LocationSignal::default(), &no_vpn(), 0, &thresholds());
        assert_eq!(result.status, VerificationStatus::UnableToVerify);
        assert_eq!(result.score, 0);
        assert_eq!(result.flags.len(), 1);
    }

    #[test]
    fn null_island_is_always_likely_spoofed() {
        let signal = LocationSignal {
            latitude: Some(0.0),
            longitude: Some(0.0),
            accuracy_m: Some(5000.0),
            timestamp_ms: Some(0),
            response_time_ms: None,
        };
        let result = verify(&signal, &no_vpn(), 0, &thresholds());
        assert_eq!(result.status, VerificationStatus::LikelySpoofed);
        assert!(result
            .flags
            .iter()
            .any(|f| f.severity == Severity::Critical && f.message.contains("Null Island")));
    }

    #[test]
    fn authentic_suburban_location_scores_high() {
        let signal = LocationSignal {
            latitude: Some(37.7749),
            longitude: Some(-122.4194),
            accuracy_m: Some(15.0),
            timestamp_ms: Some(1_000_000),
            response_time_ms: Some(250),
        };
        let result = verify(&signal, &no_vpn(), 1_000_000, &thresholds());
        assert_eq!(result.status, VerificationStatus::Authentic);
        assert!(result.score >= 80);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn vpn_detection_deducts_exactly_thirty() {
        let signal = LocationSignal {
            latitude: Some(37.7749),
            longitude: Some(-122.4194),
            accuracy_m: Some(15.0),
            timestamp_ms: Some(1_000_000),
            response_time_ms: Some(250),
        };
        let mut vpn = no_vpn();
        vpn.is_vpn = true;
        let result = verify(&signal, &vpn, 1_000_000, &thresholds());
        assert_eq!(result.score, 70);
    }

    #[test]
    fn score_never_goes_below_zero() {
        let signal = LocationSignal {
            latitude: Some(0.0),
            longitude: Some(0.0),
            accuracy_m: Some(5000.0),
            timestamp_ms: Some(0),
            response_time_ms: Some(1),
        };
        let mut vpn = no_vpn();
        vpn.is_vpn = true;
        vpn.details.services = vec![crate::model::VpnProviderResult {
            provider: "p".into(),
            is_vpn: true,
            is_proxy: false,
            is_tor: true,
            is_hosting: false,
            is_relay: false,
            fraud_score: Some(95.0),
            organization: None,
            asn: None,
            isp: None,
            city: None,
            region: None,
            country: None,
            error: None,
            extra: Default::default(),
        }];
        let result = verify(&signal, &vpn, 90_000_000, &thresholds());
        assert_eq!(result.score, 0);
    }
}
