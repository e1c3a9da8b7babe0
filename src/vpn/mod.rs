//! Concurrent multi-provider VPN/proxy reputation aggregator.

pub mod providers;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::model::{VpnAggregateDetails, VpnAggregateResult, VpnProviderResult};
use crate::net::{is_private_or_reserved, parse_ip};

/// One IP-reputation backend, normalised to a single async call.
#[async_trait]
pub trait VpnProvider: Send + Sync {
    /// Stable, human-readable name used in `details.services` and logs.
    fn name(&self) -> &str;

    /// Whether this provider's required credential is configured. Disabled
    /// providers are skipped entirely, not dispatched and recorded as error.
    fn enabled(&self) -> bool;

    /// Query the backend for `ip`. Implementations should not retry; the
    /// aggregator applies a single deadline per call and treats a timeout or
    /// any failure identically via [`VpnProviderResult::errored`].
    async fn call(&self, ip: IpAddr) -> VpnProviderResult;
}

/// Fan-out dispatcher over a fixed, ordered set of providers.
pub struct VpnAggregator {
    providers: Vec<Arc<dyn VpnProvider>>,
    per_call_deadline: Duration,
}

impl VpnAggregator {
    /// `providers` is kept in the order given; that order is preserved in
    /// `details.services` regardless of response arrival order.
    pub fn new(providers: Vec<Arc<dyn VpnProvider>>, per_call_deadline: Duration) -> Self {
        Self {
            providers,
            per_call_deadline,
        }
    }

    /// Query every enabled provider for `ip` and fold the results into a
    /// consensus verdict. `detected_threshold` is the confidence percentage
    /// (0-100) at or above which `is_vpn` is set; callers normally read it
    /// from the current [`crate::thresholds::ThresholdSnapshot`] so the
    /// aggregator itself stays free of registry plumbing.
    #[instrument(name = "aggregator.detect", skip(self), fields(ip = %ip))]
    pub async fn detect(&self, ip: &str, detected_threshold: u32) -> VpnAggregateResult {
        let Some(parsed) = parse_ip(ip) else {
            return VpnAggregateResult::private_ip(ip);
        };

        if is_private_or_reserved(&parsed) {
            return VpnAggregateResult::private_ip(ip);
        }

        let enabled: Vec<&Arc<dyn VpnProvider>> =
            self.providers.iter().filter(|p| p.enabled()).collect();

        let calls = enabled.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let deadline = self.per_call_deadline;
            async move {
                match tokio::time::timeout(deadline, provider.call(parsed)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(provider = provider.name(), "vpn provider call timed out");
                        VpnProviderResult::errored(provider.name(), "timed out")
                    }
                }
            }
        });

        let services: Vec<VpnProviderResult> = futures::future::join_all(calls).await;

        let successful: Vec<&VpnProviderResult> =
            services.iter().filter(|p| p.succeeded()).collect();
        let detections: Vec<&VpnProviderResult> =
            successful.iter().filter(|p| p.is_vpn).copied().collect();

        let confidence = if successful.is_empty() {
            0
        } else {
            ((detections.len() as f64 / successful.len() as f64) * 100.0).round() as u32
        };

        let flagged_by: Vec<VpnProviderResult> = detections.into_iter().cloned().collect();

        let error = if !services.is_empty() && successful.is_empty() {
            Some("All providers failed".to_string())
        } else {
            None
        };

        VpnAggregateResult {
            ip: ip.to_string(),
            is_vpn: confidence >= detected_threshold,
            confidence,
            flagged_by,
            details: VpnAggregateDetails {
                total_checks: services.len(),
                vpn_detections: successful.iter().filter(|p| p.is_vpn).count(),
                services,
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        name: String,
        result: VpnProviderResult,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VpnProvider for FixedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn call(&self, _ip: IpAddr) -> VpnProviderResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct ErroringProvider {
        name: String,
    }

    #[async_trait]
    impl VpnProvider for ErroringProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn call(&self, _ip: IpAddr) -> VpnProviderResult {
            VpnProviderResult::errored(&self.name, "boom")
        }
    }

    fn vpn_result(provider: &str, is_vpn: bool) -> VpnProviderResult {
        VpnProviderResult {
            provider: provider.to_string(),
            is_vpn,
            is_proxy: false,
            is_tor: false,
            is_hosting: false,
            is_relay: false,
            fraud_score: None,
            organization: None,
            asn: None,
            isp: None,
            city: None,
            region: None,
            country: None,
            error: None,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn private_ip_short_circuits_without_calling_providers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = VpnAggregator::new(
            vec![Arc::new(FixedProvider {
                name: "p1".into(),
                result: vpn_result("p1", true),
                calls: Arc::clone(&calls),
            })],
            Duration::from_secs(5),
        );

        let result = aggregator.detect("192.168.1.5", 50).await;
        assert!(!result.is_vpn);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.details.error.as_deref(), Some("Private IP"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn errored_providers_are_excluded_from_the_denominator() {
        let aggregator = VpnAggregator::new(
            vec![
                Arc::new(FixedProvider {
                    name: "a".into(),
                    result: vpn_result("a", true),
                    calls: Arc::new(AtomicUsize::new(0)),
                }),
                Arc::new(FixedProvider {
                    name: "b".into(),
                    result: vpn_result("b", true),
                    calls: Arc::new(AtomicUsize::new(0)),
                }),
                Arc::new(FixedProvider {
                    name: "c".into(),
                    result: vpn_result("c", true),
                    calls: Arc::new(AtomicUsize::new(0)),
                }),
                Arc::new(ErroringProvider { name: "d".into() }),
            ],
            Duration::from_secs(5),
        );

        let result = aggregator.detect("8.8.8.8", 50).await;
        assert_eq!(result.confidence, 100);
        assert!(result.is_vpn);
        assert_eq!(result.details.total_checks, 4);
    }

    #[tokio::test]
    async fn all_providers_erroring_yields_zero_confidence_and_no_panic() {
        let aggregator = VpnAggregator::new(
            vec![
                Arc::new(ErroringProvider { name: "a".into() }),
                Arc::new(ErroringProvider { name: "b".into() }),
            ],
            Duration::from_secs(5),
        );

        let result = aggregator.detect("8.8.8.8", 50).await;
        assert!(!result.is_vpn);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.details.error.as_deref(), Some("All providers failed"));
    }

    #[tokio::test]
    async fn services_preserve_registry_order() {
        let aggregator = VpnAggregator::new(
            vec![
                Arc::new(FixedProvider {
                    name: "first".into(),
                    result: vpn_result("first", false),
                    calls: Arc::new(AtomicUsize::new(0)),
                }),
                Arc::new(FixedProvider {
                    name: "second".into(),
                    result: vpn_result("second", false),
                    calls: Arc::new(AtomicUsize::new(0)),
                }),
            ],
            Duration::from_secs(5),
        );

        let result = aggregator.detect("8.8.8.8", 50).await;
        let names: Vec<&str> = result
            .details
            .services
            .iter()
            .map(|p| p.provider.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
