//! The threshold registry: a single, hot-reloadable source of numeric
//! decision boundaries for every other component.
//!
//! Readers take an atomic load of the current [`ThresholdSnapshot`] via
//! [`ThresholdRegistry::get`]; a reload swaps the whole snapshot in one
//! atomic store, so in-flight readers always see either the old or the new
//! snapshot, never a partial mix of the two.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationThresholds {
    pub response_time_suspicious_ms: u64,
    pub accuracy_low_m: f64,
    pub score_likely_spoofed: u32,
    pub score_suspicious: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentThresholds {
    pub score_likely_remote: u32,
    pub score_possibly_remote: u32,
    pub color_depth_rdp_indicator_bits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnThresholds {
    pub confidence_detected_pct: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringDeductions {
    pub location_warning: u32,
    pub location_fail: u32,
    pub environment_warning: u32,
    pub environment_fail: u32,
}

/// Per-signal risk bonuses consumed by the lite risk evaluator (§4.G).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternAnalysisThresholds {
    pub vpn_detected_bonus: u32,
    pub low_accuracy_bonus: u32,
    pub fast_response_bonus: u32,
    pub virtual_gpu_bonus: u32,
    pub low_color_depth_bonus: u32,
    pub risky_neighbours_bonus: u32,
}

/// One immutable, fully-resolved set of thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSnapshot {
    pub location: LocationThresholds,
    pub environment: EnvironmentThresholds,
    pub vpn: VpnThresholds,
    pub scoring: ScoringDeductions,
    pub pattern_analysis: PatternAnalysisThresholds,
}

impl Default for ThresholdSnapshot {
    fn default() -> Self {
        Self {
            location: LocationThresholds {
                response_time_suspicious_ms: 10,
                accuracy_low_m: 1000.0,
                score_likely_spoofed: 60,
                score_suspicious: 80,
            },
            environment: EnvironmentThresholds {
                score_likely_remote: 50,
                score_possibly_remote: 75,
                color_depth_rdp_indicator_bits: 24,
            },
            vpn: VpnThresholds {
                confidence_detected_pct: 50,
            },
            scoring: ScoringDeductions {
                location_warning: 20,
                location_fail: 40,
                environment_warning: 25,
                environment_fail: 50,
            },
            pattern_analysis: PatternAnalysisThresholds {
                vpn_detected_bonus: 30,
                low_accuracy_bonus: 15,
                fast_response_bonus: 20,
                virtual_gpu_bonus: 25,
                low_color_depth_bonus: 15,
                risky_neighbours_bonus: 20,
            },
        }
    }
}

/// Process-scoped, atomically swappable holder of the current snapshot.
pub struct ThresholdRegistry {
    current: ArcSwap<ThresholdSnapshot>,
}

impl ThresholdRegistry {
    pub fn new(initial: ThresholdSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Falls back to [`ThresholdSnapshot::default`] when no configuration
    /// document is available.
    pub fn with_defaults() -> Self {
        Self::new(ThresholdSnapshot::default())
    }

    /// A single atomic load; never blocks a concurrent [`Self::replace`].
    pub fn get(&self) -> Arc<ThresholdSnapshot> {
        self.current.load_full()
    }

    /// Atomically install a new snapshot. Readers that already hold a
    /// reference from [`Self::get`] keep observing the old snapshot; new
    /// calls to `get` observe the new one.
    pub fn replace(&self, snapshot: ThresholdSnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for ThresholdRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
