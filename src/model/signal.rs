//! Client-reported input signals.
//!
//! These are the untrusted, request-scoped inputs the orchestrator accepts.
//! Every field is optional where the client may legitimately fail to collect
//! it; absence degrades the downstream scoring rather than failing the
//! request.

use serde::{Deserialize, Serialize};

/// Geolocation as reported (or not) by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationSignal {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Reported GPS/network accuracy radius, in metres.
    pub accuracy_m: Option<f64>,
    /// Client-reported capture time, epoch milliseconds.
    pub timestamp_ms: Option<i64>,
    /// Measured round-trip time for the geolocation call, in milliseconds.
    pub response_time_ms: Option<u64>,
}

impl LocationSignal {
    /// Coordinates are present iff both are present; this is the only shape
    /// the rest of the verifier is allowed to assume.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Client environment fingerprint components (screen, GPU, platform, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSignal {
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub color_depth_bits: Option<u32>,
    pub touch_support: Option<bool>,
    /// WebGL `UNMASKED_RENDERER_WEBGL` string, free-form and possibly empty.
    pub webgl_renderer: Option<String>,
    pub platform: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub user_agent: Option<String>,
}

impl EnvironmentSignal {
    pub fn resolution_string(&self) -> Option<String> {
        match (self.screen_width, self.screen_height) {
            (Some(w), Some(h)) => Some(format!("{w}x{h}")),
            _ => None,
        }
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        match (self.screen_width, self.screen_height) {
            (Some(w), Some(h)) if h > 0 => Some(w as f64 / h as f64),
            _ => None,
        }
    }
}

/// Network-layer signals: the IP the request arrived on, plus whatever the
/// client's peer-connection gathering and property probing turned up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSignal {
    pub client_ip: Option<String>,
    /// IPs observed locally via WebRTC ICE candidate gathering.
    pub candidate_ips: Vec<String>,
    /// Names of browser properties the client found suspicious
    /// (e.g. automation markers, headless indicators).
    pub suspicious_properties: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_require_both_fields() {
        let mut sig = LocationSignal {
            latitude: Some(1.0),
            ..Default::default()
        };
        assert!(sig.coordinates().is_none());
        sig.longitude = Some(2.0);
        assert_eq!(sig.coordinates(), Some((1.0, 2.0)));
    }

    #[test]
    fn aspect_ratio_handles_missing_dimensions() {
        let sig = EnvironmentSignal::default();
        assert!(sig.aspect_ratio().is_none());
        let sig = EnvironmentSignal {
            screen_width: Some(1920),
            screen_height: Some(1080),
            ..Default::default()
        };
        assert!((sig.aspect_ratio().unwrap() - 16.0 / 9.0).abs() < 1e-9);
    }
}
