//! Scores an [`EnvironmentSignal`] into an environment kind, a score, and an
//! ordered flag list.

use tracing::instrument;

use crate::model::{EnvironmentKind, EnvironmentSignal, Flag, Severity};
use crate::thresholds::EnvironmentThresholds;

#[derive(Debug, Clone)]
pub struct EnvironmentVerdict {
    pub kind: EnvironmentKind,
    pub score: u32,
    pub flags: Vec<Flag>,
}

/// Aspect ratios treated as ordinary consumer displays, within ±0.01.
const KNOWN_ASPECT_RATIOS: &[f64] = &[16.0 / 9.0, 16.0 / 10.0, 4.0 / 3.0, 21.0 / 9.0];
const ASPECT_RATIO_EPSILON: f64 = 0.01;

/// Ten common desktop/laptop resolutions; anything else is flagged as
/// unusual but not necessarily fraudulent.
const CANONICAL_RESOLUTIONS: &[&str] = &[
    "1920x1080",
    "1366x768",
    "1536x864",
    "1440x900",
    "1280x720",
    "2560x1440",
    "3840x2160",
    "1600x900",
    "1280x1024",
    "1024x768",
];

const VM_RENDERER_KEYWORDS: &[&str] = &["vmware", "virtualbox", "microsoft basic", "llvmpipe"];

#[instrument(name = "environment.analyze", skip_all)]
pub fn analyze(
    signal: &EnvironmentSignal,
    thresholds: &EnvironmentThresholds,
) -> EnvironmentVerdict {
    let mut score: i64 = 100;
    let mut flags = Vec::new();
    let mut kind = EnvironmentKind::LocalDesktop;

    if let Some(ratio) = signal.aspect_ratio() {
        let matches_known = KNOWN_ASPECT_RATIOS
            .iter()
            .any(|known| (known - ratio).abs() <= ASPECT_RATIO_EPSILON);
        if !matches_known {
            score -= 20;
            flags.push(Flag::new(Severity::Warning, "Unusual screen aspect ratio"));
        }
    }

    if let Some(depth) = signal.color_depth_bits {
        if depth < thresholds.color_depth_rdp_indicator_bits {
            score -= 25;
            flags.push(Flag::new(Severity::Warning, "Low colour depth"));
        }
    }

    if let Some(renderer) = &signal.webgl_renderer {
        let lower = renderer.to_lowercase();
        if VM_RENDERER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            score -= 50;
            flags.push(Flag::new(
                Severity::Critical,
                "Virtual machine GPU renderer detected",
            ));
            kind = EnvironmentKind::VirtualMachine;
        }
    }

    let platform_is_android = signal
        .platform
        .as_deref()
        .map(|p| p.to_lowercase().contains("android"))
        .unwrap_or(false);
    if platform_is_android && signal.touch_support.is_none() {
        score -= 30;
        flags.push(Flag::new(
            Severity::Warning,
            "Android platform without touch support",
        ));
    }

    if let Some(resolution) = signal.resolution_string() {
        if !CANONICAL_RESOLUTIONS.contains(&resolution.as_str()) {
            score -= 15;
            flags.push(Flag::new(Severity::Warning, "Uncommon screen resolution"));
        }
    }

    let score = score.clamp(0, 100) as u32;

    if kind != EnvironmentKind::VirtualMachine {
        if score < thresholds.score_likely_remote {
            kind = EnvironmentKind::RemoteDesktop;
        } else if score < thresholds.score_possibly_remote {
            kind = EnvironmentKind::PossiblyRemote;
        }
    }

    EnvironmentVerdict { kind, score, flags }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> EnvironmentThresholds {
        EnvironmentThresholds {
            score_likely_remote: 50,
            score_possibly_remote: 75,
            color_depth_rdp_indicator_bits: 24,
        }
    }

    #[test]
    fn typical_desktop_is_authentic() {
        let signal = EnvironmentSignal {
            screen_width: Some(1920),
            screen_height: Some(1080),
            color_depth_bits: Some(24),
            touch_support: Some(false),
            webgl_renderer: Some("NVIDIA GeForce GTX 1080".into()),
            platform: Some("Win32".into()),
            ..Default::default()
        };
        let result = analyze(&signal, &thresholds());
        assert_eq!(result.kind, EnvironmentKind::LocalDesktop);
        assert_eq!(result.score, 100);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn vmware_renderer_forces_virtual_machine_regardless_of_other_fields() {
        let signal = EnvironmentSignal {
            screen_width: Some(1920),
            screen_height: Some(1080),
            color_depth_bits: Some(24),
            webgl_renderer: Some("VMware SVGA 3D".into()),
            ..Default::default()
        };
        let result = analyze(&signal, &thresholds());
        assert_eq!(result.kind, EnvironmentKind::VirtualMachine);
    }

    #[test]
    fn low_color_depth_deducts_twenty_five() {
        let signal = EnvironmentSignal {
            screen_width: Some(1920),
            screen_height: Some(1080),
            color_depth_bits: Some(16),
            ..Default::default()
        };
        let result = analyze(&signal, &thresholds());
        assert_eq!(result.score, 75);
    }

    #[test]
    fn android_without_touch_is_flagged() {
        let signal = EnvironmentSignal {
            platform: Some("Android".into()),
            touch_support: None,
            ..Default::default()
        };
        let result = analyze(&signal, &thresholds());
        assert!(result
            .flags
            .iter()
            .any(|f| f.message.contains("Android platform")));
    }

    #[test]
    fn unusual_aspect_ratio_is_flagged() {
        let signal = EnvironmentSignal {
            screen_width: Some(1000),
            screen_height: Some(1000),
            ..Default::default()
        };
        let result = analyze(&signal, &thresholds());
        assert!(result
            .flags
            .iter()
            .any(|f| f.message.contains("aspect ratio")));
    }
}
