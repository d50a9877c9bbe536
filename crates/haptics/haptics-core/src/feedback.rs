//! Canned feedback: resolves a [`HapticType`] into the closest effect the
//! platform can render.
//!
//! Resolution order per type:
//! - impacts: native impact style, else a one-shot at default amplitude
//!   (light 20 / medium 40 / rigid 60 / heavy 80 / soft 100 ms)
//! - success/warning/error: native notification, else a fixed waveform
//! - selectionChanged: native selection, else the predefined tick, else the
//!   default impact (20 ms one-shot)

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::Capabilities;
use crate::haptic_type::HapticType;

const SUCCESS_TIMINGS_MS: [u64; 4] = [0, 25, 25, 25];
const WARNING_TIMINGS_MS: [u64; 6] = [0, 100, 50, 100, 100, 50];
const ERROR_TIMINGS_MS: [u64; 7] = [0, 100, 50, 50, 50, 50, 100];

const DEFAULT_IMPACT_MS: u64 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
    Rigid,
    Soft,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PredefinedEffect {
    Tick,
    Click,
    DoubleClick,
    HeavyClick,
}

/// Platform-neutral description of one fire-and-forget feedback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum FeedbackEffect {
    Impact {
        style: ImpactStyle,
    },
    Notification {
        kind: NotificationKind,
    },
    Selection,
    Predefined {
        effect: PredefinedEffect,
    },
    /// `amplitude: None` means the device default amplitude.
    OneShot {
        duration_ms: u64,
        amplitude: Option<u8>,
    },
    /// Alternating off/on timings, played once.
    Waveform {
        timings_ms: Vec<u64>,
        amplitudes: Option<Vec<u8>>,
    },
    /// The generic system vibration (no intensity control).
    SystemVibration,
}

impl FeedbackEffect {
    /// The fallback used wherever no better primitive exists.
    pub fn default_impact() -> Self {
        Self::OneShot {
            duration_ms: DEFAULT_IMPACT_MS,
            amplitude: None,
        }
    }

    fn waveform(timings: &[u64]) -> Self {
        Self::Waveform {
            timings_ms: timings.to_vec(),
            amplitudes: None,
        }
    }
}

/// Rate used by the looping system vibration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VibrationFrequency {
    High,
    #[default]
    Low,
}

impl VibrationFrequency {
    pub fn interval(&self) -> Duration {
        match self {
            Self::High => Duration::from_millis(10),
            Self::Low => Duration::from_secs(1),
        }
    }
}

fn impact_style(ty: HapticType) -> Option<ImpactStyle> {
    match ty {
        HapticType::Light => Some(ImpactStyle::Light),
        HapticType::Medium => Some(ImpactStyle::Medium),
        HapticType::Heavy => Some(ImpactStyle::Heavy),
        HapticType::Rigid => Some(ImpactStyle::Rigid),
        HapticType::Soft => Some(ImpactStyle::Soft),
        _ => None,
    }
}

fn one_shot_ms(style: ImpactStyle) -> u64 {
    match style {
        ImpactStyle::Light => 20,
        ImpactStyle::Medium => 40,
        ImpactStyle::Rigid => 60,
        ImpactStyle::Heavy => 80,
        ImpactStyle::Soft => 100,
    }
}

/// Pick the effect `ty` renders to on a device with `caps`.
pub fn resolve_feedback(ty: HapticType, caps: &Capabilities) -> FeedbackEffect {
    if let Some(style) = impact_style(ty) {
        return if caps.impact_styles {
            FeedbackEffect::Impact { style }
        } else {
            FeedbackEffect::OneShot {
                duration_ms: one_shot_ms(style),
                amplitude: None,
            }
        };
    }

    match ty {
        HapticType::Success | HapticType::Warning | HapticType::Error => {
            let (kind, timings): (NotificationKind, &[u64]) = match ty {
                HapticType::Success => (NotificationKind::Success, &SUCCESS_TIMINGS_MS[..]),
                HapticType::Warning => (NotificationKind::Warning, &WARNING_TIMINGS_MS[..]),
                _ => (NotificationKind::Error, &ERROR_TIMINGS_MS[..]),
            };
            if caps.notifications {
                FeedbackEffect::Notification { kind }
            } else {
                FeedbackEffect::waveform(timings)
            }
        }
        HapticType::SelectionChanged => {
            if caps.selection {
                FeedbackEffect::Selection
            } else if caps.predefined_effects {
                FeedbackEffect::Predefined {
                    effect: PredefinedEffect::Tick,
                }
            } else {
                FeedbackEffect::default_impact()
            }
        }
        // impacts returned above
        _ => FeedbackEffect::default_impact(),
    }
}
