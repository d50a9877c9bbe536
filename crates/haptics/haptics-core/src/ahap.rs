//! Apple Haptic and Audio Pattern (AHAP) documents.
//!
//! Only the haptic subset is rendered: audio events are decoded and skipped.
//! Parameter curves are applied when converting to a [`HapticPattern`]:
//! intensity-control curves scale event intensity and sharpness-control curves
//! offset event sharpness, sampled linearly at each event's start time.
//!
//! See Apple's "Representing Haptic Patterns in AHAP Files" for the format.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::HapticsError;
use crate::event::{HapticEvent, HapticPattern};

pub const AHAP_EXTENSION: &str = "ahap";

const DEFAULT_INTENSITY: f32 = 1.0;
const DEFAULT_SHARPNESS: f32 = 0.5;

/// Parse an AHAP JSON document.
pub fn parse_ahap_json(s: &str) -> Result<AhapDocument, HapticsError> {
    let doc: AhapDocument = serde_json::from_str(s).map_err(|e| HapticsError::InvalidPattern {
        reason: format!("parse error: {e}"),
    })?;
    if let Some(v) = doc.version {
        if v != 1.0 {
            warn!("AHAP version {v} is untested; decoding as 1.0");
        }
    }
    Ok(doc)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AhapDocument {
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<f64>,
    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(rename = "Pattern", default)]
    pub pattern: Vec<AhapEntry>,
}

/// One element of the `Pattern` array. Exactly one field is normally set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AhapEntry {
    #[serde(rename = "Event", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<AhapEvent>,
    #[serde(
        rename = "ParameterCurve",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_curve: Option<ParameterCurve>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AhapEvent {
    #[serde(rename = "Time", default)]
    pub time: f64,
    #[serde(rename = "EventType")]
    pub event_type: EventType,
    #[serde(rename = "EventDuration", default, skip_serializing_if = "Option::is_none")]
    pub event_duration: Option<f64>,
    #[serde(rename = "EventParameters", default)]
    pub event_parameters: Vec<EventParameter>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    HapticTransient,
    HapticContinuous,
    AudioContinuous,
    AudioCustom,
    Other(String),
}

impl EventType {
    #[inline]
    pub fn is_haptic(&self) -> bool {
        matches!(self, Self::HapticTransient | Self::HapticContinuous)
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "HapticTransient" => Self::HapticTransient,
            "HapticContinuous" => Self::HapticContinuous,
            "AudioContinuous" => Self::AudioContinuous,
            "AudioCustom" => Self::AudioCustom,
            _ => Self::Other(s),
        }
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        match t {
            EventType::HapticTransient => "HapticTransient".into(),
            EventType::HapticContinuous => "HapticContinuous".into(),
            EventType::AudioContinuous => "AudioContinuous".into(),
            EventType::AudioCustom => "AudioCustom".into(),
            EventType::Other(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventParameter {
    #[serde(rename = "ParameterID")]
    pub parameter_id: ParameterId,
    #[serde(rename = "ParameterValue")]
    pub parameter_value: f32,
}

/// Event and curve parameter identifiers. Audio and envelope parameters are
/// kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterId {
    HapticIntensity,
    HapticSharpness,
    HapticIntensityControl,
    HapticSharpnessControl,
    Other(String),
}

impl From<String> for ParameterId {
    fn from(s: String) -> Self {
        match s.as_str() {
            "HapticIntensity" => Self::HapticIntensity,
            "HapticSharpness" => Self::HapticSharpness,
            "HapticIntensityControl" => Self::HapticIntensityControl,
            "HapticSharpnessControl" => Self::HapticSharpnessControl,
            _ => Self::Other(s),
        }
    }
}

impl From<ParameterId> for String {
    fn from(p: ParameterId) -> Self {
        match p {
            ParameterId::HapticIntensity => "HapticIntensity".into(),
            ParameterId::HapticSharpness => "HapticSharpness".into(),
            ParameterId::HapticIntensityControl => "HapticIntensityControl".into(),
            ParameterId::HapticSharpnessControl => "HapticSharpnessControl".into(),
            ParameterId::Other(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterCurve {
    #[serde(rename = "ParameterID")]
    pub parameter_id: ParameterId,
    #[serde(rename = "Time", default)]
    pub time: f64,
    #[serde(rename = "ParameterCurveControlPoints", default)]
    pub control_points: Vec<ControlPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Relative to the owning curve's `Time`.
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "ParameterValue")]
    pub parameter_value: f32,
}

impl ParameterCurve {
    /// Curve value at absolute pattern time `t`. `None` before the first
    /// control point; the last value holds after the final one.
    pub fn value_at(&self, t: f64) -> Option<f32> {
        let first = self.control_points.first()?;
        let local = t - self.time;
        if local < first.time {
            return None;
        }
        for pair in self.control_points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if local >= a.time && local <= b.time {
                let span = b.time - a.time;
                if span <= f64::EPSILON {
                    return Some(b.parameter_value);
                }
                let u = ((local - a.time) / span) as f32;
                return Some(a.parameter_value + (b.parameter_value - a.parameter_value) * u);
            }
        }
        self.control_points.last().map(|p| p.parameter_value)
    }
}

impl AhapEvent {
    fn parameter(&self, id: &ParameterId) -> Option<f32> {
        self.event_parameters
            .iter()
            .find(|p| &p.parameter_id == id)
            .map(|p| p.parameter_value)
    }
}

impl AhapDocument {
    pub fn events(&self) -> impl Iterator<Item = &AhapEvent> {
        self.pattern.iter().filter_map(|e| e.event.as_ref())
    }

    pub fn curves(&self) -> impl Iterator<Item = &ParameterCurve> {
        self.pattern.iter().filter_map(|e| e.parameter_curve.as_ref())
    }

    pub fn haptic_events(&self) -> impl Iterator<Item = &AhapEvent> {
        self.events().filter(|e| e.event_type.is_haptic())
    }

    /// Convert the haptic subset into a playable pattern.
    pub fn to_pattern(&self) -> Result<HapticPattern, HapticsError> {
        let mut events = Vec::new();
        for ev in self.haptic_events() {
            let at = seconds(ev.time, "Time")?;
            let mut intensity = ev
                .parameter(&ParameterId::HapticIntensity)
                .unwrap_or(DEFAULT_INTENSITY);
            let mut sharpness = ev
                .parameter(&ParameterId::HapticSharpness)
                .unwrap_or(DEFAULT_SHARPNESS);
            for curve in self.curves() {
                let Some(v) = curve.value_at(ev.time) else {
                    continue;
                };
                match curve.parameter_id {
                    ParameterId::HapticIntensityControl => intensity *= v,
                    ParameterId::HapticSharpnessControl => sharpness += v,
                    _ => {}
                }
            }
            let event = match ev.event_type {
                EventType::HapticContinuous => {
                    let d = seconds(ev.event_duration.unwrap_or(0.0), "EventDuration")?;
                    HapticEvent::continuous(at, intensity, sharpness, d)
                }
                _ => HapticEvent::impact(at, intensity, sharpness, None),
            };
            events.push(event);
        }
        HapticPattern::new(events)
    }
}

fn seconds(v: f64, field: &str) -> Result<Duration, HapticsError> {
    if !v.is_finite() || v < 0.0 {
        return Err(HapticsError::InvalidPattern {
            reason: format!("{field} must be a finite, non-negative number of seconds (got {v})"),
        });
    }
    Ok(Duration::from_secs_f64(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    const SAMPLE: &str = r#"{
        "Version": 1.0,
        "Pattern": [
            { "Event": { "Time": 0.0, "EventType": "HapticTransient",
                "EventParameters": [
                    { "ParameterID": "HapticIntensity", "ParameterValue": 0.8 },
                    { "ParameterID": "HapticSharpness", "ParameterValue": 0.4 } ] } },
            { "Event": { "Time": 0.1, "EventType": "HapticContinuous", "EventDuration": 0.5,
                "EventParameters": [
                    { "ParameterID": "HapticIntensity", "ParameterValue": 1.0 } ] } },
            { "Event": { "Time": 0.2, "EventType": "AudioCustom", "EventWaveformPath": "x.wav" } },
            { "ParameterCurve": { "ParameterID": "HapticIntensityControl", "Time": 0.0,
                "ParameterCurveControlPoints": [
                    { "Time": 0.0, "ParameterValue": 1.0 },
                    { "Time": 0.2, "ParameterValue": 0.0 } ] } }
        ]
    }"#;

    #[test]
    fn parses_events_and_skips_audio() {
        let doc = parse_ahap_json(SAMPLE).unwrap();
        assert_eq!(doc.version, Some(1.0));
        assert_eq!(doc.events().count(), 3);
        assert_eq!(doc.haptic_events().count(), 2);
        assert_eq!(doc.curves().count(), 1);
    }

    #[test]
    fn curves_scale_intensity_at_event_time() {
        let p = parse_ahap_json(SAMPLE).unwrap().to_pattern().unwrap();
        assert_eq!(p.len(), 2);
        let tap = &p.events()[0];
        assert_eq!(tap.kind, EventKind::Impact);
        assert!((tap.strength - 0.8).abs() < 1e-6);
        assert!((tap.sharpness - 0.4).abs() < 1e-6);

        // halfway down the curve at t=0.1
        let hum = &p.events()[1];
        assert_eq!(hum.kind, EventKind::Continuous);
        assert!((hum.strength - 0.5).abs() < 1e-5);
        assert!((hum.sharpness - DEFAULT_SHARPNESS).abs() < 1e-6);
        assert_eq!(p.duration(), Duration::from_millis(600));
    }

    #[test]
    fn curve_sampling_edges() {
        let curve = ParameterCurve {
            parameter_id: ParameterId::HapticSharpnessControl,
            time: 1.0,
            control_points: vec![
                ControlPoint { time: 0.0, parameter_value: -0.2 },
                ControlPoint { time: 1.0, parameter_value: 0.2 },
            ],
        };
        assert_eq!(curve.value_at(0.5), None);
        assert_eq!(curve.value_at(1.0), Some(-0.2));
        assert!(curve.value_at(1.5).unwrap().abs() < 1e-6);
        assert_eq!(curve.value_at(5.0), Some(0.2));
    }

    #[test]
    fn audio_only_document_is_empty() {
        let doc = parse_ahap_json(
            r#"{ "Pattern": [ { "Event": { "Time": 0, "EventType": "AudioContinuous", "EventDuration": 1 } } ] }"#,
        )
        .unwrap();
        assert_eq!(doc.to_pattern(), Err(HapticsError::EmptyPattern));
    }

    #[test]
    fn negative_times_are_rejected() {
        let doc = parse_ahap_json(
            r#"{ "Pattern": [ { "Event": { "Time": -1, "EventType": "HapticTransient" } } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            doc.to_pattern(),
            Err(HapticsError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn malformed_json_is_invalid_pattern() {
        assert!(matches!(
            parse_ahap_json("{ \"Pattern\": ["),
            Err(HapticsError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn unknown_identifiers_survive_a_round_trip() {
        let doc = parse_ahap_json(
            r#"{ "Pattern": [ { "Event": { "Time": 0, "EventType": "HapticTransient",
                "EventParameters": [ { "ParameterID": "AttackTime", "ParameterValue": 0.1 } ] } } ] }"#,
        )
        .unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"AttackTime\""));
        assert_eq!(parse_ahap_json(&json).unwrap(), doc);
    }
}
