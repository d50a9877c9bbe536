//! Timed haptic events and the non-empty pattern that owns them.

use std::time::Duration;

use crate::error::HapticsError;

/// Nominal on-time of an impact that carries no duration.
pub const TRANSIENT_DURATION: Duration = Duration::from_millis(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Short discrete force (a "tap").
    Impact,
    /// Sustained output; zero strength renders as a silent wait.
    Continuous,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HapticEvent {
    pub kind: EventKind,
    /// Offset from the start of the pattern.
    pub relative_time: Duration,
    /// Amplitude in [0,1].
    pub strength: f32,
    /// Frequency character in [0,1].
    pub sharpness: f32,
    pub duration: Option<Duration>,
}

impl HapticEvent {
    pub fn impact(
        relative_time: Duration,
        strength: f32,
        sharpness: f32,
        duration: Option<Duration>,
    ) -> Self {
        Self {
            kind: EventKind::Impact,
            relative_time,
            strength,
            sharpness,
            duration,
        }
    }

    pub fn continuous(
        relative_time: Duration,
        strength: f32,
        sharpness: f32,
        duration: Duration,
    ) -> Self {
        Self {
            kind: EventKind::Continuous,
            relative_time,
            strength,
            sharpness,
            duration: Some(duration),
        }
    }

    /// A silent continuous event: how delays are represented in a pattern.
    pub fn pause(relative_time: Duration, duration: Duration) -> Self {
        Self::continuous(relative_time, 0.0, 0.0, duration)
    }

    /// Start plus on-time; a transient impact without a duration counts as
    /// [`TRANSIENT_DURATION`].
    #[inline]
    pub fn end_time(&self) -> Duration {
        let on_time = match (self.kind, self.duration) {
            (_, Some(d)) => d,
            (EventKind::Impact, None) => TRANSIENT_DURATION,
            (EventKind::Continuous, None) => Duration::ZERO,
        };
        self.relative_time + on_time
    }

    #[inline]
    pub fn is_silent(&self) -> bool {
        self.strength <= 0.0
    }
}

/// Android-style waveform: alternating segment lengths with per-segment amplitude.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Waveform {
    pub timings_ms: Vec<u64>,
    /// 0 = off, 255 = full scale.
    pub amplitudes: Vec<u8>,
}

impl Waveform {
    fn push(&mut self, ms: u64, amplitude: u8) {
        if ms == 0 {
            return;
        }
        // only silence merges; back-to-back impacts stay distinct segments
        if let (Some(last_t), Some(last_a)) = (self.timings_ms.last_mut(), self.amplitudes.last()) {
            if amplitude == 0 && *last_a == 0 {
                *last_t += ms;
                return;
            }
        }
        self.timings_ms.push(ms);
        self.amplitudes.push(amplitude);
    }

    pub fn total_ms(&self) -> u64 {
        self.timings_ms.iter().sum()
    }
}

/// Ordered, non-empty sequence of haptic events.
#[derive(Clone, Debug, PartialEq)]
pub struct HapticPattern {
    events: Vec<HapticEvent>,
}

impl HapticPattern {
    /// Build a pattern, ordering events by relative time (stable) and clamping
    /// strength/sharpness into [0,1].
    pub fn new(mut events: Vec<HapticEvent>) -> Result<Self, HapticsError> {
        if events.is_empty() {
            return Err(HapticsError::EmptyPattern);
        }
        for ev in &mut events {
            ev.strength = clamp_unit(ev.strength);
            ev.sharpness = clamp_unit(ev.sharpness);
        }
        events.sort_by_key(|e| e.relative_time);
        Ok(Self { events })
    }

    #[inline]
    pub fn events(&self) -> &[HapticEvent] {
        &self.events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Natural length of one cycle: the latest event end.
    pub fn duration(&self) -> Duration {
        self.events
            .iter()
            .map(HapticEvent::end_time)
            .max()
            .unwrap_or_default()
    }

    /// Shift every event later by `offset`.
    pub fn delayed(mut self, offset: Duration) -> Self {
        if !offset.is_zero() {
            for ev in &mut self.events {
                ev.relative_time += offset;
            }
        }
        self
    }

    pub fn into_events(self) -> Vec<HapticEvent> {
        self.events
    }

    /// Render as an on/off waveform. Overlapping events are clipped so the
    /// timeline stays sequential.
    pub fn waveform(&self) -> Waveform {
        let mut wave = Waveform::default();
        let mut cursor = Duration::ZERO;
        for ev in &self.events {
            if ev.relative_time > cursor {
                wave.push(as_ms(ev.relative_time - cursor), 0);
                cursor = ev.relative_time;
            }
            let end = ev.end_time();
            if end > cursor {
                let amplitude = (ev.strength * 255.0).round() as u8;
                wave.push(as_ms(end - cursor), amplitude);
                cursor = end;
            }
        }
        wave
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn as_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert_eq!(HapticPattern::new(vec![]), Err(HapticsError::EmptyPattern));
    }

    #[test]
    fn new_sorts_and_clamps() {
        let p = HapticPattern::new(vec![
            HapticEvent::impact(ms(50), 2.0, -1.0, None),
            HapticEvent::impact(ms(10), f32::NAN, 0.5, None),
        ])
        .unwrap();
        assert_eq!(p.events()[0].relative_time, ms(10));
        assert_eq!(p.events()[0].strength, 0.0);
        assert_eq!(p.events()[1].strength, 1.0);
        assert_eq!(p.events()[1].sharpness, 0.0);
    }

    #[test]
    fn duration_is_latest_end() {
        let p = HapticPattern::new(vec![
            HapticEvent::continuous(ms(0), 1.0, 0.5, ms(300)),
            HapticEvent::impact(ms(100), 1.0, 0.5, None),
        ])
        .unwrap();
        assert_eq!(p.duration(), ms(300));
    }

    #[test]
    fn delayed_shifts_every_event() {
        let p = HapticPattern::new(vec![
            HapticEvent::impact(ms(0), 1.0, 1.0, Some(ms(20))),
            HapticEvent::pause(ms(20), ms(100)),
        ])
        .unwrap()
        .delayed(ms(250));
        assert_eq!(p.events()[0].relative_time, ms(250));
        assert_eq!(p.events()[1].relative_time, ms(270));
        assert_eq!(p.duration(), ms(370));
    }

    #[test]
    fn waveform_alternates_on_and_off() {
        let p = HapticPattern::new(vec![
            HapticEvent::impact(ms(0), 1.0, 1.0, Some(ms(40))),
            HapticEvent::pause(ms(40), ms(100)),
            HapticEvent::impact(ms(140), 0.6, 1.0, Some(ms(20))),
        ])
        .unwrap();
        let wave = p.waveform();
        assert_eq!(wave.timings_ms, vec![40, 100, 20]);
        assert_eq!(wave.amplitudes, vec![255, 0, 153]);
        assert_eq!(wave.total_ms(), 160);
    }

    #[test]
    fn back_to_back_taps_stay_separate() {
        let p = crate::compiler::compile([".", ".", "."]).unwrap();
        let wave = p.waveform();
        assert_eq!(wave.timings_ms, vec![20, 20, 20]);
        assert_eq!(wave.amplitudes, vec![153, 153, 153]);
    }

    #[test]
    fn transient_length_counts_toward_duration() {
        let p = HapticPattern::new(vec![HapticEvent::impact(ms(0), 1.0, 0.5, None)]).unwrap();
        assert_eq!(p.duration(), TRANSIENT_DURATION);
        assert_eq!(p.waveform().total_ms(), p.duration().as_millis() as u64);
    }

    #[test]
    fn waveform_fills_gaps_and_merges_silence() {
        let p = HapticPattern::new(vec![
            HapticEvent::pause(ms(0), ms(100)),
            HapticEvent::impact(ms(200), 1.0, 1.0, None),
        ])
        .unwrap();
        assert_eq!(p.duration(), ms(220));
        let wave = p.waveform();
        assert_eq!(wave.timings_ms, vec![200, 20]);
        assert_eq!(wave.amplitudes, vec![0, 255]);
    }
}
