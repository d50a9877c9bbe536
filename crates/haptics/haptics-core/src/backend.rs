//! Backend seam: the platform shim that actually drives vibration hardware.
//!
//! The core only ever talks to hardware through [`HapticBackend`]. Adapters
//! (wasm/JS, native mobile shims) implement it; [`RecordingBackend`] is an
//! in-memory implementation for headless hosts and tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HapticsError;
use crate::event::HapticPattern;
use crate::feedback::FeedbackEffect;

/// What the device and OS can render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Capabilities {
    /// Any vibrator at all.
    pub vibration: bool,
    /// Timed multi-event patterns (CoreHaptics engine, or Android waveforms).
    pub haptic_patterns: bool,
    pub impact_styles: bool,
    pub notifications: bool,
    pub selection: bool,
    /// Android `VibrationEffect.createPredefined`.
    pub predefined_effects: bool,
    pub amplitude_control: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    /// An iPhone with a Taptic Engine.
    pub fn ios() -> Self {
        Self {
            vibration: true,
            haptic_patterns: true,
            impact_styles: true,
            notifications: true,
            selection: true,
            predefined_effects: false,
            amplitude_control: true,
        }
    }

    /// Android at the given API level. Vibration effects need API 26 (O);
    /// predefined effects need API 29 (Q).
    pub fn android(api_level: u32) -> Self {
        let effects = api_level >= 26;
        Self {
            vibration: effects,
            haptic_patterns: effects,
            impact_styles: false,
            notifications: false,
            selection: false,
            predefined_effects: api_level >= 29,
            amplitude_control: effects,
        }
    }

    /// True if at least one canned feedback can be rendered.
    #[inline]
    pub fn can_vibrate(&self) -> bool {
        self.vibration || self.impact_styles || self.haptic_patterns
    }
}

/// Platform shim driven by [`crate::HapticEngine`].
///
/// `acquire` creates or restarts the hardware engine and must be idempotent.
/// `restart_pattern` replays the most recently started pattern from its start.
pub trait HapticBackend {
    /// Stable identity of the hardware this backend drives.
    fn device_id(&self) -> &str;
    fn capabilities(&self) -> Capabilities;
    fn acquire(&mut self) -> Result<(), HapticsError>;
    fn release(&mut self);
    fn perform(&mut self, effect: &FeedbackEffect) -> Result<(), HapticsError>;
    fn start_pattern(&mut self, pattern: &HapticPattern) -> Result<(), HapticsError>;
    fn restart_pattern(&mut self) -> Result<(), HapticsError>;
    fn stop_pattern(&mut self) -> Result<(), HapticsError>;
}

/// One call observed by [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    Acquire,
    Release,
    Perform(FeedbackEffect),
    StartPattern { events: usize, duration: Duration },
    RestartPattern,
    StopPattern,
}

static NEXT_RECORDING_DEVICE: AtomicU64 = AtomicU64::new(0);

/// In-memory backend that records every call. Failures can be scripted to
/// exercise recovery paths.
#[derive(Debug)]
pub struct RecordingBackend {
    device_id: String,
    caps: Capabilities,
    calls: Vec<BackendCall>,
    acquired: bool,
    pending_acquire_failures: u32,
    fail_playback: bool,
}

impl RecordingBackend {
    /// Each instance gets its own device id so independent engines can coexist.
    pub fn new(caps: Capabilities) -> Self {
        let n = NEXT_RECORDING_DEVICE.fetch_add(1, Ordering::Relaxed);
        Self::with_device_id(format!("recording-{n}"), caps)
    }

    pub fn with_device_id(device_id: impl Into<String>, caps: Capabilities) -> Self {
        Self {
            device_id: device_id.into(),
            caps,
            calls: Vec::new(),
            acquired: false,
            pending_acquire_failures: 0,
            fail_playback: false,
        }
    }

    /// Fail the next `n` acquire calls.
    pub fn fail_next_acquires(&mut self, n: u32) {
        self.pending_acquire_failures = n;
    }

    /// Make pattern start/restart and effects fail until reset.
    pub fn set_fail_playback(&mut self, fail: bool) {
        self.fail_playback = fail;
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    fn check_playback(&self) -> Result<(), HapticsError> {
        if self.fail_playback {
            Err(HapticsError::backend("scripted playback failure"))
        } else {
            Ok(())
        }
    }
}

impl HapticBackend for RecordingBackend {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn acquire(&mut self) -> Result<(), HapticsError> {
        self.calls.push(BackendCall::Acquire);
        if self.pending_acquire_failures > 0 {
            self.pending_acquire_failures -= 1;
            self.acquired = false;
            return Err(HapticsError::backend("scripted acquire failure"));
        }
        self.acquired = true;
        Ok(())
    }

    fn release(&mut self) {
        self.calls.push(BackendCall::Release);
        self.acquired = false;
    }

    fn perform(&mut self, effect: &FeedbackEffect) -> Result<(), HapticsError> {
        self.calls.push(BackendCall::Perform(effect.clone()));
        self.check_playback()
    }

    fn start_pattern(&mut self, pattern: &HapticPattern) -> Result<(), HapticsError> {
        self.calls.push(BackendCall::StartPattern {
            events: pattern.len(),
            duration: pattern.duration(),
        });
        self.check_playback()
    }

    fn restart_pattern(&mut self) -> Result<(), HapticsError> {
        self.calls.push(BackendCall::RestartPattern);
        self.check_playback()
    }

    fn stop_pattern(&mut self) -> Result<(), HapticsError> {
        self.calls.push(BackendCall::StopPattern);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn android_capabilities_by_api_level() {
        assert!(!Capabilities::android(25).can_vibrate());
        let o = Capabilities::android(26);
        assert!(o.can_vibrate() && o.haptic_patterns && !o.predefined_effects);
        assert!(Capabilities::android(29).predefined_effects);
    }

    #[test]
    fn recording_devices_are_distinct() {
        let a = RecordingBackend::new(Capabilities::ios());
        let b = RecordingBackend::new(Capabilities::ios());
        assert_ne!(a.device_id(), b.device_id());
    }

    #[test]
    fn scripted_acquire_failures_run_out() {
        let mut b = RecordingBackend::new(Capabilities::ios());
        b.fail_next_acquires(1);
        assert!(b.acquire().is_err());
        assert!(b.acquire().is_ok());
        assert!(b.is_acquired());
        assert_eq!(b.count(|c| *c == BackendCall::Acquire), 2);
    }
}
