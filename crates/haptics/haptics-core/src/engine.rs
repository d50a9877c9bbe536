//! Engine: exclusive owner of the hardware backend and its lifecycle.
//!
//! Lifecycle: `Uninitialized -> Ready -> Playing -> (Stopped | Ready)`, with
//! `Error` reachable on hardware fault. Every operation and every hardware
//! signal is reduced to an [`EngineInput`] and fed through
//! [`EngineState::next`]; no other code assigns the state.
//!
//! Looping playback re-triggers the backend from a [`RepeatTimer`] the host
//! advances via [`HapticEngine::advance`]. Starting anything cancels the
//! previous timer first, and `stop` guarantees no further fires.

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::backend::HapticBackend;
use crate::config::Config;
use crate::error::HapticsError;
use crate::event::HapticPattern;
use crate::feedback::{resolve_feedback, FeedbackEffect, VibrationFrequency};
use crate::haptic_type::HapticType;
use crate::lease::DeviceLease;
use crate::timer::RepeatTimer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineState {
    /// No hardware handle yet (or released).
    Uninitialized,
    Ready,
    Playing,
    /// Stopped by the caller or by the system; restartable.
    Stopped,
    /// Hardware fault; the next play or reset re-acquires.
    Error,
}

/// Why the system stopped the hardware engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    AudioSessionInterrupt,
    ApplicationSuspended,
    IdleTimeout,
    NotifyWhenFinished,
    EngineDestroyed,
    GameControllerDisconnect,
    SystemError,
    Unknown,
}

/// Discrete inputs to the lifecycle state machine.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineInput {
    Acquired,
    PlaybackStarted,
    PlaybackStopped,
    PlayersFinished,
    HardwareFault,
    HardwareReset,
    HardwareStopped(StopReason),
    Released,
}

/// Signals a platform shim forwards from the OS.
#[derive(Clone, Debug, PartialEq)]
pub enum HardwareSignal {
    /// The OS reset the haptic server; the handle must be re-acquired.
    Reset,
    /// The OS stopped the engine (focus loss, suspension, ...).
    Stopped(StopReason),
    /// All players completed; `error` is set when completion was abnormal.
    PlayersFinished { error: Option<String> },
    Fault { reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackKind {
    Pattern,
    SystemVibration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivePlayback {
    pub kind: PlaybackKind,
    pub looping: bool,
}

impl EngineState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }

    /// Transition function.
    pub fn next(self, input: &EngineInput) -> EngineState {
        use EngineInput as I;
        use EngineState::*;
        match (self, input) {
            (_, I::Released) => Uninitialized,
            (Playing, I::Acquired) => Playing,
            (_, I::Acquired) => Ready,
            (Ready | Playing | Stopped, I::PlaybackStarted) => Playing,
            (Playing, I::PlaybackStopped) => Stopped,
            (Playing, I::PlayersFinished) => Ready,
            (Uninitialized, I::HardwareReset) => Uninitialized,
            (_, I::HardwareFault | I::HardwareReset) => Error,
            (Ready | Playing, I::HardwareStopped(_)) => Stopped,
            (s, _) => s,
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl StopReason {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AudioSessionInterrupt => "audioSessionInterrupt",
            Self::ApplicationSuspended => "applicationSuspended",
            Self::IdleTimeout => "idleTimeout",
            Self::NotifyWhenFinished => "notifyWhenFinished",
            Self::EngineDestroyed => "engineDestroyed",
            Self::GameControllerDisconnect => "gameControllerDisconnect",
            Self::SystemError => "systemError",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for StopReason {
    fn from(s: &str) -> Self {
        match s {
            "audioSessionInterrupt" => Self::AudioSessionInterrupt,
            "applicationSuspended" => Self::ApplicationSuspended,
            "idleTimeout" => Self::IdleTimeout,
            "notifyWhenFinished" => Self::NotifyWhenFinished,
            "engineDestroyed" => Self::EngineDestroyed,
            "gameControllerDisconnect" => Self::GameControllerDisconnect,
            "systemError" => Self::SystemError,
            _ => Self::Unknown,
        }
    }
}

/// Playback engine over a single hardware backend.
#[derive(Debug)]
pub struct HapticEngine<B: HapticBackend> {
    backend: B,
    lease: DeviceLease,
    cfg: Config,
    state: EngineState,
    supports_haptics: bool,
    timer: RepeatTimer,
    active: Option<ActivePlayback>,
    failed_recoveries: u32,
    last_stop_reason: Option<StopReason>,
}

impl<B: HapticBackend> HapticEngine<B> {
    /// Take ownership of `backend`. Fails if another engine already drives the
    /// same device. The hardware is not touched until first use or
    /// [`initialize`](Self::initialize).
    pub fn new(backend: B, cfg: Config) -> Result<Self, HapticsError> {
        let lease = DeviceLease::claim(backend.device_id())?;
        let supports_haptics = backend.capabilities().haptic_patterns;
        Ok(Self {
            backend,
            lease,
            cfg,
            state: EngineState::Uninitialized,
            supports_haptics,
            timer: RepeatTimer::new(),
            active: None,
            failed_recoveries: 0,
            last_stop_reason: None,
        })
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn supports_haptics(&self) -> bool {
        self.supports_haptics
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == EngineState::Playing
    }

    pub fn active_playback(&self) -> Option<ActivePlayback> {
        self.active
    }

    pub fn timer(&self) -> &RepeatTimer {
        &self.timer
    }

    pub fn last_stop_reason(&self) -> Option<StopReason> {
        self.last_stop_reason
    }

    pub fn device_id(&self) -> &str {
        self.lease.device_id()
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn apply(&mut self, input: EngineInput) {
        let next = self.state.next(&input);
        if next != self.state {
            debug!("haptic engine {} -> {} on {:?}", self.state, next, input);
        }
        self.state = next;
    }

    /// Acquire the hardware. When the device cannot play haptic patterns the
    /// engine fails closed: `supports_haptics` becomes false and this returns
    /// `Ok` without touching the backend.
    pub fn initialize(&mut self) -> Result<(), HapticsError> {
        if self.state != EngineState::Uninitialized {
            return Ok(());
        }
        if !self.backend.capabilities().haptic_patterns {
            self.supports_haptics = false;
            warn!(
                "device '{}' cannot play haptic patterns; engine disabled",
                self.device_id()
            );
            return Ok(());
        }
        self.supports_haptics = true;
        self.acquire()
    }

    /// Best-effort [`initialize`](Self::initialize); failures are only logged.
    pub fn prepare(&mut self) {
        if let Err(e) = self.initialize() {
            warn!("haptic engine prepare failed: {e}");
        }
    }

    fn acquire(&mut self) -> Result<(), HapticsError> {
        match self.backend.acquire() {
            Ok(()) => {
                if self.failed_recoveries > 0 {
                    info!(
                        "haptic engine recovered after {} failed attempt(s)",
                        self.failed_recoveries
                    );
                } else {
                    info!("haptic engine acquired device '{}'", self.device_id());
                }
                self.failed_recoveries = 0;
                self.apply(EngineInput::Acquired);
                Ok(())
            }
            Err(e) => {
                self.failed_recoveries = self.failed_recoveries.saturating_add(1);
                let persistent = self.failed_recoveries >= self.cfg.max_recovery_attempts.max(1);
                warn!(
                    "haptic engine acquisition failed ({} in a row): {e}",
                    self.failed_recoveries
                );
                self.apply(EngineInput::HardwareFault);
                Err(HapticsError::EngineUnavailable {
                    reason: e.to_string(),
                    persistent,
                })
            }
        }
    }

    fn ensure_ready(&mut self) -> Result<(), HapticsError> {
        match self.state {
            EngineState::Ready | EngineState::Playing => Ok(()),
            EngineState::Uninitialized => {
                if !self.backend.capabilities().haptic_patterns {
                    self.supports_haptics = false;
                    return Err(HapticsError::unsupported(
                        "haptic patterns are not available on this device",
                    ));
                }
                if !self.cfg.auto_initialize {
                    return Err(HapticsError::engine_unavailable(
                        "engine has not been initialized",
                    ));
                }
                self.initialize()
            }
            EngineState::Stopped | EngineState::Error => self.acquire(),
        }
    }

    /// Cancel the loop timer and stop the current player, if any.
    fn halt_active(&mut self) {
        let had_timer = self.timer.cancel();
        if let Some(active) = self.active.take() {
            if active.kind == PlaybackKind::Pattern {
                if let Err(e) = self.backend.stop_pattern() {
                    warn!("stopping haptic player failed: {e}");
                }
            }
            debug!("halted {:?} playback (timer pending: {had_timer})", active.kind);
        }
    }

    fn loop_interval(&self, natural: Duration) -> Duration {
        natural.max(Duration::from_millis(u64::from(self.cfg.min_loop_interval_ms)))
    }

    /// Fire-and-forget effect. Needs no engine acquisition.
    pub fn perform(&mut self, effect: &FeedbackEffect) -> Result<(), HapticsError> {
        if !self.backend.capabilities().can_vibrate() {
            return Err(HapticsError::unsupported(
                "vibration is not supported on this device",
            ));
        }
        self.backend.perform(effect)
    }

    /// Canned feedback, resolved against the backend's capabilities.
    pub fn trigger(&mut self, ty: HapticType) -> Result<(), HapticsError> {
        let effect = resolve_feedback(ty, &self.backend.capabilities());
        self.perform(&effect)
    }

    /// Start `pattern`, replacing any current playback. When `looping`, the
    /// pattern is re-triggered every natural duration (floored at
    /// `min_loop_interval_ms`). A failed start triggers one re-acquisition
    /// and retry before the error is returned.
    pub fn play(&mut self, pattern: &HapticPattern, looping: bool) -> Result<(), HapticsError> {
        self.ensure_ready()?;
        self.halt_active();

        if let Err(first) = self.backend.start_pattern(pattern) {
            warn!("haptic pattern failed to start ({first}); re-acquiring engine");
            self.apply(EngineInput::HardwareFault);
            self.acquire()?;
            if let Err(e) = self.backend.start_pattern(pattern) {
                self.apply(EngineInput::HardwareFault);
                return Err(e);
            }
        }

        self.apply(EngineInput::PlaybackStarted);
        self.active = Some(ActivePlayback {
            kind: PlaybackKind::Pattern,
            looping,
        });
        if looping {
            let interval = self.loop_interval(pattern.duration());
            let generation = self.timer.schedule(interval);
            debug!("loop timer #{generation} every {interval:?}");
        }
        Ok(())
    }

    /// Play the generic system vibration, optionally repeating at `frequency`.
    pub fn start_vibrate(
        &mut self,
        frequency: VibrationFrequency,
        looping: bool,
    ) -> Result<(), HapticsError> {
        let halted = self.active.is_some();
        self.halt_active();
        if halted {
            self.apply(EngineInput::PlaybackStopped);
        }
        self.perform(&FeedbackEffect::SystemVibration)?;
        if looping {
            self.timer.schedule(frequency.interval());
            self.active = Some(ActivePlayback {
                kind: PlaybackKind::SystemVibration,
                looping: true,
            });
            self.apply(EngineInput::PlaybackStarted);
        }
        Ok(())
    }

    /// Stop any playback and cancel the loop timer. No-op when idle.
    pub fn stop(&mut self) {
        if self.active.is_none() && !self.timer.is_active() {
            return;
        }
        self.halt_active();
        self.apply(EngineInput::PlaybackStopped);
    }

    /// Advance host time. Returns true when the loop timer fired and the
    /// re-trigger reached the hardware. A failed re-trigger ends the loop.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.timer.advance(dt) {
            return false;
        }
        let Some(active) = self.active else {
            self.timer.cancel();
            return false;
        };
        let result = match active.kind {
            PlaybackKind::Pattern => self.backend.restart_pattern(),
            PlaybackKind::SystemVibration => self.backend.perform(&FeedbackEffect::SystemVibration),
        };
        match result {
            Ok(()) => {
                debug!("loop timer fired ({:?})", active.kind);
                true
            }
            Err(e) => {
                warn!("loop re-trigger failed: {e}; ending loop");
                self.timer.cancel();
                self.active = None;
                if active.kind == PlaybackKind::Pattern {
                    self.apply(EngineInput::HardwareFault);
                } else {
                    self.apply(EngineInput::PlaybackStopped);
                }
                false
            }
        }
    }

    /// Feed a hardware signal from the platform shim.
    pub fn notify(&mut self, signal: HardwareSignal) {
        match signal {
            HardwareSignal::Reset => {
                info!("haptic engine reset by the system; re-acquiring");
                self.timer.cancel();
                self.active = None;
                self.apply(EngineInput::HardwareReset);
                if self.state == EngineState::Error {
                    if let Err(e) = self.acquire() {
                        warn!("haptic engine recovery failed: {e}");
                    }
                }
            }
            HardwareSignal::Stopped(reason) => {
                warn!("haptic engine stopped by the system: {reason}");
                self.timer.cancel();
                self.active = None;
                self.last_stop_reason = Some(reason);
                self.apply(EngineInput::HardwareStopped(reason));
            }
            HardwareSignal::PlayersFinished { error: Some(err) } => {
                warn!("haptic players finished with error: {err}");
                self.timer.cancel();
                self.active = None;
                self.apply(EngineInput::HardwareFault);
            }
            HardwareSignal::PlayersFinished { error: None } => {
                // a looping playback keeps the engine running
                if matches!(self.active, Some(ActivePlayback { looping: false, .. })) {
                    self.active = None;
                    self.apply(EngineInput::PlayersFinished);
                }
            }
            HardwareSignal::Fault { reason } => {
                warn!("haptic engine fault: {reason}");
                self.timer.cancel();
                self.active = None;
                self.apply(EngineInput::HardwareFault);
            }
        }
    }

    /// Stop playback and give the hardware back. The engine can be
    /// re-initialized afterwards.
    pub fn release(&mut self) {
        self.halt_active();
        if self.state != EngineState::Uninitialized {
            self.backend.release();
            info!("haptic engine released device '{}'", self.device_id());
        }
        self.apply(EngineInput::Released);
    }
}

impl<B: HapticBackend> Drop for HapticEngine<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EngineState::*;

    #[test]
    fn happy_path_transitions() {
        let s = Uninitialized.next(&EngineInput::Acquired);
        assert_eq!(s, Ready);
        let s = s.next(&EngineInput::PlaybackStarted);
        assert_eq!(s, Playing);
        assert_eq!(s.next(&EngineInput::PlaybackStopped), Stopped);
        assert_eq!(s.next(&EngineInput::PlayersFinished), Ready);
    }

    #[test]
    fn playback_cannot_start_without_a_handle() {
        assert_eq!(Uninitialized.next(&EngineInput::PlaybackStarted), Uninitialized);
        assert_eq!(Error.next(&EngineInput::PlaybackStarted), Error);
    }

    #[test]
    fn stop_is_idempotent() {
        for s in [Uninitialized, Ready, Stopped, Error] {
            assert_eq!(s.next(&EngineInput::PlaybackStopped), s);
        }
    }

    #[test]
    fn faults_and_resets_lead_to_error_then_ready() {
        for s in [Ready, Playing, Stopped] {
            assert_eq!(s.next(&EngineInput::HardwareFault), Error);
            assert_eq!(s.next(&EngineInput::HardwareReset), Error);
        }
        assert_eq!(Uninitialized.next(&EngineInput::HardwareReset), Uninitialized);
        assert_eq!(Error.next(&EngineInput::Acquired), Ready);
    }

    #[test]
    fn system_stop_only_affects_live_states() {
        let stop = EngineInput::HardwareStopped(StopReason::ApplicationSuspended);
        assert_eq!(Playing.next(&stop), Stopped);
        assert_eq!(Ready.next(&stop), Stopped);
        assert_eq!(Error.next(&stop), Error);
        assert_eq!(Uninitialized.next(&stop), Uninitialized);
    }

    #[test]
    fn release_always_uninitializes() {
        for s in [Uninitialized, Ready, Playing, Stopped, Error] {
            assert_eq!(s.next(&EngineInput::Released), Uninitialized);
        }
    }

    #[test]
    fn stop_reason_names_round_trip() {
        for r in [
            StopReason::AudioSessionInterrupt,
            StopReason::ApplicationSuspended,
            StopReason::IdleTimeout,
            StopReason::SystemError,
        ] {
            assert_eq!(StopReason::from(r.name()), r);
        }
        assert_eq!(StopReason::from("bogus"), StopReason::Unknown);
    }
}
