//! Caller-facing facade: the four operations hosts call, plus the library of
//! named patterns and the host-time/hardware-signal hooks.

use std::time::Duration;

use log::warn;

use crate::backend::HapticBackend;
use crate::compiler::PatternCompiler;
use crate::config::Config;
use crate::engine::{EngineState, HapticEngine, HardwareSignal};
use crate::error::HapticsError;
use crate::feedback::{FeedbackEffect, VibrationFrequency};
use crate::haptic_type::HapticType;
use crate::library::PatternLibrary;

/// Composition root: one engine, one compiler, one pattern library.
#[derive(Debug)]
pub struct Haptics<B: HapticBackend> {
    engine: HapticEngine<B>,
    compiler: PatternCompiler,
    library: PatternLibrary,
}

impl<B: HapticBackend> Haptics<B> {
    pub fn new(backend: B, cfg: Config) -> Result<Self, HapticsError> {
        let compiler = PatternCompiler::from_config(&cfg);
        let engine = HapticEngine::new(backend, cfg)?;
        Ok(Self {
            engine,
            compiler,
            library: PatternLibrary::new(),
        })
    }

    /// Fire a canned feedback.
    pub fn haptic(&mut self, ty: HapticType) -> Result<(), HapticsError> {
        self.engine.trigger(ty)
    }

    /// Fire the configured default feedback.
    pub fn haptic_default(&mut self) -> Result<(), HapticsError> {
        let ty = self.engine.config().default_haptic;
        self.engine.trigger(ty)
    }

    /// Fire a feedback named by the host. Unknown names play the default
    /// impact instead of failing.
    pub fn haptic_named(&mut self, name: &str) -> Result<(), HapticsError> {
        match name.parse::<HapticType>() {
            Ok(ty) => self.engine.trigger(ty),
            Err(e) => {
                warn!("{e}; playing the default impact");
                self.engine.perform(&FeedbackEffect::default_impact())
            }
        }
    }

    /// Compile `pattern` and play it once, starting after `delay`.
    pub fn haptic_with_pattern<S: AsRef<str>>(
        &mut self,
        pattern: &[S],
        delay: Duration,
    ) -> Result<(), HapticsError> {
        let compiled = self.compiler.compile(pattern)?.delayed(delay);
        self.engine.play(&compiled, false)
    }

    /// Play a named pattern from the library, optionally looping it.
    pub fn play(&mut self, file_name: &str, looping: bool) -> Result<(), HapticsError> {
        let pattern = self.library.get(file_name)?.to_pattern()?;
        self.engine.play(&pattern, looping)
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn vibrate(
        &mut self,
        frequency: VibrationFrequency,
        looping: bool,
    ) -> Result<(), HapticsError> {
        self.engine.start_vibrate(frequency, looping)
    }

    /// Advance host time; see [`HapticEngine::advance`].
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.engine.advance(dt)
    }

    pub fn notify(&mut self, signal: HardwareSignal) {
        self.engine.notify(signal);
    }

    pub fn prepare(&mut self) {
        self.engine.prepare();
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn supports_haptics(&self) -> bool {
        self.engine.supports_haptics()
    }

    pub fn compiler(&self) -> &PatternCompiler {
        &self.compiler
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut PatternLibrary {
        &mut self.library
    }

    pub fn engine(&self) -> &HapticEngine<B> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut HapticEngine<B> {
        &mut self.engine
    }
}
