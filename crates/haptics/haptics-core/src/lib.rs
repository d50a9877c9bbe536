//! Haptics Core (platform-agnostic)
//!
//! Compiles symbolic haptic patterns into timed events, resolves canned
//! feedback types against device capabilities, parses AHAP documents and runs
//! the playback engine lifecycle. Hardware is reached only through the
//! [`HapticBackend`] trait; adapters (wasm, native shims) implement it.

pub mod ahap;
pub mod backend;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod feedback;
pub mod haptic_type;
pub mod haptics;
pub mod lease;
pub mod library;
pub mod timer;
pub mod token;

// Re-exports for consumers (adapters)
pub use ahap::{parse_ahap_json, AhapDocument, AhapEvent, EventType, ParameterCurve, ParameterId};
pub use backend::{BackendCall, Capabilities, HapticBackend, RecordingBackend};
pub use compiler::{build_pattern, compile, Compilation, InvalidSymbol, PatternCompiler};
pub use config::Config;
pub use engine::{
    ActivePlayback, EngineInput, EngineState, HapticEngine, HardwareSignal, PlaybackKind,
    StopReason,
};
pub use error::HapticsError;
pub use event::{EventKind, HapticEvent, HapticPattern, Waveform, TRANSIENT_DURATION};
pub use feedback::{
    resolve_feedback, FeedbackEffect, ImpactStyle, NotificationKind, PredefinedEffect,
    VibrationFrequency,
};
pub use haptic_type::HapticType;
pub use haptics::Haptics;
pub use library::PatternLibrary;
pub use timer::RepeatTimer;
pub use token::{HapticToken, Impact};

pub type Result<T> = core::result::Result<T, HapticsError>;
