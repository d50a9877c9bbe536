//! Error types for the haptics core

use serde::{Deserialize, Serialize};

/// Errors surfaced by the compiler, the pattern library, and the playback engine.
///
/// Nothing in this crate panics on bad input; every failure a host can trigger
/// comes back as one of these variants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HapticsError {
    /// Vibration or haptic capability is absent on this device/OS version
    #[error("Haptics are not supported on this device: {reason}")]
    UnsupportedPlatform { reason: String },

    /// A pattern was built from zero tokens or zero events
    #[error("Haptic pattern is empty")]
    EmptyPattern,

    /// Hardware handle could not be acquired or was lost
    #[error("Haptic engine unavailable: {reason}")]
    EngineUnavailable { reason: String, persistent: bool },

    /// Named pattern resource does not exist
    #[error("Haptic pattern not found: {name}")]
    PatternNotFound { name: String },

    /// Pattern document could not be decoded
    #[error("Invalid haptic pattern: {reason}")]
    InvalidPattern { reason: String },

    /// A platform call failed after the handle was acquired
    #[error("Haptic backend error: {reason}")]
    Backend { reason: String },

    /// IO error
    #[error("IO error: {reason}")]
    Io { reason: String },
}

impl HapticsError {
    /// Engine fault that a later re-acquisition may clear.
    pub fn engine_unavailable(reason: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            reason: reason.into(),
            persistent: false,
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            reason: reason.into(),
        }
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }

    /// Check if the caller can retry or carry on after this error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::EngineUnavailable { persistent, .. } => !persistent,
            Self::UnsupportedPlatform { .. }
            | Self::PatternNotFound { .. }
            | Self::Backend { .. }
            | Self::Io { .. } => true,
            Self::EmptyPattern | Self::InvalidPattern { .. } => false,
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => "platform",
            Self::EmptyPattern | Self::InvalidPattern { .. } => "pattern",
            Self::EngineUnavailable { .. } | Self::Backend { .. } => "engine",
            Self::PatternNotFound { .. } => "resource",
            Self::Io { .. } => "io",
        }
    }
}

impl From<std::io::Error> for HapticsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HapticsError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPattern {
            reason: err.to_string(),
        }
    }
}
