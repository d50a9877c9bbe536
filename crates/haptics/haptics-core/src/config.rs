//! Core configuration for haptics-core.

use serde::{Deserialize, Serialize};

use crate::haptic_type::HapticType;

/// Engine and compiler knobs. Every field has a default so hosts can pass a
/// partial JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Floor for the loop re-trigger interval, so zero-length patterns do not spin.
    pub min_loop_interval_ms: u32,
    /// Consecutive failed re-acquisitions before the engine reports a persistent fault.
    pub max_recovery_attempts: u32,
    /// Used by `haptic()` when the caller names no type.
    pub default_haptic: HapticType,
    pub log_invalid_symbols: bool,
    /// Acquire the hardware on first use instead of requiring `initialize`.
    pub auto_initialize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_loop_interval_ms: 10,
            max_recovery_attempts: 3,
            default_haptic: HapticType::Medium,
            log_invalid_symbols: true,
            auto_initialize: true,
        }
    }
}
