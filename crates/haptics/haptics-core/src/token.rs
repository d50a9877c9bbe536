//! Pattern tokens and the canonical symbol table.
//!
//! | symbol | token  | strength | sharpness | duration |
//! |--------|--------|----------|-----------|----------|
//! | `.`    | Light  | 0.6      | 1.0       | 20 ms    |
//! | `:`    | Soft   | 0.6      | 0.0       | 25 ms    |
//! | `o`    | Medium | 1.0      | 0.0       | 40 ms    |
//! | `x`    | Rigid  | 0.8      | 1.0       | 60 ms    |
//! | `O`    | Heavy  | 1.0      | 1.0       | 80 ms    |
//! | `-`    | Delay  |          |           | 100 ms   |
//! | `=`    | Delay  |          |           | 1000 ms  |
//!
//! Any other symbol resolves to [`HapticToken::DEFAULT`].

use std::time::Duration;

const HARD: f32 = 1.0;
const FIRM: f32 = 0.8;
const SOFT: f32 = 0.6;
const SHARP: f32 = 1.0;
const DULL: f32 = 0.0;

const LIGHT_MS: u64 = 20;
const SOFT_MS: u64 = 25;
const MEDIUM_MS: u64 = 40;
const RIGID_MS: u64 = 60;
const HEAVY_MS: u64 = 80;

pub const SHORT_DELAY: Duration = Duration::from_millis(100);
pub const LONG_DELAY: Duration = Duration::from_millis(1000);

/// One compiled symbol: an impact flavour or a silent wait.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HapticToken {
    Light,
    Medium,
    Heavy,
    Rigid,
    Soft,
    Delay(Duration),
}

/// Strength/sharpness/duration triple an impact token renders to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    pub strength: f32,
    pub sharpness: f32,
    pub duration: Duration,
}

impl HapticToken {
    /// Substituted for symbols missing from the table.
    pub const DEFAULT: HapticToken = HapticToken::Light;

    /// Look up a symbol in the canonical table.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Self::Light),
            ':' => Some(Self::Soft),
            'o' => Some(Self::Medium),
            'x' => Some(Self::Rigid),
            'O' => Some(Self::Heavy),
            '-' => Some(Self::Delay(SHORT_DELAY)),
            '=' => Some(Self::Delay(LONG_DELAY)),
            _ => None,
        }
    }

    /// Look up a host-provided symbol string. Anything that is not exactly one
    /// character is unrecognized.
    pub fn from_symbol_str(symbol: &str) -> Option<Self> {
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_symbol(c),
            _ => None,
        }
    }

    #[inline]
    pub fn from_symbol_or_default(symbol: char) -> Self {
        Self::from_symbol(symbol).unwrap_or(Self::DEFAULT)
    }

    /// Impact parameters, or `None` for delays.
    pub fn impact(&self) -> Option<Impact> {
        let (strength, sharpness, ms) = match self {
            Self::Light => (SOFT, SHARP, LIGHT_MS),
            Self::Soft => (SOFT, DULL, SOFT_MS),
            Self::Medium => (HARD, DULL, MEDIUM_MS),
            Self::Rigid => (FIRM, SHARP, RIGID_MS),
            Self::Heavy => (HARD, SHARP, HEAVY_MS),
            Self::Delay(_) => return None,
        };
        Some(Impact {
            strength,
            sharpness,
            duration: Duration::from_millis(ms),
        })
    }

    /// Time this token occupies in a compiled pattern.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Delay(d) => *d,
            other => other.impact().map(|i| i.duration).unwrap_or_default(),
        }
    }

    #[inline]
    pub fn is_delay(&self) -> bool {
        matches!(self, Self::Delay(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_documented_symbols() {
        assert_eq!(HapticToken::from_symbol('.'), Some(HapticToken::Light));
        assert_eq!(HapticToken::from_symbol(':'), Some(HapticToken::Soft));
        assert_eq!(HapticToken::from_symbol('o'), Some(HapticToken::Medium));
        assert_eq!(HapticToken::from_symbol('x'), Some(HapticToken::Rigid));
        assert_eq!(HapticToken::from_symbol('O'), Some(HapticToken::Heavy));
        assert_eq!(
            HapticToken::from_symbol('-'),
            Some(HapticToken::Delay(Duration::from_millis(100)))
        );
        assert_eq!(
            HapticToken::from_symbol('='),
            Some(HapticToken::Delay(Duration::from_secs(1)))
        );
    }

    #[test]
    fn unknown_symbols_fall_back_to_light() {
        for c in ['X', '?', ' ', '0', 'é'] {
            assert_eq!(HapticToken::from_symbol(c), None);
            assert_eq!(HapticToken::from_symbol_or_default(c), HapticToken::Light);
        }
    }

    #[test]
    fn multi_char_strings_are_unrecognized() {
        assert_eq!(HapticToken::from_symbol_str("o"), Some(HapticToken::Medium));
        assert_eq!(HapticToken::from_symbol_str("oo"), None);
        assert_eq!(HapticToken::from_symbol_str(""), None);
    }

    #[test]
    fn impact_parameters_stay_in_unit_range() {
        for token in [
            HapticToken::Light,
            HapticToken::Soft,
            HapticToken::Medium,
            HapticToken::Rigid,
            HapticToken::Heavy,
        ] {
            let impact = token.impact().expect("impact token");
            assert!((0.0..=1.0).contains(&impact.strength));
            assert!((0.0..=1.0).contains(&impact.sharpness));
            assert!(impact.duration > Duration::ZERO);
        }
        assert!(HapticToken::Delay(SHORT_DELAY).impact().is_none());
        assert_eq!(HapticToken::Delay(SHORT_DELAY).duration(), SHORT_DELAY);
    }
}
