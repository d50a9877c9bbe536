//! Pattern compiler: symbol sequence -> timed event list.
//!
//! Every token emits exactly one event. Impacts become `Impact` events that
//! carry their nominal duration; delays become silent `Continuous` events.
//! An event's relative time is the sum of the durations of the events before it.

use std::time::Duration;

use log::warn;

use crate::config::Config;
use crate::error::HapticsError;
use crate::event::{HapticEvent, HapticPattern};
use crate::token::HapticToken;

/// A symbol that was not in the table and got replaced by the default token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidSymbol {
    pub index: usize,
    pub symbol: String,
}

/// Compiled pattern plus the symbols that were substituted along the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Compilation {
    pub pattern: HapticPattern,
    pub invalid: Vec<InvalidSymbol>,
}

#[derive(Clone, Debug)]
pub struct PatternCompiler {
    log_invalid_symbols: bool,
}

impl Default for PatternCompiler {
    fn default() -> Self {
        Self {
            log_invalid_symbols: true,
        }
    }
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            log_invalid_symbols: cfg.log_invalid_symbols,
        }
    }

    /// Compile host-provided symbol strings (one character each).
    pub fn compile<I, S>(&self, symbols: I) -> Result<HapticPattern, HapticsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.compile_with_diagnostics(symbols).map(|c| c.pattern)
    }

    pub fn compile_with_diagnostics<I, S>(&self, symbols: I) -> Result<Compilation, HapticsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut invalid = Vec::new();
        let tokens: Vec<HapticToken> = symbols
            .into_iter()
            .enumerate()
            .map(|(index, s)| {
                let s = s.as_ref();
                HapticToken::from_symbol_str(s).unwrap_or_else(|| {
                    invalid.push(InvalidSymbol {
                        index,
                        symbol: s.to_string(),
                    });
                    HapticToken::DEFAULT
                })
            })
            .collect();
        self.report(&invalid);
        let pattern = build_pattern(&tokens)?;
        Ok(Compilation { pattern, invalid })
    }

    pub fn compile_chars<I>(&self, symbols: I) -> Result<HapticPattern, HapticsError>
    where
        I: IntoIterator<Item = char>,
    {
        self.compile(symbols.into_iter().map(String::from))
    }

    /// Compile every character of `pattern`, e.g. `"..oO-"`.
    pub fn compile_str(&self, pattern: &str) -> Result<HapticPattern, HapticsError> {
        self.compile_chars(pattern.chars())
    }

    fn report(&self, invalid: &[InvalidSymbol]) {
        if !self.log_invalid_symbols {
            return;
        }
        for bad in invalid {
            warn!(
                "unrecognized haptic symbol {:?} at index {}; using {:?}",
                bad.symbol,
                bad.index,
                HapticToken::DEFAULT
            );
        }
    }
}

/// Compile with the default compiler settings.
pub fn compile<I, S>(symbols: I) -> Result<HapticPattern, HapticsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PatternCompiler::default().compile(symbols)
}

/// Lay tokens out on a timeline.
pub fn build_pattern(tokens: &[HapticToken]) -> Result<HapticPattern, HapticsError> {
    if tokens.is_empty() {
        return Err(HapticsError::EmptyPattern);
    }
    let mut events = Vec::with_capacity(tokens.len());
    let mut at = Duration::ZERO;
    for token in tokens {
        let event = match token.impact() {
            Some(impact) => HapticEvent::impact(
                at,
                impact.strength,
                impact.sharpness,
                Some(impact.duration),
            ),
            None => HapticEvent::pause(at, token.duration()),
        };
        at += token.duration();
        events.push(event);
    }
    HapticPattern::new(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn empty_input_is_an_error() {
        let none: [&str; 0] = [];
        assert_eq!(compile(none), Err(HapticsError::EmptyPattern));
        assert_eq!(
            PatternCompiler::new().compile_str(""),
            Err(HapticsError::EmptyPattern)
        );
    }

    #[test]
    fn light_medium_heavy_then_short_delay() {
        let p = compile([".", ".", ".", "o", "O", "-"]).unwrap();
        assert_eq!(p.len(), 6);

        let last = &p.events()[5];
        assert_eq!(last.kind, EventKind::Continuous);
        assert!(last.is_silent());
        assert_eq!(last.duration, Some(Duration::from_millis(100)));

        let preceding: Duration = p.events()[..5]
            .iter()
            .map(|e| e.duration.unwrap_or_default())
            .sum();
        assert_eq!(preceding, Duration::from_millis(180));
        assert_eq!(last.relative_time, preceding);
    }

    #[test]
    fn times_accumulate_through_delays() {
        let p = PatternCompiler::new().compile_str("o=o").unwrap();
        let times: Vec<u128> = p
            .events()
            .iter()
            .map(|e| e.relative_time.as_millis())
            .collect();
        assert_eq!(times, vec![0, 40, 1040]);
        assert_eq!(p.duration(), Duration::from_millis(1080));
    }

    #[test]
    fn unknown_symbols_are_reported_not_fatal() {
        let c = PatternCompiler::new()
            .compile_with_diagnostics(["o", "?", "oo", "X"])
            .unwrap();
        assert_eq!(c.pattern.len(), 4);
        let idx: Vec<usize> = c.invalid.iter().map(|i| i.index).collect();
        assert_eq!(idx, vec![1, 2, 3]);
        // substituted with the light impact
        let light = HapticToken::Light.impact().unwrap();
        assert_eq!(c.pattern.events()[1].strength, light.strength);
        assert_eq!(c.pattern.events()[1].duration, Some(light.duration));
    }

    #[test]
    fn char_input_matches_symbol_input() {
        let compiler = PatternCompiler::new();
        let from_str = compiler.compile_str(".?o").unwrap();
        let from_symbols = compiler.compile([".", "?", "o"]).unwrap();
        assert_eq!(from_str, from_symbols);
    }
}
