//! Canned haptic feedback types exposed to the application layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HapticType {
    Light,
    #[default]
    Medium,
    Heavy,
    Rigid,
    Soft,
    Success,
    Warning,
    Error,
    SelectionChanged,
}

impl HapticType {
    pub const ALL: [HapticType; 9] = [
        Self::Light,
        Self::Medium,
        Self::Heavy,
        Self::Rigid,
        Self::Soft,
        Self::Success,
        Self::Warning,
        Self::Error,
        Self::SelectionChanged,
    ];

    /// Wire name, as the host passes it.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
            Self::Rigid => "rigid",
            Self::Soft => "soft",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::SelectionChanged => "selectionChanged",
        }
    }

    #[inline]
    pub fn is_impact(&self) -> bool {
        matches!(
            self,
            Self::Light | Self::Medium | Self::Heavy | Self::Rigid | Self::Soft
        )
    }

    #[inline]
    pub fn is_notification(&self) -> bool {
        matches!(self, Self::Success | Self::Warning | Self::Error)
    }
}

impl fmt::Display for HapticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HapticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown haptic type '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for t in HapticType::ALL {
            assert_eq!(t.name().parse::<HapticType>(), Ok(t));
        }
        assert!("Medium".parse::<HapticType>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&HapticType::SelectionChanged).unwrap();
        assert_eq!(json, "\"selectionChanged\"");
        assert_eq!(HapticType::default(), HapticType::Medium);
    }
}
