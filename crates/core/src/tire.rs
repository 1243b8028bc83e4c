//! Tire compounds understood by the race simulator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TireCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl TireCompound {
    pub const ALL: [TireCompound; 5] = [
        TireCompound::Soft,
        TireCompound::Medium,
        TireCompound::Hard,
        TireCompound::Intermediate,
        TireCompound::Wet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TireCompound::Soft => "Soft",
            TireCompound::Medium => "Medium",
            TireCompound::Hard => "Hard",
            TireCompound::Intermediate => "Intermediate",
            TireCompound::Wet => "Wet",
        }
    }
}

impl fmt::Display for TireCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for compound names outside [`TireCompound::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tire compound '{0}' (expected one of Soft, Medium, Hard, Intermediate, Wet)")]
pub struct UnknownCompound(pub String);

impl FromStr for TireCompound {
    type Err = UnknownCompound;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCompound(s.to_string()))
    }
}
