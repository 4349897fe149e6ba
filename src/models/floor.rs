//! Floors: the tiers a ranked match is played on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Floor code the replay data uses for the Celestial floor.
pub const CELESTIAL_CODE: u8 = 99;

/// Highest numbered floor below Celestial.
pub const MAX_NUMBERED_FLOOR: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FloorError {
    #[error("Unknown floor: {0}")]
    Unknown(String),
}

/// One of the fixed floors. Ordered 1..=10, then Celestial.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Floor(u8);

impl Floor {
    pub const CELESTIAL: Floor = Floor(CELESTIAL_CODE);

    /// The fixed floor set in presentation order.
    pub fn all() -> Vec<Floor> {
        (1..=MAX_NUMBERED_FLOOR)
            .map(Floor)
            .chain(std::iter::once(Self::CELESTIAL))
            .collect()
    }

    /// Validate a floor code as it appears in replay rows.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=MAX_NUMBERED_FLOOR | CELESTIAL_CODE => Some(Floor(code)),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    /// Position of this floor in [`Floor::all`].
    pub fn position(self) -> usize {
        if self.is_celestial() {
            MAX_NUMBERED_FLOOR as usize
        } else {
            (self.0 - 1) as usize
        }
    }

    pub fn is_celestial(self) -> bool {
        self.0 == CELESTIAL_CODE
    }

    /// Human-readable label for chart titles and pickers.
    pub fn label(self) -> String {
        if self.is_celestial() {
            "Celestial".to_string()
        } else {
            format!("Floor {}", self.0)
        }
    }

    pub fn win_rate_column(self) -> String {
        format!("win_rate_{}", self.0)
    }

    pub fn win_confidence_column(self) -> String {
        format!("win_confidence_{}", self.0)
    }

    pub fn play_rate_column(self) -> String {
        format!("play_rate_{}", self.0)
    }
}

impl FromStr for Floor {
    type Err = FloorError;

    /// Accepts a floor code (`"3"`, `"99"`) or `"celestial"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("celestial") {
            return Ok(Self::CELESTIAL);
        }
        trimmed
            .parse::<u8>()
            .ok()
            .and_then(Floor::from_code)
            .ok_or_else(|| FloorError::Unknown(s.to_string()))
    }
}

impl TryFrom<u8> for Floor {
    type Error = FloorError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Floor::from_code(code).ok_or_else(|| FloorError::Unknown(code.to_string()))
    }
}

impl From<Floor> for u8 {
    fn from(floor: Floor) -> u8 {
        floor.0
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Floor({})", self.0)
    }
}
