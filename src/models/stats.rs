//! Per-floor statistics as returned by the query layer.

use serde::{Deserialize, Serialize};

/// A character's win rate on one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRateEntry {
    pub character: String,

    /// Win rate (0.0 to 1.0)
    pub win_rate: f64,

    /// 99% confidence half-width of `win_rate`
    pub confidence: f64,
}

/// A character's share of appearances on one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRateEntry {
    pub character: String,

    /// Play rate (0.0 to 1.0)
    pub play_rate: f64,
}

/// Head-to-head win rates for one floor.
///
/// `cells[i][j]` is the win rate of `characters[i]` against `characters[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupMatrix {
    pub characters: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

impl MatchupMatrix {
    /// Win rate of `row` against `col`, by name.
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.characters.iter().position(|c| c == row)?;
        let j = self.characters.iter().position(|c| c == col)?;
        self.cells.get(i)?.get(j).copied()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
