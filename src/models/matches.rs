//! Match records, raw and cleaned.

use serde::{Deserialize, Serialize};

use super::{Character, Floor};

/// One row of the replay feed, as published.
///
/// Only the columns used for aggregation are kept; the feed carries more
/// (timestamps, player ids) which are ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    pub floor: i64,

    #[serde(rename = "playerACharCode")]
    pub player_a_char_code: i64,

    #[serde(rename = "playerBCharCode")]
    pub player_b_char_code: i64,

    /// Which player slot won. Redundant with the winner/loser codes.
    #[serde(default)]
    pub winner: Option<String>,

    #[serde(rename = "winnerCharCode")]
    pub winner_char_code: i64,

    #[serde(rename = "loserCharCode")]
    pub loser_char_code: i64,
}

/// A match with character codes resolved against the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedMatch {
    pub floor: Floor,

    #[serde(rename = "playerAChar")]
    pub player_a_char: Character,

    #[serde(rename = "playerBChar")]
    pub player_b_char: Character,

    #[serde(rename = "winnerChar")]
    pub winner_char: Character,

    #[serde(rename = "loserChar")]
    pub loser_char: Character,
}

impl CleanedMatch {
    /// Build a match where `winner` beat `loser` on `floor`, with the winner in
    /// the A slot.
    pub fn won(floor: Floor, winner: Character, loser: Character) -> Self {
        Self {
            floor,
            player_a_char: winner,
            player_b_char: loser,
            winner_char: winner,
            loser_char: loser,
        }
    }
}
