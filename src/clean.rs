//! Raw replay rows → cleaned matches.
//!
//! Character codes are resolved against the roster and the redundant
//! `winner` slot indicator is dropped. A row that cannot be resolved is
//! rejected rather than mapped to a wrong character; the batch carries on
//! without it. Nothing here performs I/O.

use thiserror::Error;

use crate::models::{Character, CleanedMatch, Floor, RawMatch};

/// Why a raw row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanError {
    #[error("Invalid character code {code} in column {column}")]
    InvalidCharacterCode { column: &'static str, code: i64 },

    #[error("Unknown floor: {0}")]
    UnknownFloor(i64),
}

/// A rejected row and its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub row: usize,
    pub error: CleanError,
}

/// Output of [`clean`].
#[derive(Debug, Clone, Default)]
pub struct Cleaned {
    pub matches: Vec<CleanedMatch>,
    pub rejected: Vec<Rejected>,
}

fn character(column: &'static str, code: i64) -> Result<Character, CleanError> {
    Character::from_code(code).ok_or(CleanError::InvalidCharacterCode { column, code })
}

/// Clean a single raw row.
pub fn clean_match(raw: &RawMatch) -> Result<CleanedMatch, CleanError> {
    let floor = u8::try_from(raw.floor)
        .ok()
        .and_then(Floor::from_code)
        .ok_or(CleanError::UnknownFloor(raw.floor))?;

    Ok(CleanedMatch {
        floor,
        player_a_char: character("playerACharCode", raw.player_a_char_code)?,
        player_b_char: character("playerBCharCode", raw.player_b_char_code)?,
        winner_char: character("winnerCharCode", raw.winner_char_code)?,
        loser_char: character("loserCharCode", raw.loser_char_code)?,
    })
}

/// Clean every row, dropping the ones that fail.
pub fn clean(rows: &[RawMatch]) -> Cleaned {
    let mut cleaned = Cleaned {
        matches: Vec::with_capacity(rows.len()),
        rejected: Vec::new(),
    };

    for (row, raw) in rows.iter().enumerate() {
        match clean_match(raw) {
            Ok(m) => cleaned.matches.push(m),
            Err(error) => cleaned.rejected.push(Rejected { row, error }),
        }
    }

    cleaned
}
