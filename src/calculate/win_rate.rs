//! Per-floor win rates with a Wald confidence half-width.

use crate::models::{Character, CleanedMatch, Floor, Table};

use super::Tally;

/// Two-tailed z-score for a 99% interval.
pub const Z_99: f64 = 2.58;

/// A win rate and its 99% confidence half-width.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WinRate {
    pub rate: f64,
    pub confidence: f64,
}

/// Calculate win rate and confidence from wins/losses.
///
/// With no games both values are 0 rather than undefined.
pub fn calculate_win_rate(wins: u64, losses: u64) -> WinRate {
    let games = wins + losses;
    if games == 0 {
        return WinRate::default();
    }

    let rate = wins as f64 / games as f64;
    WinRate {
        rate,
        confidence: Z_99 * (rate * (1.0 - rate) / games as f64).sqrt(),
    }
}

/// Columns: `win_rate_{f}`, `win_confidence_{f}` for each floor.
pub fn win_rate_columns() -> Vec<String> {
    Floor::all()
        .into_iter()
        .flat_map(|f| [f.win_rate_column(), f.win_confidence_column()])
        .collect()
}

pub(super) fn win_rate_table(tally: &Tally) -> Table {
    let floors = Floor::all();
    let mut table = Table::new(win_rate_columns());

    for character in Character::all() {
        let idx = character.index();
        let values = floors
            .iter()
            .flat_map(|&f| {
                let counts = tally.floor(f);
                let wr = calculate_win_rate(counts.wins[idx], counts.losses[idx]);
                [wr.rate, wr.confidence]
            })
            .collect();
        table.push_row(character.name(), values);
    }

    table
}

/// Build the win-rate table from cleaned matches.
pub fn build_win_rate_table(matches: &[CleanedMatch]) -> Table {
    win_rate_table(&Tally::from_matches(matches))
}
