//! Per-floor play rates.

use crate::models::{Character, CleanedMatch, Floor, Table};

use super::Tally;

/// Share of appearances. Every match has two player slots.
pub fn calculate_play_rate(appearances: u64, matches: u64) -> f64 {
    if appearances == 0 {
        0.0
    } else {
        appearances as f64 / (2 * matches) as f64
    }
}

pub fn play_rate_columns() -> Vec<String> {
    Floor::all()
        .into_iter()
        .map(Floor::play_rate_column)
        .collect()
}

pub(super) fn play_rate_table(tally: &Tally) -> Table {
    let floors = Floor::all();
    let mut table = Table::new(play_rate_columns());

    for character in Character::all() {
        let values = floors
            .iter()
            .map(|&f| {
                let counts = tally.floor(f);
                calculate_play_rate(counts.appearances[character.index()], counts.matches)
            })
            .collect();
        table.push_row(character.name(), values);
    }

    table
}

/// Build the play-rate table from cleaned matches.
pub fn build_play_rate_table(matches: &[CleanedMatch]) -> Table {
    play_rate_table(&Tally::from_matches(matches))
}
