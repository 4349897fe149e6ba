//! Head-to-head matchup matrices.
//!
//! Cell (A, B) is A's win rate in matches between exactly A and B. Mirror
//! matches are left out: the diagonal is always 0.

use crate::models::{Character, CleanedMatch, Floor, Table};

use super::{FloorCounts, Tally};

/// `wins / (wins + losses)`, or 0 when the pair never met.
pub fn calculate_matchup(wins: u64, losses: u64) -> f64 {
    let games = wins + losses;
    if games == 0 {
        0.0
    } else {
        wins as f64 / games as f64
    }
}

/// One column per roster character, in roster order.
pub fn matchup_columns() -> Vec<String> {
    Character::all().map(|c| c.name().to_string()).collect()
}

pub(super) fn matchup_table(counts: &FloorCounts) -> Table {
    let mut table = Table::new(matchup_columns());

    for row in Character::all() {
        let values = Character::all()
            .map(|col| {
                if row == col {
                    0.0
                } else {
                    calculate_matchup(counts.beat(row, col), counts.beat(col, row))
                }
            })
            .collect();
        table.push_row(row.name(), values);
    }

    table
}

/// Build one matchup table per floor from cleaned matches.
pub fn build_matchup_tables(matches: &[CleanedMatch]) -> Vec<(Floor, Table)> {
    let tally = Tally::from_matches(matches);
    Floor::all()
        .into_iter()
        .map(|floor| (floor, matchup_table(tally.floor(floor))))
        .collect()
}
