//! Statistics calculation engine.
//!
//! Turns cleaned matches into the derived tables:
//! - Win rates with 99% confidence half-widths, per floor
//! - Play rates (share of character appearances), per floor
//! - Head-to-head matchup matrices, one per floor
//!
//! Matches are tallied once per floor, then each table is read off the tally.
//! Every table always has a row for every roster character and a column for
//! every floor, zero-filled where there is no data.

mod matchup;
mod play_rate;
mod win_rate;

pub use matchup::*;
pub use play_rate::*;
pub use win_rate::*;

use crate::models::{Character, CleanedMatch, Floor, Table, TableKind};

/// Raw counts for one floor.
#[derive(Debug, Clone)]
pub struct FloorCounts {
    /// Matches played on the floor
    pub matches: u64,
    pub wins: Vec<u64>,
    pub losses: Vec<u64>,
    /// Times a character occupied either player slot
    pub appearances: Vec<u64>,
    /// `head_to_head[w * COUNT + l]` = times `w` beat `l`
    head_to_head: Vec<u64>,
}

impl Default for FloorCounts {
    fn default() -> Self {
        Self {
            matches: 0,
            wins: vec![0; Character::COUNT],
            losses: vec![0; Character::COUNT],
            appearances: vec![0; Character::COUNT],
            head_to_head: vec![0; Character::COUNT * Character::COUNT],
        }
    }
}

impl FloorCounts {
    fn record(&mut self, m: &CleanedMatch) {
        self.matches += 1;
        self.wins[m.winner_char.index()] += 1;
        self.losses[m.loser_char.index()] += 1;
        self.appearances[m.player_a_char.index()] += 1;
        self.appearances[m.player_b_char.index()] += 1;
        self.head_to_head[m.winner_char.index() * Character::COUNT + m.loser_char.index()] += 1;
    }

    /// Times `winner` beat `loser`.
    pub fn beat(&self, winner: Character, loser: Character) -> u64 {
        self.head_to_head[winner.index() * Character::COUNT + loser.index()]
    }
}

/// Counts for every floor, indexed by [`Floor::position`].
#[derive(Debug, Clone)]
pub struct Tally {
    floors: Vec<FloorCounts>,
}

impl Tally {
    pub fn from_matches(matches: &[CleanedMatch]) -> Self {
        let mut floors = vec![FloorCounts::default(); Floor::all().len()];
        for m in matches {
            floors[m.floor.position()].record(m);
        }
        Self { floors }
    }

    pub fn floor(&self, floor: Floor) -> &FloorCounts {
        &self.floors[floor.position()]
    }

    /// Total matches across all floors.
    pub fn total_matches(&self) -> u64 {
        self.floors.iter().map(|f| f.matches).sum()
    }
}

/// The full set of derived tables produced by one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTables {
    pub win_rates: Table,
    pub play_rates: Table,
    pub matchups: Vec<(Floor, Table)>,
}

impl AggregateTables {
    /// Flatten into store writes, in [`TableKind::all`] order.
    pub fn into_batch(self) -> Vec<(TableKind, Table)> {
        let mut batch = vec![
            (TableKind::WinRates, self.win_rates),
            (TableKind::PlayRates, self.play_rates),
        ];
        batch.extend(
            self.matchups
                .into_iter()
                .map(|(floor, table)| (TableKind::Matchups(floor), table)),
        );
        batch
    }
}

/// Compute all derived tables from cleaned matches.
pub fn aggregate(matches: &[CleanedMatch]) -> AggregateTables {
    let tally = Tally::from_matches(matches);
    AggregateTables {
        win_rates: win_rate_table(&tally),
        play_rates: play_rate_table(&tally),
        matchups: Floor::all()
            .into_iter()
            .map(|floor| (floor, matchup_table(tally.floor(floor))))
            .collect(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{Character, CleanedMatch, Floor};

    pub fn ch(name: &str) -> Character {
        Character::from_name(name).unwrap()
    }

    pub fn floor(code: u8) -> Floor {
        Floor::from_code(code).unwrap()
    }

    /// `winner` beat `loser` on floor `f`.
    pub fn win(f: u8, winner: &str, loser: &str) -> CleanedMatch {
        CleanedMatch::won(floor(f), ch(winner), ch(loser))
    }
}
