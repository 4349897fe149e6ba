//! Per-floor reads from the table store.
//!
//! Win and play rates come back sorted ascending by rate (ties keep roster
//! order); the bar and pie charts consume them in that order. Matchups come
//! back as the full matrix in roster order.

use std::cmp::Ordering;

use thiserror::Error;

use crate::models::{
    Floor, FloorError, MatchupMatrix, PlayRateEntry, TableKind, WinRateEntry,
};
use crate::storage::{StorageError, TableStore};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown floor: {0}")]
    UnknownFloor(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<FloorError> for QueryError {
    fn from(err: FloorError) -> Self {
        match err {
            FloorError::Unknown(floor) => QueryError::UnknownFloor(floor),
        }
    }
}

fn missing_column(kind: TableKind, column: &str) -> QueryError {
    QueryError::Storage(StorageError::Malformed {
        kind,
        reason: format!("missing column {}", column),
    })
}

fn ascending(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Win rates (with confidence) for one floor, ascending by win rate.
pub fn query_win_rates(
    store: &dyn TableStore,
    floor: &str,
) -> Result<Vec<WinRateEntry>, QueryError> {
    let floor: Floor = floor.parse()?;
    let kind = TableKind::WinRates;
    let table = store.read_table(kind)?;

    let rate_col = floor.win_rate_column();
    let conf_col = floor.win_confidence_column();
    let rate_idx = table
        .column_index(&rate_col)
        .ok_or_else(|| missing_column(kind, &rate_col))?;
    let conf_idx = table
        .column_index(&conf_col)
        .ok_or_else(|| missing_column(kind, &conf_col))?;

    let mut entries: Vec<WinRateEntry> = table
        .rows
        .iter()
        .map(|row| WinRateEntry {
            character: row.key.clone(),
            win_rate: row.values[rate_idx],
            confidence: row.values[conf_idx],
        })
        .collect();
    entries.sort_by(|a, b| ascending(a.win_rate, b.win_rate));

    Ok(entries)
}

/// Play rates for one floor, ascending by play rate.
pub fn query_play_rates(
    store: &dyn TableStore,
    floor: &str,
) -> Result<Vec<PlayRateEntry>, QueryError> {
    let floor: Floor = floor.parse()?;
    let kind = TableKind::PlayRates;
    let table = store.read_table(kind)?;

    let col = floor.play_rate_column();
    let mut entries: Vec<PlayRateEntry> = table
        .column(&col)
        .ok_or_else(|| missing_column(kind, &col))?
        .into_iter()
        .map(|(character, play_rate)| PlayRateEntry {
            character: character.to_string(),
            play_rate,
        })
        .collect();
    entries.sort_by(|a, b| ascending(a.play_rate, b.play_rate));

    Ok(entries)
}

/// The matchup matrix for one floor, both axes in roster order.
pub fn query_matchups(store: &dyn TableStore, floor: &str) -> Result<MatchupMatrix, QueryError> {
    let floor: Floor = floor.parse()?;
    let table = store.read_table(TableKind::Matchups(floor))?;

    Ok(MatchupMatrix {
        characters: table.columns,
        cells: table.rows.into_iter().map(|r| r.values).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::aggregate;
    use crate::models::{Character, CleanedMatch};
    use crate::storage::MemoryTableStore;
    use pretty_assertions::assert_eq;

    fn win(f: u8, winner: &str, loser: &str) -> CleanedMatch {
        CleanedMatch::won(
            Floor::from_code(f).unwrap(),
            Character::from_name(winner).unwrap(),
            Character::from_name(loser).unwrap(),
        )
    }

    fn store_with(matches: &[CleanedMatch]) -> MemoryTableStore {
        let store = MemoryTableStore::new();
        store.write_tables(&aggregate(matches).into_batch()).unwrap();
        store
    }

    fn example_store() -> MemoryTableStore {
        store_with(&[
            win(3, "Sol", "Ky"),
            win(3, "Sol", "Ky"),
            win(3, "Ky", "Sol"),
            win(3, "May", "Ky"),
        ])
    }

    #[test]
    fn test_win_rates_sorted_ascending() {
        let store = example_store();
        let entries = query_win_rates(&store, "3").unwrap();

        assert_eq!(entries.len(), Character::COUNT);
        assert!(entries.windows(2).all(|w| w[0].win_rate <= w[1].win_rate));

        let last: Vec<&str> = entries[entries.len() - 3..]
            .iter()
            .map(|e| e.character.as_str())
            .collect();
        assert_eq!(last, vec!["Ky", "Sol", "May"]);
        assert!((entries[entries.len() - 2].win_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_win_rates_ties_keep_roster_order() {
        let store = example_store();
        let entries = query_win_rates(&store, "3").unwrap();

        // Unplayed characters all tie at 0 and stay in roster order
        let zeros: Vec<&str> = entries
            .iter()
            .filter(|e| e.win_rate == 0.0)
            .map(|e| e.character.as_str())
            .collect();
        assert_eq!(zeros[0], "Axl");
        assert_eq!(zeros[1], "Chipp");
    }

    #[test]
    fn test_win_rates_include_confidence() {
        let store = example_store();
        let entries = query_win_rates(&store, "3").unwrap();
        let may = entries.iter().find(|e| e.character == "May").unwrap();

        assert_eq!(may.win_rate, 1.0);
        assert_eq!(may.confidence, 0.0);
    }

    #[test]
    fn test_play_rates_sorted_ascending() {
        let store = example_store();
        let entries = query_play_rates(&store, "3").unwrap();

        assert!(entries.windows(2).all(|w| w[0].play_rate <= w[1].play_rate));
        let top = entries.last().unwrap();
        assert_eq!(top.character, "Ky");
        assert_eq!(top.play_rate, 0.5);
    }

    #[test]
    fn test_celestial_by_name() {
        let store = store_with(&[win(99, "Baiken", "Testament")]);
        let entries = query_play_rates(&store, "celestial").unwrap();
        assert_eq!(entries.last().unwrap().play_rate, 0.5);
    }

    #[test]
    fn test_matchups_in_roster_order() {
        let store = example_store();
        let matrix = query_matchups(&store, "3").unwrap();

        let roster: Vec<String> = Character::all().map(|c| c.name().to_string()).collect();
        assert_eq!(matrix.characters, roster);
        assert_eq!(matrix.cells.len(), Character::COUNT);
        assert!((matrix.get("Sol", "Ky").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((matrix.get("Ky", "Sol").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(matrix.get("Sol", "Sol"), Some(0.0));
    }

    #[test]
    fn test_unknown_floor() {
        let store = example_store();

        assert!(matches!(
            query_win_rates(&store, "999"),
            Err(QueryError::UnknownFloor(f)) if f == "999"
        ));
        assert!(matches!(
            query_play_rates(&store, "0"),
            Err(QueryError::UnknownFloor(_))
        ));
        assert!(matches!(
            query_matchups(&store, "heaven"),
            Err(QueryError::UnknownFloor(_))
        ));
    }

    #[test]
    fn test_tables_not_built() {
        let store = MemoryTableStore::new();
        assert!(matches!(
            query_win_rates(&store, "1"),
            Err(QueryError::Storage(StorageError::TableMissing(_)))
        ));
    }
}
