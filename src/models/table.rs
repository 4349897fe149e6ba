//! Flat labeled tables shared by the aggregator, the table store and the
//! query layer.
//!
//! A table has one key column (`char_name`) and any number of named numeric
//! columns. This is the persisted contract: the writer decides the column
//! names, the reader selects by name.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Floor;

/// Name of the key column in every table.
pub const KEY_COLUMN: &str = "char_name";

/// Which derived table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    WinRates,
    PlayRates,
    Matchups(Floor),
}

impl TableKind {
    /// Every table a full refresh produces.
    pub fn all() -> Vec<TableKind> {
        let mut kinds = vec![TableKind::WinRates, TableKind::PlayRates];
        kinds.extend(Floor::all().into_iter().map(TableKind::Matchups));
        kinds
    }

    /// File name under the derived directory.
    pub fn filename(&self) -> String {
        match self {
            TableKind::WinRates => "win_rates.csv".to_string(),
            TableKind::PlayRates => "play_rates.csv".to_string(),
            TableKind::Matchups(floor) => format!("match_ups_{}.csv", floor),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::WinRates => write!(f, "win rates"),
            TableKind::PlayRates => write!(f, "play rates"),
            TableKind::Matchups(floor) => write!(f, "matchups (floor {})", floor),
        }
    }
}

/// One keyed row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The value count must match the column count.
    pub fn push_row(&mut self, key: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.rows.push(TableRow {
            key: key.into(),
            values,
        });
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// `(key, value)` pairs of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<(&str, f64)>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| (r.key.as_str(), r.values.get(idx).copied().unwrap_or(0.0)))
                .collect(),
        )
    }

    pub fn row(&self, key: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Value at (row key, column name).
    pub fn get(&self, key: &str, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.row(key)?.values.get(idx).copied()
    }
}
