//! CSV table storage.
//!
//! One file per table under the derived directory. The first column is the
//! `char_name` key, the rest are numeric. Floats are written in shortest
//! round-trip form, so the same table always produces the same bytes.

use std::fs;
use std::io::ErrorKind;

use tracing::info;

use super::{write_atomic, StorageConfig, StorageError, TableStore};
use crate::models::{Table, TableKind, KEY_COLUMN};

/// Serialize a table to CSV bytes.
pub fn table_to_csv(table: &Table) -> Result<Vec<u8>, StorageError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push(KEY_COLUMN);
    header.extend(table.columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.key.clone());
        record.extend(row.values.iter().map(f64::to_string));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))
}

/// Parse a table written by [`table_to_csv`].
pub fn table_from_csv(kind: TableKind, bytes: &[u8]) -> Result<Table, StorageError> {
    let malformed = |reason: String| StorageError::Malformed { kind, reason };

    let mut reader = ::csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();

    let mut fields = headers.iter();
    match fields.next() {
        Some(KEY_COLUMN) => {}
        other => {
            return Err(malformed(format!(
                "expected first column {:?}, found {:?}",
                KEY_COLUMN, other
            )))
        }
    }
    let mut table = Table::new(fields.map(str::to_string).collect());

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let mut fields = record.iter();
        let key = fields
            .next()
            .ok_or_else(|| malformed(format!("row {} has no key", line + 1)))?;
        let values = fields
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|e| malformed(format!("row {} value {:?}: {}", line + 1, v, e)))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        if values.len() != table.columns.len() {
            return Err(malformed(format!(
                "row {} has {} values for {} columns",
                line + 1,
                values.len(),
                table.columns.len()
            )));
        }
        table.push_row(key, values);
    }

    Ok(table)
}

/// Table store backed by CSV files in the data directory.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    config: StorageConfig,
}

impl CsvTableStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl TableStore for CsvTableStore {
    fn read_table(&self, kind: TableKind) -> Result<Table, StorageError> {
        let path = self.config.table_path(kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::TableMissing(kind))
            }
            Err(e) => return Err(e.into()),
        };
        table_from_csv(kind, &bytes)
    }

    fn write_table(&self, kind: TableKind, table: &Table) -> Result<(), StorageError> {
        let bytes = table_to_csv(table)?;
        write_atomic(&self.config.table_path(kind), &bytes)
    }

    fn write_tables(&self, tables: &[(TableKind, Table)]) -> Result<(), StorageError> {
        // Serialize everything first so a bad table aborts before any file moves.
        let encoded = tables
            .iter()
            .map(|(kind, table)| Ok((*kind, table_to_csv(table)?)))
            .collect::<Result<Vec<_>, StorageError>>()?;

        for (kind, bytes) in &encoded {
            write_atomic(&self.config.table_path(*kind), bytes)?;
        }

        info!(
            "Wrote {} tables to {:?}",
            encoded.len(),
            self.config.derived_dir()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Floor;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> Table {
        let mut table = Table::new(vec!["win_rate_1".to_string(), "win_confidence_1".to_string()]);
        table.push_row("Sol", vec![2.0 / 3.0, 0.1]);
        table.push_row("Happy Chaos", vec![0.0, 0.0]);
        table.push_row("Zato-1", vec![1.0, 0.0]);
        table
    }

    #[test]
    fn test_csv_layout() {
        let csv = String::from_utf8(table_to_csv(&sample()).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "char_name,win_rate_1,win_confidence_1");
        assert_eq!(lines[1], "Sol,0.6666666666666666,0.1");
        assert_eq!(lines[2], "Happy Chaos,0,0");
        assert_eq!(lines[3], "Zato-1,1,0");
    }

    #[test]
    fn test_csv_read_back() {
        let bytes = table_to_csv(&sample()).unwrap();
        let table = table_from_csv(TableKind::WinRates, &bytes).unwrap();
        assert_eq!(table, sample());
    }

    #[test]
    fn test_csv_rejects_wrong_key_column() {
        let err = table_from_csv(TableKind::PlayRates, b"name,play_rate_1\nSol,0.5\n").unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[test]
    fn test_csv_rejects_bad_number() {
        let err =
            table_from_csv(TableKind::PlayRates, b"char_name,play_rate_1\nSol,abc\n").unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[test]
    fn test_store_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvTableStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));
        let kind = TableKind::Matchups(Floor::CELESTIAL);

        store.write_table(kind, &sample()).unwrap();

        assert!(temp_dir.path().join("derived/match_ups_99.csv").exists());
        assert_eq!(store.read_table(kind).unwrap(), sample());
    }

    #[test]
    fn test_store_missing_table() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvTableStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));

        let err = store.read_table(TableKind::WinRates).unwrap_err();
        assert!(matches!(err, StorageError::TableMissing(TableKind::WinRates)));
    }

    #[test]
    fn test_store_overwrite_replaces_fully() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvTableStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));

        store.write_table(TableKind::WinRates, &sample()).unwrap();
        let mut smaller = Table::new(vec!["win_rate_1".to_string()]);
        smaller.push_row("Ky", vec![0.5]);
        store
            .write_tables(&[(TableKind::WinRates, smaller.clone())])
            .unwrap();

        assert_eq!(store.read_table(TableKind::WinRates).unwrap(), smaller);
    }
}
