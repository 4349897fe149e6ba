//! Filesystem data lake operations.
//!
//! Handles reading and writing to the local data directory:
//! - Raw replay snapshot (`raw/matches.csv`)
//! - Derived tables (`derived/*.csv`)
//!
//! Every write replaces its file atomically, so readers see either the old
//! or the new content and never a partial file.

mod csv;
mod memory;
mod raw;

pub use self::csv::*;
pub use memory::*;
pub use raw::*;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::models::{Table, TableKind};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Table not built yet: {0}")]
    TableMissing(TableKind),

    #[error("Malformed table {kind}: {reason}")]
    Malformed { kind: TableKind, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Read/write access to the derived tables.
///
/// Implementations must replace a table atomically: a concurrent reader gets
/// the previous table or the new one, never a mix.
pub trait TableStore: Send + Sync {
    fn read_table(&self, kind: TableKind) -> Result<Table, StorageError>;

    fn write_table(&self, kind: TableKind, table: &Table) -> Result<(), StorageError>;

    /// Write a batch of tables, each atomically.
    fn write_tables(&self, tables: &[(TableKind, Table)]) -> Result<(), StorageError> {
        for (kind, table) in tables {
            self.write_table(*kind, table)?;
        }
        Ok(())
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join("derived")
    }

    pub fn raw_matches_path(&self) -> PathBuf {
        self.raw_dir().join("matches.csv")
    }

    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        self.derived_dir().join(kind.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Temp file for `file_name`, unique per process so concurrent writers in
/// separate processes never share one.
fn temp_path(parent: &Path, file_name: &str) -> PathBuf {
    parent.join(format!(".{}.{}.tmp", file_name, std::process::id()))
}

/// Replace `path` with `contents` via a temp file and rename in the same
/// directory.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let parent = path
        .parent()
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;

    fs::create_dir_all(parent)?;

    let tmp_path = temp_path(parent, file_name);
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    debug!("Wrote {} bytes to {:?}", contents.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Floor;
    use tempfile::TempDir;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.raw_dir(), PathBuf::from("/data/raw"));
        assert_eq!(config.derived_dir(), PathBuf::from("/data/derived"));
        assert_eq!(
            config.raw_matches_path(),
            PathBuf::from("/data/raw/matches.csv")
        );
        assert_eq!(
            config.table_path(TableKind::Matchups(Floor::CELESTIAL)),
            PathBuf::from("/data/derived/match_ups_99.csv")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_write_atomic_replaces_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("file.csv");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("file.csv")]);
    }

    #[test]
    fn test_temp_path_is_per_process() {
        let tmp = temp_path(Path::new("/data/derived"), "win_rates.csv");
        assert_eq!(
            tmp,
            PathBuf::from(format!(
                "/data/derived/.win_rates.csv.{}.tmp",
                std::process::id()
            ))
        );
    }

    #[test]
    fn test_write_atomic_leaves_other_writers_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.csv");
        let foreign = temp_dir.path().join(".file.csv.4294967295.tmp");
        fs::write(&foreign, b"in flight").unwrap();

        write_atomic(&path, b"ours").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"ours");
        assert_eq!(fs::read(&foreign).unwrap(), b"in flight");
    }
}
