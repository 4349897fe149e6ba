//! Raw replay snapshot storage.
//!
//! The most recent upstream snapshot is kept verbatim so the derived tables
//! can be rebuilt without going back to the network.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::info;

use super::{write_atomic, StorageConfig, StorageError};

#[derive(Debug, Clone)]
pub struct RawMatchStore {
    path: PathBuf,
}

impl RawMatchStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.raw_matches_path(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Replace the stored snapshot.
    pub fn save(&self, csv_text: &str) -> Result<(), StorageError> {
        write_atomic(&self.path, csv_text.as_bytes())?;
        info!("Saved raw snapshot ({} bytes) to {:?}", csv_text.len(), self.path);
        Ok(())
    }

    /// Load the stored snapshot, `None` if nothing has been fetched yet.
    pub fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
