//! Refresh pipeline and its single-slot background worker.
//!
//! A refresh fetches the newest upstream snapshot, stores it, cleans and
//! aggregates it, and replaces every derived table. Nothing is written until
//! the snapshot has been fetched, parsed and cleaned, and a snapshot without a
//! single usable row is refused, so an upstream failure leaves the previous
//! raw file and tables in place. At most one refresh runs at a time; a
//! trigger that arrives while one is running is coalesced into it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::calculate::aggregate;
use crate::clean::clean;
use crate::fetch::{FetchError, MatchSource};
use crate::ingest::{parse_matches, IngestError};
use crate::storage::{RawMatchStore, StorageError, TableStore};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    #[error("Upstream snapshot malformed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Snapshot has no valid matches ({rejected} rows rejected)")]
    NoValidMatches { rejected: usize },

    #[error("No raw snapshot stored yet")]
    NoSnapshot,

    #[error("A refresh is already running")]
    InProgress,

    #[error("Refresh task failed: {0}")]
    Task(String),
}

// ── Shared secret ────────────────────────────────────────────────

/// SHA-256 digest of the shared refresh secret.
#[derive(Clone)]
pub struct RefreshKey {
    digest: Option<[u8; 32]>,
}

impl RefreshKey {
    /// A key that accepts nothing.
    pub fn disabled() -> Self {
        Self { digest: None }
    }

    /// Build from a hex digest. An empty string disables the trigger.
    pub fn from_hex(hex_digest: &str) -> Result<Self, hex::FromHexError> {
        let hex_digest = hex_digest.trim();
        if hex_digest.is_empty() {
            return Ok(Self::disabled());
        }
        let bytes = hex::decode(hex_digest)?;
        let digest =
            <[u8; 32]>::try_from(bytes).map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self {
            digest: Some(digest),
        })
    }

    pub fn from_secret(secret: &str) -> Self {
        Self {
            digest: Some(Sha256::digest(secret.as_bytes()).into()),
        }
    }

    /// Hex digest to put in the config for `secret`.
    pub fn hash_secret(secret: &str) -> String {
        hex::encode(Sha256::digest(secret.as_bytes()))
    }

    pub fn is_enabled(&self) -> bool {
        self.digest.is_some()
    }

    /// Check a candidate secret. Digests are compared in constant time.
    pub fn verify(&self, candidate: &str) -> bool {
        let Some(expected) = &self.digest else {
            return false;
        };
        let actual: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for RefreshKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshKey")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

// ── Pipeline ─────────────────────────────────────────────────────

/// What one refresh did.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Rows read from the snapshot
    pub rows_read: usize,
    /// Rows the CSV reader could not deserialize
    pub malformed_rows: usize,
    /// Rows dropped by the cleaner (bad character code or floor)
    pub rejected_rows: usize,
    pub matches_aggregated: usize,
    pub tables_written: usize,
}

/// Parse, clean, aggregate and persist one snapshot.
///
/// `raw` is given when the snapshot is new and should replace the stored one.
/// A snapshot with no usable rows is refused before anything is written.
pub fn build_tables(
    csv_text: &str,
    raw: Option<&RawMatchStore>,
    tables: &dyn TableStore,
) -> Result<RefreshSummary, RefreshError> {
    let started_at = Utc::now();

    let parsed = parse_matches(csv_text)?;
    info!(
        "Parsed {} replay rows ({} malformed)",
        parsed.matches.len(),
        parsed.malformed.len()
    );

    let cleaned = clean(&parsed.matches);
    if !cleaned.rejected.is_empty() {
        warn!("Dropped {} rows during cleaning", cleaned.rejected.len());
        for rejected in &cleaned.rejected {
            debug!("Dropped row {}: {}", rejected.row + 1, rejected.error);
        }
    }
    if cleaned.matches.is_empty() && !cleaned.rejected.is_empty() {
        return Err(RefreshError::NoValidMatches {
            rejected: cleaned.rejected.len(),
        });
    }

    if let Some(raw) = raw {
        raw.save(csv_text)?;
    }

    let batch = aggregate(&cleaned.matches).into_batch();
    let tables_written = batch.len();
    tables.write_tables(&batch)?;

    Ok(RefreshSummary {
        started_at,
        finished_at: Utc::now(),
        rows_read: parsed.matches.len(),
        malformed_rows: parsed.malformed.len(),
        rejected_rows: cleaned.rejected.len(),
        matches_aggregated: cleaned.matches.len(),
        tables_written,
    })
}

// ── Worker ───────────────────────────────────────────────────────

/// Outcome of [`RefreshWorker::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Started,
    /// A refresh was already running; this trigger folds into it.
    Coalesced,
}

/// Clears the running flag when dropped.
struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RefreshWorker {
    source: Arc<dyn MatchSource>,
    raw: RawMatchStore,
    tables: Arc<dyn TableStore>,
    running: AtomicBool,
}

impl RefreshWorker {
    pub fn new(
        source: Arc<dyn MatchSource>,
        raw: RawMatchStore,
        tables: Arc<dyn TableStore>,
    ) -> Self {
        Self {
            source,
            raw,
            tables,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_claim(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Start a refresh in the background unless one is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(self: &Arc<Self>) -> Submitted {
        if !self.try_claim() {
            info!("Refresh already running, coalescing trigger");
            return Submitted::Coalesced;
        }

        let worker = Arc::clone(self);
        tokio::spawn(async move {
            let _flag = RunningFlag(&worker.running);
            match worker.run_pipeline().await {
                Ok(summary) => info!(
                    "Refresh complete: {} matches aggregated, {} tables written",
                    summary.matches_aggregated, summary.tables_written
                ),
                Err(e) => error!("Refresh failed: {}", e),
            }
        });

        Submitted::Started
    }

    /// Run a refresh to completion on the current task.
    pub async fn run_once(&self) -> Result<RefreshSummary, RefreshError> {
        if !self.try_claim() {
            return Err(RefreshError::InProgress);
        }
        let _flag = RunningFlag(&self.running);
        self.run_pipeline().await
    }

    /// Recompute the tables from the stored raw snapshot, without fetching.
    pub async fn rebuild_from_raw(&self) -> Result<RefreshSummary, RefreshError> {
        if !self.try_claim() {
            return Err(RefreshError::InProgress);
        }
        let _flag = RunningFlag(&self.running);

        let raw = self.raw.clone();
        let tables = Arc::clone(&self.tables);
        tokio::task::spawn_blocking(move || {
            let snapshot = raw.load()?.ok_or(RefreshError::NoSnapshot)?;
            build_tables(&snapshot, None, tables.as_ref())
        })
        .await
        .map_err(|e| RefreshError::Task(e.to_string()))?
    }

    async fn run_pipeline(&self) -> Result<RefreshSummary, RefreshError> {
        let started_at = Utc::now();
        info!("Fetching latest replay snapshot");
        let snapshot = self.source.latest_snapshot().await?;

        let raw = self.raw.clone();
        let tables = Arc::clone(&self.tables);
        let mut summary =
            tokio::task::spawn_blocking(move || build_tables(&snapshot, Some(&raw), tables.as_ref()))
                .await
                .map_err(|e| RefreshError::Task(e.to_string()))??;

        summary.started_at = started_at;
        Ok(summary)
    }
}
