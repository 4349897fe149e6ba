//! # Floor Stats
//!
//! Per-floor character statistics for Guilty Gear Strive replays.
//!
//! ## Architecture
//!
//! - **models**: Roster, floors, replay rows and derived tables
//! - **fetch**: Upstream replay snapshot (GitHub gist)
//! - **ingest**: Snapshot CSV parsing
//! - **clean**: Code-to-name translation and row validation
//! - **calculate**: Win rate, play rate and matchup aggregation
//! - **storage**: Raw snapshot and derived table persistence
//! - **query**: Per-floor reads for the dashboard
//! - **refresh**: Fetch-to-tables pipeline and its background worker
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod clean;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod query;
pub mod refresh;
pub mod storage;

pub use models::*;
