//! Core data models for floor statistics.

mod floor;
mod matches;
mod roster;
mod stats;
mod table;

pub use floor::*;
pub use matches::*;
pub use roster::*;
pub use stats::*;
pub use table::*;
