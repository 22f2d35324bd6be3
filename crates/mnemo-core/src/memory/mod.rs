//! Memory Module
//!
//! The per-item data model:
//! - [`MemoryState`]: persisted scheduling state of one item
//! - [`Rating`] and [`ItemState`]: closed enums for grades and lifecycle
//! - [`ReviewLogEntry`] and [`ReviewHistory`]: the append-only review log

mod log;
mod state;

pub use log::{HistoryError, ReviewHistory, ReviewLogEntry, ReviewOutcome};
pub use state::{Corruption, DEFAULT_DIFFICULTY, ItemState, MemoryState, Rating, days_between};
