//! # Mnemo Core
//!
//! FSRS-6 spaced repetition scheduling as a pure library: a memory state and a
//! graded review go in, the next memory state and a log entry come out.
//!
//! - **Parameters**: 21 validated weights with all-or-nothing fallback to the defaults
//! - **Memory model**: power-law forgetting curve, stability/difficulty updates,
//!   same-day review handling
//! - **Intervals**: retention-targeted, clamped, deterministically fuzzed
//! - **State machine**: New → Learning → Review ⇄ Relearning with learning steps
//! - **Curves**: predicted vs. actual retrievability for reporting
//! - **Batch**: rayon-parallel snapshots and curve projection across many items
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use mnemo_core::{FSRSScheduler, MemoryStore, Rating, ReviewOutcome, ReviewStore};
//!
//! let scheduler = FSRSScheduler::default();
//! let store = MemoryStore::new();
//!
//! let id = store.create_item(Utc::now())?;
//! let state = store.mark_reviewed(&scheduler, &id, ReviewOutcome::new(Rating::Good, Utc::now()))?;
//! println!("next review at {}", state.due);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod batch;
pub mod config;
pub mod fsrs;
pub mod memory;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{
    Corruption, HistoryError, ItemState, MemoryState, Rating, ReviewHistory, ReviewLogEntry,
    ReviewOutcome,
};

// FSRS-6 algorithm
pub use fsrs::{
    CurvePoint,
    CurveWindow,
    FSRS6_WEIGHTS,
    FSRSScheduler,
    IntervalScheduler,
    MemoryCurve,
    ParameterStore,
    Parameters,
    PreviewResults,
    ReviewResult,
    ValidationResult,
    initial_difficulty,
    initial_stability,
    next_interval,
    project_curve,
    // Core functions for advanced usage
    retrievability,
};

// Configuration
pub use config::{ConfigError, SchedulerConfig};

// Storage port
pub use storage::{MemoryStore, Result, ReviewStore, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm version (6 = 21 parameters)
pub const FSRS_VERSION: u8 = 6;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CurveWindow, FSRSScheduler, ItemState, MemoryState, MemoryStore, Rating, ReviewHistory,
        ReviewOutcome, ReviewStore, SchedulerConfig, StorageError, project_curve,
    };
}
