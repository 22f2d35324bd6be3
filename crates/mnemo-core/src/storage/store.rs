//! Review store port and its in-memory implementation

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::fsrs::FSRSScheduler;
use crate::memory::{HistoryError, MemoryState, ReviewHistory, ReviewLogEntry, ReviewOutcome};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A lock guarding the store was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    LockPoisoned(String),
    /// Log entry rejected by the item's history
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// PORT
// ============================================================================

/// Persistence port for memory states and review logs.
///
/// Implementations must make each single-item write atomic; nothing is
/// assumed about consistency across items.
pub trait ReviewStore {
    /// Current state of `id`
    fn load(&self, id: &str) -> Result<MemoryState>;

    /// Replace the stored state of `id`
    fn save(&self, id: &str, state: &MemoryState) -> Result<()>;

    /// Append one entry to the history of `id`
    fn append_log(&self, id: &str, entry: ReviewLogEntry) -> Result<()>;

    /// Full review history of `id`
    fn history(&self, id: &str) -> Result<ReviewHistory>;

    /// Load, review, then persist the log entry and the new state.
    ///
    /// The default makes two separate writes. If `save` fails after `append_log`
    /// succeeded, the history ends with an entry whose resulting state was never
    /// stored, and the next review of the item starts from the older state.
    /// Stores that can write both in one step should override this, as
    /// [`MemoryStore`] does.
    fn mark_reviewed(
        &self,
        scheduler: &FSRSScheduler,
        id: &str,
        outcome: ReviewOutcome,
    ) -> Result<MemoryState> {
        let state = self.load(id)?;
        let result = scheduler.review(id, &state, outcome);
        // the log goes first so an out-of-order review never reaches the state
        self.append_log(id, result.log)?;
        self.save(id, &result.state)?;
        Ok(result.state)
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Clone)]
struct StoredItem {
    state: MemoryState,
    history: ReviewHistory,
}

/// Thread-safe key-value store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, StoredItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a New item due at `now` and return its id
    pub fn create_item(&self, now: DateTime<Utc>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.insert(&id, MemoryState::new(now))?;
        Ok(id)
    }

    /// Insert or replace an item with an empty history
    pub fn insert(&self, id: &str, state: MemoryState) -> Result<()> {
        let mut items = self.write()?;
        items.insert(
            id.to_string(),
            StoredItem {
                state,
                history: ReviewHistory::new(),
            },
        );
        Ok(())
    }

    /// Remove an item and its history
    pub fn remove(&self, id: &str) -> Result<MemoryState> {
        self.write()?
            .remove(id)
            .map(|item| item.state)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Copy of every `(id, state)` pair, sorted by id
    pub fn snapshot(&self) -> Result<Vec<(String, MemoryState)>> {
        let items = self.read()?;
        let mut all: Vec<(String, MemoryState)> = items
            .iter()
            .map(|(id, item)| (id.clone(), item.state.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, StoredItem>>> {
        self.items
            .read()
            .map_err(|_| StorageError::LockPoisoned("items read lock".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, StoredItem>>> {
        self.items
            .write()
            .map_err(|_| StorageError::LockPoisoned("items write lock".into()))
    }
}

impl ReviewStore for MemoryStore {
    fn load(&self, id: &str) -> Result<MemoryState> {
        self.read()?
            .get(id)
            .map(|item| item.state.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn save(&self, id: &str, state: &MemoryState) -> Result<()> {
        let mut items = self.write()?;
        let item = items
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        item.state = state.clone();
        Ok(())
    }

    fn append_log(&self, id: &str, entry: ReviewLogEntry) -> Result<()> {
        let mut items = self.write()?;
        let item = items
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        item.history.append(entry)?;
        Ok(())
    }

    fn history(&self, id: &str) -> Result<ReviewHistory> {
        self.read()?
            .get(id)
            .map(|item| item.history.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Holds the write lock for the whole review so concurrent reviews of one
    /// item are serialized
    fn mark_reviewed(
        &self,
        scheduler: &FSRSScheduler,
        id: &str,
        outcome: ReviewOutcome,
    ) -> Result<MemoryState> {
        let mut items = self.write()?;
        let item = items
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let result = scheduler.review(id, &item.state, outcome);
        item.history.append(result.log)?;
        item.state = result.state.clone();

        debug!(id, reps = item.state.reps, due = %item.state.due, "Item reviewed");
        Ok(result.state)
    }
}
