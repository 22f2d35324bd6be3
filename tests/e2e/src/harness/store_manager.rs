//! Test Store Manager
//!
//! Provides isolated store instances for testing:
//! - A fresh in-memory store and scheduler per test
//! - A controllable clock so reviews happen at reproducible instants
//! - JSON persistence into a temporary directory, and reload from it
//! - Snapshots and restoration

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use mnemo_core::{
    FSRSScheduler, MemoryState, MemoryStore, Rating, ReviewHistory, ReviewOutcome, ReviewStore,
    SchedulerConfig,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::mocks::TestDataFactory;

/// One item as a host would persist it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedItem {
    pub id: String,
    pub state: MemoryState,
    pub history: ReviewHistory,
}

/// Manager for test stores
///
/// Each manager owns its own store, scheduler, clock and temporary directory,
/// so tests never interfere with each other.
///
/// # Example
///
/// ```rust,ignore
/// let mut env = TestStoreManager::new_temp();
/// let id = env.seed_items(1).remove(0);
/// env.review(&id, Rating::Good);
/// env.advance_days(3.0);
/// ```
pub struct TestStoreManager {
    /// The store instance
    pub store: MemoryStore,
    /// Scheduler used for every review
    pub scheduler: FSRSScheduler,
    clock: DateTime<Utc>,
    temp_dir: TempDir,
    snapshot: Option<Vec<PersistedItem>>,
}

impl TestStoreManager {
    /// Default scheduler, clock at [`TestDataFactory::epoch`]
    pub fn new_temp() -> Self {
        Self::with_scheduler(FSRSScheduler::default())
    }

    /// Scheduler built from `config`
    pub fn with_config(config: &SchedulerConfig) -> Self {
        Self::with_scheduler(FSRSScheduler::new(config).expect("Invalid test config"))
    }

    pub fn with_scheduler(scheduler: FSRSScheduler) -> Self {
        Self {
            store: MemoryStore::new(),
            scheduler,
            clock: TestDataFactory::epoch(),
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            snapshot: None,
        }
    }

    // ========================================================================
    // CLOCK
    // ========================================================================

    pub fn now(&self) -> DateTime<Utc> {
        self.clock
    }

    pub fn advance(&mut self, by: Duration) {
        self.clock += by;
    }

    pub fn advance_days(&mut self, days: f64) {
        self.advance(Duration::seconds((days * 86_400.0).round() as i64));
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    pub fn item_count(&self) -> usize {
        self.store.len().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn state(&self, id: &str) -> MemoryState {
        self.store.load(id).expect("Item should exist")
    }

    pub fn history(&self, id: &str) -> ReviewHistory {
        self.store.history(id).expect("Item should exist")
    }

    /// Create `count` new items due now
    pub fn seed_items(&mut self, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| self.store.create_item(self.clock).expect("Failed to create item"))
            .collect()
    }

    /// Review `id` at the current clock
    pub fn review(&mut self, id: &str, rating: Rating) -> MemoryState {
        self.store
            .mark_reviewed(&self.scheduler, id, ReviewOutcome::new(rating, self.clock))
            .expect("Review should succeed")
    }

    /// Move the clock to the item's due date (never backwards), then review
    pub fn review_when_due(&mut self, id: &str, rating: Rating) -> MemoryState {
        let due = self.state(id).due;
        if due > self.clock {
            self.clock = due;
        }
        self.review(id, rating)
    }

    /// Review each rating in turn, each when due
    pub fn review_sequence(&mut self, id: &str, ratings: &[Rating]) -> Vec<MemoryState> {
        ratings
            .iter()
            .map(|&rating| self.review_when_due(id, rating))
            .collect()
    }

    /// Seed a never-reviewed, a well-learned and a struggling item
    pub fn seed_with_learning_states(&mut self) -> Vec<String> {
        let ids = self.seed_items(3);
        self.review_sequence(
            &ids[1],
            &[Rating::Good, Rating::Good, Rating::Easy, Rating::Good],
        );
        self.review_sequence(
            &ids[2],
            &[Rating::Good, Rating::Good, Rating::Again, Rating::Hard, Rating::Again],
        );
        ids
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Every item with its history, sorted by id
    pub fn export_items(&self) -> Vec<PersistedItem> {
        self.store
            .snapshot()
            .expect("Snapshot should succeed")
            .into_iter()
            .map(|(id, state)| {
                let history = self.history(&id);
                PersistedItem { id, state, history }
            })
            .collect()
    }

    /// Write every item to a JSON file in the temporary directory
    pub fn persist(&self) -> PathBuf {
        let path = self.temp_dir.path().join("items.json");
        let json = serde_json::to_string_pretty(&self.export_items()).expect("Serialize items");
        std::fs::write(&path, json).expect("Write items file");
        path
    }

    pub fn load_persisted(path: &Path) -> Vec<PersistedItem> {
        let raw = std::fs::read_to_string(path).expect("Read items file");
        serde_json::from_str(&raw).expect("Parse items file")
    }

    /// Replace the store with the items saved at `path`
    pub fn reload_from(&mut self, path: &Path) -> usize {
        let items = Self::load_persisted(path);
        self.store = MemoryStore::new();
        self.import(&items);
        items.len()
    }

    fn import(&mut self, items: &[PersistedItem]) {
        for item in items {
            self.store
                .insert(&item.id, item.state.clone())
                .expect("Insert item");
            for entry in &item.history {
                self.store
                    .append_log(&item.id, entry.clone())
                    .expect("Append log");
            }
        }
    }

    // ========================================================================
    // SNAPSHOT/RESTORE
    // ========================================================================

    pub fn take_snapshot(&mut self) {
        self.snapshot = Some(self.export_items());
    }

    /// Restore the last snapshot; ids and histories are preserved
    pub fn restore_snapshot(&mut self) -> bool {
        match self.snapshot.take() {
            Some(items) => {
                self.store = MemoryStore::new();
                self.import(&items);
                true
            }
            None => false,
        }
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn clear(&mut self) {
        self.store = MemoryStore::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_store_creation() {
        let env = TestStoreManager::new_temp();
        assert!(env.is_empty());
        assert_eq!(env.now(), TestDataFactory::epoch());
    }

    #[test]
    fn test_seed_items() {
        let mut env = TestStoreManager::new_temp();
        let ids = env.seed_items(10);
        assert_eq!(ids.len(), 10);
        assert_eq!(env.item_count(), 10);
    }

    #[test]
    fn test_clock_moves_only_forward_to_due() {
        let mut env = TestStoreManager::new_temp();
        let id = env.seed_items(1).remove(0);
        let state = env.review(&id, Rating::Good);

        env.review_when_due(&id, Rating::Good);
        assert_eq!(env.now(), state.due);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut env = TestStoreManager::new_temp();
        let ids = env.seed_with_learning_states();

        env.take_snapshot();
        assert!(env.has_snapshot());
        let before = env.export_items();

        env.clear();
        assert!(env.is_empty());

        assert!(env.restore_snapshot());
        assert_eq!(env.export_items(), before);
        assert_eq!(env.history(&ids[1]).len(), 4);
    }

    #[test]
    fn test_persist_and_reload() {
        let mut env = TestStoreManager::new_temp();
        env.seed_with_learning_states();
        let before = env.export_items();

        let path = env.persist();
        assert!(path.exists());
        assert_eq!(env.reload_from(&path), 3);
        assert_eq!(env.export_items(), before);
    }
}
