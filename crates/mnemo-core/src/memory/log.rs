//! Review outcomes and the append-only review log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{Corruption, MemoryState, Rating};

/// A graded review as reported by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub rating: Rating,
    pub timestamp: DateTime<Utc>,
}

impl ReviewOutcome {
    pub fn new(rating: Rating, timestamp: DateTime<Utc>) -> Self {
        Self { rating, timestamp }
    }
}

/// Immutable snapshot of one review: what the item looked like before,
/// how it was graded, and what it became.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    previous: MemoryState,
    outcome: ReviewOutcome,
    resulting: MemoryState,
    /// Set when `previous` was unschedulable and had to be reset first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reset_from: Option<Corruption>,
}

impl ReviewLogEntry {
    pub(crate) fn new(
        previous: MemoryState,
        outcome: ReviewOutcome,
        resulting: MemoryState,
        reset_from: Option<Corruption>,
    ) -> Self {
        Self {
            previous,
            outcome,
            resulting,
            reset_from,
        }
    }

    pub fn previous(&self) -> &MemoryState {
        &self.previous
    }

    pub fn outcome(&self) -> &ReviewOutcome {
        &self.outcome
    }

    pub fn resulting(&self) -> &MemoryState {
        &self.resulting
    }

    pub fn reset_from(&self) -> Option<Corruption> {
        self.reset_from
    }

    /// When the review happened
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.outcome.timestamp
    }
}

/// Rejected history append
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    /// Entry is older than the newest entry already recorded
    #[error("review at {entry} precedes the last recorded review at {last}")]
    OutOfOrder {
        entry: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

/// Chronological, append-only review log of a single item
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReviewHistory {
    entries: Vec<ReviewLogEntry>,
}

// Stored logs go back through `append` so ordering holds for loaded histories too
impl<'de> Deserialize<'de> for ReviewHistory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<ReviewLogEntry>::deserialize(deserializer)?;
        let mut history = ReviewHistory::new();
        for entry in entries {
            history.append(entry).map_err(serde::de::Error::custom)?;
        }
        Ok(history)
    }
}

impl ReviewHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`; entries must arrive in chronological order
    pub fn append(&mut self, entry: ReviewLogEntry) -> Result<(), HistoryError> {
        if let Some(last) = self.entries.last() {
            if entry.timestamp() < last.timestamp() {
                return Err(HistoryError::OutOfOrder {
                    entry: entry.timestamp(),
                    last: last.timestamp(),
                });
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[ReviewLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ReviewLogEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReviewLogEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ReviewHistory {
    type Item = &'a ReviewLogEntry;
    type IntoIter = std::slice::Iter<'a, ReviewLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
