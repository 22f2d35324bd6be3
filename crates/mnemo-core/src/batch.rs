//! Batch analytics over many items
//!
//! Items are independent, so every function here fans the per-item work out
//! over the rayon pool. Output order always matches input order.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::fsrs::{CurvePoint, CurveWindow, Parameters, project_curve};
use crate::memory::{ItemState, MemoryState, ReviewHistory};

/// Recall probability of one item at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievabilitySnapshot {
    pub id: String,
    pub state: ItemState,
    pub retrievability: f64,
    pub is_due: bool,
}

/// State and history of one item, borrowed for curve projection
#[derive(Debug, Clone, Copy)]
pub struct CurveInput<'a> {
    pub state: &'a MemoryState,
    pub history: &'a ReviewHistory,
}

/// Retrievability of every item at `now`
pub fn retrievability_snapshot(
    items: &[(String, MemoryState)],
    now: DateTime<Utc>,
    params: &Parameters,
) -> Vec<RetrievabilitySnapshot> {
    items
        .par_iter()
        .map(|(id, state)| RetrievabilitySnapshot {
            id: id.clone(),
            state: state.state,
            retrievability: state.retrievability_at(now, params),
            is_due: state.is_due(now),
        })
        .collect()
}

/// Ids of the items due at `now`
pub fn due_items(items: &[(String, MemoryState)], now: DateTime<Utc>) -> Vec<&str> {
    items
        .par_iter()
        .filter(|(_, state)| state.is_due(now))
        .map(|(id, _)| id.as_str())
        .collect()
}

/// Mean retrievability across a snapshot; `None` when it is empty
pub fn average_retrievability(snapshot: &[RetrievabilitySnapshot]) -> Option<f64> {
    if snapshot.is_empty() {
        return None;
    }
    let total: f64 = snapshot.par_iter().map(|s| s.retrievability).sum();
    Some(total / snapshot.len() as f64)
}

/// Materialized curves for many items over the same window
pub fn project_curves(
    inputs: &[CurveInput<'_>],
    window: &CurveWindow,
    params: &Parameters,
) -> Vec<Vec<CurvePoint>> {
    inputs
        .par_iter()
        .map(|input| project_curve(input.state, input.history, window, params).collect())
        .collect()
}
