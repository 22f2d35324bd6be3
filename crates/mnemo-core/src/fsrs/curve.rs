//! Memory Curve Projection
//!
//! Model prediction versus review reality, one point per day. The curve borrows
//! the item's state and history and computes each point on demand, so it can be
//! cloned and replayed without touching either.

use std::iter::FusedIterator;
use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::retrievability;
use super::params::Parameters;
use crate::memory::{MemoryState, ReviewHistory, ReviewLogEntry, days_between};

/// Day range to project, as offsets from `origin`. Negative offsets are in the past.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveWindow {
    pub origin: DateTime<Utc>,
    pub days: Range<i64>,
}

impl CurveWindow {
    pub fn new(origin: DateTime<Utc>, days: Range<i64>) -> Self {
        Self { origin, days }
    }

    /// `past` days back through `future` days ahead, both inclusive
    pub fn around(origin: DateTime<Utc>, past: u32, future: u32) -> Self {
        Self::new(origin, -(past as i64)..future as i64 + 1)
    }

    pub fn len(&self) -> usize {
        span(&self.days)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One day of the curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoint {
    /// Offset from the window origin
    pub day: i64,
    /// Start of the day this point covers
    pub date: DateTime<Utc>,
    pub predicted_retrievability: f64,
    /// Share of reviews on this day that were recalled; absent without reviews
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_retrievability: Option<f64>,
}

/// Lazy, restartable curve over a [`CurveWindow`]
#[derive(Debug, Clone)]
pub struct MemoryCurve<'a> {
    state: &'a MemoryState,
    entries: &'a [ReviewLogEntry],
    params: Parameters,
    origin: DateTime<Utc>,
    days: Range<i64>,
}

/// Project the retrievability of one item over `window`
pub fn project_curve<'a>(
    state: &'a MemoryState,
    history: &'a ReviewHistory,
    window: &CurveWindow,
    params: &Parameters,
) -> MemoryCurve<'a> {
    MemoryCurve {
        state,
        entries: history.entries(),
        params: *params,
        origin: window.origin,
        days: representable_days(window),
    }
}

/// Number of offsets in `days`, saturating at the extremes of `i64`
fn span(days: &Range<i64>) -> usize {
    let len = days.end.saturating_sub(days.start).max(0);
    usize::try_from(len).unwrap_or(usize::MAX)
}

/// `window.days` cut down to offsets whose dates chrono can represent
fn representable_days(window: &CurveWindow) -> Range<i64> {
    let first = (DateTime::<Utc>::MIN_UTC - window.origin).num_days();
    let last = (DateTime::<Utc>::MAX_UTC - window.origin).num_days();
    window.days.start.max(first)..window.days.end.min(last.saturating_add(1))
}

impl MemoryCurve<'_> {
    // `days` only holds representable offsets, see `representable_days`
    fn point(&self, day: i64) -> CurvePoint {
        let date = self.origin + Duration::days(day);
        CurvePoint {
            day,
            date,
            predicted_retrievability: self.predicted_at(date),
            actual_retrievability: self.actual_on(date),
        }
    }

    /// Retrievability from the latest stability known at `at`
    fn predicted_at(&self, at: DateTime<Utc>) -> f64 {
        if let Some(last) = self.state.last_review {
            if at >= last {
                return retrievability(days_between(last, at), self.state.stability, &self.params);
            }
        }

        let known = self.entries.partition_point(|e| e.timestamp() <= at);
        match known.checked_sub(1).map(|i| &self.entries[i]) {
            Some(entry) => retrievability(
                days_between(entry.timestamp(), at),
                entry.resulting().stability,
                &self.params,
            ),
            None => 0.0,
        }
    }

    /// Mean recall outcome of reviews within `[start, start + 1 day)`
    fn actual_on(&self, start: DateTime<Utc>) -> Option<f64> {
        let lo = self.entries.partition_point(|e| e.timestamp() < start);
        let hi = match start.checked_add_signed(Duration::days(1)) {
            Some(end) => self.entries.partition_point(|e| e.timestamp() < end),
            None => self.entries.len(),
        };
        let reviews = self.entries.get(lo..hi).filter(|day| !day.is_empty())?;

        let recalled = reviews
            .iter()
            .filter(|e| e.outcome().rating.is_recalled())
            .count();
        Some(recalled as f64 / reviews.len() as f64)
    }
}

impl Iterator for MemoryCurve<'_> {
    type Item = CurvePoint;

    fn next(&mut self) -> Option<CurvePoint> {
        let day = self.days.next()?;
        Some(self.point(day))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = span(&self.days);
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for MemoryCurve<'_> {
    fn next_back(&mut self) -> Option<CurvePoint> {
        let day = self.days.next_back()?;
        Some(self.point(day))
    }
}

impl ExactSizeIterator for MemoryCurve<'_> {}

impl FusedIterator for MemoryCurve<'_> {}
