//! Review State Machine
//!
//! `New → Learning → Review ⇄ Relearning`
//!
//! [`FSRSScheduler::review`] takes the stored state of one item and a graded
//! outcome and returns the next state plus a log entry. It never fails: a
//! corrupted record is reset to New (with a warning) and reviewed from there.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::algorithm::{init_state, next_state};
use super::interval::IntervalScheduler;
use super::params::{ParameterStore, Parameters};
use crate::config::{ConfigError, SchedulerConfig};
use crate::memory::{
    HistoryError, ItemState, MemoryState, Rating, ReviewHistory, ReviewLogEntry, ReviewOutcome,
};

const MINUTES_PER_DAY: f64 = 1440.0;

/// Single implicit step used when a step list is empty
const FALLBACK_STEPS: [u32; 1] = [1440];

// ============================================================================
// RESULTS
// ============================================================================

/// Outcome of a single review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// State to persist
    pub state: MemoryState,
    /// Entry to append to the item's history
    pub log: ReviewLogEntry,
}

impl ReviewResult {
    pub fn due(&self) -> DateTime<Utc> {
        self.state.due
    }
}

/// What each rating would do to an item, computed without side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub again: ReviewResult,
    pub hard: ReviewResult,
    pub good: ReviewResult,
    pub easy: ReviewResult,
}

impl PreviewResults {
    pub fn get(&self, rating: Rating) -> &ReviewResult {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

/// Where the lifecycle moves after a rating
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transition {
    /// Stay in (or enter) a stepping state, due after `minutes`
    Step {
        state: ItemState,
        step: u32,
        minutes: f64,
    },
    /// Review state, due after a stability-driven interval
    Schedule,
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// FSRS-6 review scheduler.
///
/// Holds only immutable configuration; share it freely across threads.
#[derive(Debug, Clone)]
pub struct FSRSScheduler {
    params: Parameters,
    intervals: IntervalScheduler,
    learning_steps: Vec<u32>,
    relearning_steps: Vec<u32>,
}

impl Default for FSRSScheduler {
    fn default() -> Self {
        let config = SchedulerConfig::default();
        Self {
            params: Parameters::default(),
            intervals: config.interval_scheduler(),
            learning_steps: config.learning_steps,
            relearning_steps: config.relearning_steps,
        }
    }
}

impl FSRSScheduler {
    /// Build from a config. Invalid weights fall back to the defaults with a
    /// warning; invalid scalar settings are rejected.
    pub fn new(config: &SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (params, validation) = ParameterStore::resolve(&config.parameters);
        if !validation.is_valid() {
            let reasons: Vec<String> = validation.errors.iter().map(ToString::to_string).collect();
            warn!(
                errors = %reasons.join("; "),
                "Invalid FSRS parameters, falling back to defaults"
            );
        }

        Ok(Self {
            params,
            intervals: config.interval_scheduler(),
            learning_steps: config.learning_steps.clone(),
            relearning_steps: config.relearning_steps.clone(),
        })
    }

    /// Default settings with a specific weight vector
    pub fn with_parameters(params: Parameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn intervals(&self) -> &IntervalScheduler {
        &self.intervals
    }

    /// State for a freshly created item
    pub fn new_item(&self, now: DateTime<Utc>) -> MemoryState {
        MemoryState::new(now)
    }

    /// Recall probability of `state` at `now`
    pub fn retrievability(&self, state: &MemoryState, now: DateTime<Utc>) -> f64 {
        state.retrievability_at(now, &self.params)
    }

    /// Apply one graded review to `state`.
    ///
    /// `item_id` only seeds the interval fuzz.
    pub fn review(&self, item_id: &str, state: &MemoryState, outcome: ReviewOutcome) -> ReviewResult {
        let reset_from = state.corruption();
        let current = match reset_from {
            Some(reason) => {
                warn!(item_id, %reason, state = %state.state, "Corrupted memory state, resetting item to new");
                state.reset()
            }
            None => state.clone(),
        };

        let now = outcome.timestamp;
        let rating = outcome.rating;
        let elapsed_days = current.days_since_review(now);

        let estimate = if current.state == ItemState::New {
            init_state(rating, &self.params)
        } else {
            next_state(
                current.stability,
                current.clamped_difficulty(),
                rating,
                elapsed_days,
                &self.params,
            )
        };

        let mut next = MemoryState {
            stability: estimate.stability,
            difficulty: estimate.difficulty,
            last_review: Some(now),
            elapsed_days,
            reps: current.reps.saturating_add(1),
            retrievability: estimate.retrievability,
            ..current.clone()
        };

        match self.transition(&current, rating) {
            Transition::Step {
                state,
                step,
                minutes,
            } => {
                next.state = state;
                next.step = step;
                next.scheduled_days = minutes / MINUTES_PER_DAY;
                let delay = Duration::try_seconds((minutes * 60.0).round() as i64);
                next.due = due_after(item_id, now, delay);
            }
            Transition::Schedule => {
                let days =
                    self.intervals
                        .next_interval(next.stability, &self.params, item_id, next.reps);
                next.state = ItemState::Review;
                next.step = 0;
                next.scheduled_days = days as f64;
                next.due = due_after(item_id, now, Duration::try_days(days as i64));
            }
        }

        if current.state == ItemState::Review && rating == Rating::Again {
            next.lapses = current.lapses.saturating_add(1);
        }

        debug!(
            item_id,
            rating = %rating,
            from = %current.state,
            to = %next.state,
            stability = next.stability,
            difficulty = next.difficulty,
            due = %next.due,
            "Review scheduled"
        );

        let log = ReviewLogEntry::new(state.clone(), outcome, next.clone(), reset_from);
        ReviewResult { state: next, log }
    }

    /// [`FSRSScheduler::review`], appending the log entry to `history`
    pub fn record(
        &self,
        item_id: &str,
        state: &MemoryState,
        outcome: ReviewOutcome,
        history: &mut ReviewHistory,
    ) -> Result<MemoryState, HistoryError> {
        let result = self.review(item_id, state, outcome);
        history.append(result.log)?;
        Ok(result.state)
    }

    /// Outcomes of all four ratings at `now`
    pub fn preview(&self, item_id: &str, state: &MemoryState, now: DateTime<Utc>) -> PreviewResults {
        let at = |rating| self.review(item_id, state, ReviewOutcome::new(rating, now));
        PreviewResults {
            again: at(Rating::Again),
            hard: at(Rating::Hard),
            good: at(Rating::Good),
            easy: at(Rating::Easy),
        }
    }

    fn transition(&self, current: &MemoryState, rating: Rating) -> Transition {
        match current.state {
            ItemState::New => step_through(&self.learning_steps, ItemState::Learning, 0, rating),
            ItemState::Learning => step_through(
                &self.learning_steps,
                ItemState::Learning,
                current.step,
                rating,
            ),
            ItemState::Relearning => step_through(
                &self.relearning_steps,
                ItemState::Relearning,
                current.step,
                rating,
            ),
            ItemState::Review => match (rating, self.relearning_steps.first()) {
                (Rating::Again, Some(&first)) => Transition::Step {
                    state: ItemState::Relearning,
                    step: 0,
                    minutes: first as f64,
                },
                _ => Transition::Schedule,
            },
        }
    }
}

/// `now + delay`, saturating at the latest representable instant
fn due_after(item_id: &str, now: DateTime<Utc>, delay: Option<Duration>) -> DateTime<Utc> {
    match delay.and_then(|delay| now.checked_add_signed(delay)) {
        Some(due) => due,
        None => {
            warn!(item_id, %now, "Due date out of range, saturating");
            DateTime::<Utc>::MAX_UTC
        }
    }
}

/// Advance through fixed `steps` (minutes). Graduates past the last step or on Easy.
///
/// An empty list behaves as a single one-day step: Again and Hard keep the item
/// stepping, Good and Easy graduate.
fn step_through(steps: &[u32], state: ItemState, step: u32, rating: Rating) -> Transition {
    let steps = if steps.is_empty() { &FALLBACK_STEPS[..] } else { steps };
    let first = steps[0];
    // Steps may have been shortened by a config change since the last review
    let step = (step as usize).min(steps.len() - 1);

    match rating {
        Rating::Again => Transition::Step {
            state,
            step: 0,
            minutes: first as f64,
        },
        Rating::Hard => {
            let minutes = match (step, steps.get(1)) {
                (0, Some(&second)) => (first as f64 + second as f64) / 2.0,
                (0, None) => first as f64 * 1.5,
                _ => steps[step] as f64,
            };
            Transition::Step {
                state,
                step: step as u32,
                minutes,
            }
        }
        Rating::Good => match steps.get(step + 1) {
            Some(&next) => Transition::Step {
                state,
                step: (step + 1) as u32,
                minutes: next as f64,
            },
            None => Transition::Schedule,
        },
        Rating::Easy => Transition::Schedule,
    }
}
