//! FSRS-6 Core Formulas
//!
//! Pure functions over a validated [`Parameters`] vector. Nothing here allocates
//! or touches global state, so every function is safe to call from any thread.

use serde::{Deserialize, Serialize};

use super::params::Parameters;
use crate::memory::Rating;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default target recall probability
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Smallest stability a reviewed item can have
pub const MIN_STABILITY: f64 = 0.001;

/// Largest stability (100 years)
pub const MAX_STABILITY: f64 = 36500.0;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Reviews closer together than this use the short-term stability formula
pub const SAME_DAY_THRESHOLD_DAYS: f64 = 1.0;

// ============================================================================
// RETRIEVABILITY
// ============================================================================

/// Probability of recall after `elapsed_days` for an item of `stability`.
///
/// `R = (1 + FACTOR * t / S)^DECAY`, with `R(0) = 1` and `R(S) = 0.9`.
/// Non-positive stability means nothing was ever learned, so `R = 0`.
#[inline]
pub fn retrievability(elapsed_days: f64, stability: f64, params: &Parameters) -> f64 {
    if stability.is_nan() || stability <= 0.0 {
        return 0.0;
    }
    if elapsed_days == f64::INFINITY {
        return 0.0;
    }
    // max() also maps NaN to 0
    let t = elapsed_days.max(0.0);
    let r = (1.0 + params.factor() * t / stability).powf(params.decay());
    if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 }
}

// ============================================================================
// INITIAL STATE
// ============================================================================

/// Initial stability for a first review: `w[G-1]`
pub fn initial_stability(rating: Rating, params: &Parameters) -> f64 {
    params[rating.index()].clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Initial difficulty for a first review: `w4 - e^(w5 * (G - 1)) + 1`
pub fn initial_difficulty(rating: Rating, params: &Parameters) -> f64 {
    raw_initial_difficulty(rating, params).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

#[inline]
fn raw_initial_difficulty(rating: Rating, params: &Parameters) -> f64 {
    params[4] - (params[5] * (rating.grade() - 1.0)).exp() + 1.0
}

// ============================================================================
// DIFFICULTY
// ============================================================================

/// Difficulty after a review.
///
/// The rating moves difficulty by `-w6 * (G - 3)`, damped linearly as it nears 10,
/// then `w7` pulls the result back toward the initial difficulty of an Easy item.
/// The reversion target is the raw, unclamped `D0(Easy)`.
pub fn next_difficulty(difficulty: f64, rating: Rating, params: &Parameters) -> f64 {
    let d = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let delta = -params[6] * (rating.grade() - 3.0);
    let damped = d + delta * (MAX_DIFFICULTY - d) / 9.0;
    let target = raw_initial_difficulty(Rating::Easy, params);
    let reverted = params[7] * target + (1.0 - params[7]) * damped;
    reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

// ============================================================================
// STABILITY
// ============================================================================

/// Stability after a successful (Hard/Good/Easy) review.
///
/// Growth shrinks as retrievability nears 1, as stability grows, and as
/// difficulty rises. Hard dampens growth by `w15`, Easy boosts it by `w16`.
pub fn next_recall_stability(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
    params: &Parameters,
) -> f64 {
    let hard_penalty = if rating == Rating::Hard { params[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { params[16] } else { 1.0 };

    let growth = params[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-params[9])
        * ((params[10] * (1.0 - retrievability)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;

    clamp_stability(stability * (1.0 + growth))
}

/// Stability after a lapse (Again).
///
/// Never exceeds `S / e^(w17 * w18)`, so a lapse always lowers stability.
pub fn next_forget_stability(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    params: &Parameters,
) -> f64 {
    let long_term = params[11]
        * difficulty.powf(-params[12])
        * ((stability + 1.0).powf(params[13]) - 1.0)
        * (params[14] * (1.0 - retrievability)).exp();
    let short_term = stability / (params[17] * params[18]).exp();

    clamp_stability(long_term.min(short_term))
}

/// Stability after a review less than a day after the previous one.
///
/// `S * e^(w17 * (G - 3 + w18)) * S^-w19`; Good and Easy never lower stability.
pub fn same_day_stability(stability: f64, rating: Rating, params: &Parameters) -> f64 {
    let mut increase =
        (params[17] * (rating.grade() - 3.0 + params[18])).exp() * stability.powf(-params[19]);
    if matches!(rating, Rating::Good | Rating::Easy) {
        increase = increase.max(1.0);
    }
    clamp_stability(stability * increase)
}

#[inline]
fn clamp_stability(stability: f64) -> f64 {
    if stability.is_nan() {
        return MIN_STABILITY;
    }
    stability.clamp(MIN_STABILITY, MAX_STABILITY)
}

// ============================================================================
// MEMORY STATE MODEL
// ============================================================================

/// Stability/difficulty pair produced by the memory model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryEstimate {
    pub stability: f64,
    pub difficulty: f64,
    /// Recall probability at the moment of the review (1.0 for first reviews)
    pub retrievability: f64,
}

/// Memory estimate after an item's first-ever review
pub fn init_state(rating: Rating, params: &Parameters) -> MemoryEstimate {
    MemoryEstimate {
        stability: initial_stability(rating, params),
        difficulty: initial_difficulty(rating, params),
        retrievability: 1.0,
    }
}

/// Memory estimate after a subsequent review, `elapsed_days` after the previous one
pub fn next_state(
    stability: f64,
    difficulty: f64,
    rating: Rating,
    elapsed_days: f64,
    params: &Parameters,
) -> MemoryEstimate {
    let stability = clamp_stability(stability);
    let difficulty = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let r = retrievability(elapsed_days, stability, params);

    let next_s = if elapsed_days < SAME_DAY_THRESHOLD_DAYS {
        same_day_stability(stability, rating, params)
    } else if rating == Rating::Again {
        next_forget_stability(difficulty, stability, r, params)
    } else {
        next_recall_stability(difficulty, stability, r, rating, params)
    };

    MemoryEstimate {
        stability: next_s,
        difficulty: next_difficulty(difficulty, rating, params),
        retrievability: r,
    }
}
