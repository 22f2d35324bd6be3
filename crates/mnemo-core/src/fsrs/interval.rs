//! Interval Scheduler
//!
//! Turns stability into a day count: invert the forgetting curve at the target
//! retention, clamp, round, then fuzz.
//!
//! Fuzz spreads items that would otherwise pile up on the same day. It is drawn
//! from a ChaCha8 stream seeded by `SHA-256("{item_id}:{reps}")`, so the same item
//! at the same repetition always lands on the same day, on any thread.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::algorithm::DEFAULT_RETENTION;
use super::params::Parameters;

/// Intervals shorter than this are never fuzzed
pub const FUZZ_MIN_INTERVAL: f64 = 2.5;

/// Default lower interval bound in days
pub const DEFAULT_MINIMUM_INTERVAL: u32 = 1;

/// Default upper interval bound in days (100 years)
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

/// One band of the fuzz table: intervals within `[start, end)` widen the
/// fuzz window by `factor` per day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzRange {
    pub start: f64,
    pub end: f64,
    pub factor: f64,
}

/// FSRS fuzz bands
pub const FUZZ_RANGES: [FuzzRange; 3] = [
    FuzzRange {
        start: 2.5,
        end: 7.0,
        factor: 0.15,
    },
    FuzzRange {
        start: 7.0,
        end: 20.0,
        factor: 0.1,
    },
    FuzzRange {
        start: 20.0,
        end: f64::INFINITY,
        factor: 0.05,
    },
];

// ============================================================================
// FREE FUNCTIONS
// ============================================================================

/// Days until recall probability falls to `desired_retention`.
///
/// `I = S / FACTOR * (r^(1/DECAY) - 1)`; unclamped and unrounded.
pub fn next_interval(stability: f64, desired_retention: f64, params: &Parameters) -> f64 {
    if stability.is_nan() || stability <= 0.0 {
        return 0.0;
    }
    let r = desired_retention.clamp(0.0001, 0.9999);
    stability / params.factor() * (r.powf(1.0 / params.decay()) - 1.0)
}

/// Stable 64-bit seed for an item at a given repetition count
pub fn fuzz_seed(item_id: &str, reps: u32) -> u64 {
    let digest = Sha256::digest(format!("{item_id}:{reps}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Inclusive `(min, max)` day window fuzz may pick from
pub fn fuzz_range(interval: f64, maximum_interval: u32) -> (u32, u32) {
    let delta = FUZZ_RANGES.iter().fold(1.0, |delta, range| {
        delta + range.factor * (interval.min(range.end) - range.start).max(0.0)
    });

    let max_ivl = (interval + delta).round().min(maximum_interval as f64).max(1.0) as u32;
    let min_ivl = ((interval - delta).round().max(2.0) as u32).min(max_ivl);
    (min_ivl, max_ivl)
}

/// Pick a day from the fuzz window of `interval` using `seed`
pub fn fuzz_interval(interval: f64, seed: u64, maximum_interval: u32) -> u32 {
    if interval < FUZZ_MIN_INTERVAL {
        return interval.round().max(1.0) as u32;
    }
    let (min_ivl, max_ivl) = fuzz_range(interval, maximum_interval);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen_range(min_ivl..=max_ivl)
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Stability → whole-day interval, with retention target and bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalScheduler {
    pub desired_retention: f64,
    pub minimum_interval: u32,
    pub maximum_interval: u32,
    pub enable_fuzz: bool,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self {
            desired_retention: DEFAULT_RETENTION,
            minimum_interval: DEFAULT_MINIMUM_INTERVAL,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            enable_fuzz: true,
        }
    }
}

impl IntervalScheduler {
    /// Interval in days clamped to `[minimum_interval, maximum_interval]`
    pub fn clamped_interval(&self, stability: f64, params: &Parameters) -> f64 {
        next_interval(stability, self.desired_retention, params)
            .clamp(self.minimum_interval as f64, self.maximum_interval as f64)
    }

    /// Whole-day interval for `item_id` at repetition `reps`.
    ///
    /// Deterministic: identical inputs always give the same day count.
    pub fn next_interval(&self, stability: f64, params: &Parameters, item_id: &str, reps: u32) -> u32 {
        let interval = self.clamped_interval(stability, params);
        let days = if self.enable_fuzz {
            fuzz_interval(interval, fuzz_seed(item_id, reps), self.maximum_interval)
        } else {
            interval.round() as u32
        };
        days.clamp(self.minimum_interval, self.maximum_interval)
    }
}
