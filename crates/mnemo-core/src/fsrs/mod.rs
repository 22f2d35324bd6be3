//! FSRS-6 (Free Spaced Repetition Scheduler) Module
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Layers
//! - `params`: the 21-weight vector, its range table and fallback policy
//! - `algorithm`: retrievability plus the stability/difficulty update formulas
//! - `interval`: stability to whole days, with deterministic fuzz
//! - `scheduler`: the New/Learning/Review/Relearning state machine
//! - `curve`: predicted vs. actual retrievability over a day range
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^(-w20) where FACTOR = 0.9^(-1/w20) - 1
//! - Interval: t = S/FACTOR * (R^(1/(-w20)) - 1)

pub mod algorithm;
mod curve;
mod interval;
mod params;
mod scheduler;

pub use algorithm::{
    DEFAULT_RETENTION,
    MAX_DIFFICULTY,
    MAX_STABILITY,
    MIN_DIFFICULTY,
    MIN_STABILITY,
    MemoryEstimate,
    SAME_DAY_THRESHOLD_DAYS,
    init_state,
    initial_difficulty,
    initial_stability,
    next_difficulty,
    next_forget_stability,
    next_recall_stability,
    next_state,
    // Core functions
    retrievability,
    same_day_stability,
};

pub use interval::{
    DEFAULT_MAXIMUM_INTERVAL, DEFAULT_MINIMUM_INTERVAL, FUZZ_MIN_INTERVAL, FUZZ_RANGES,
    FuzzRange, IntervalScheduler, fuzz_interval, fuzz_range, fuzz_seed, next_interval,
};

pub use params::{
    FSRS6_WEIGHTS, PARAMETER_COUNT, PARAMETER_NAMES, PARAMETER_RANGES, ParameterError,
    ParameterReport, ParameterStore, Parameters, ValidationResult,
};

pub use scheduler::{FSRSScheduler, PreviewResults, ReviewResult};

pub use curve::{CurvePoint, CurveWindow, MemoryCurve, project_curve};
