//! Property-Based Tests for the FSRS-6 model
//!
//! Tests the following invariants:
//! - Memory model outputs: stability > 0, difficulty in [1, 10]
//! - Retrievability in [0, 1], exactly 1 at t = 0
//! - Counters: lapses <= reps, both non-decreasing over any rating sequence
//! - Determinism of the fuzzed interval
//! - Lower retention target, longer interval
//! - Curve projection is repeatable and read-only

use chrono::Duration;
use proptest::prelude::*;

use mnemo_core::fsrs::{next_state, retrievability};
use mnemo_core::{
    CurveWindow, FSRSScheduler, IntervalScheduler, Parameters, Rating, ReviewOutcome, next_interval,
    project_curve,
};
use mnemo_e2e_tests::TestDataFactory;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_rating() -> impl Strategy<Value = Rating> {
    prop_oneof![
        Just(Rating::Again),
        Just(Rating::Hard),
        Just(Rating::Good),
        Just(Rating::Easy),
    ]
}

fn arb_stability() -> impl Strategy<Value = f64> {
    prop_oneof![0.001f64..1.0, 1.0f64..100.0, 100.0f64..36500.0]
}

fn arb_difficulty() -> impl Strategy<Value = f64> {
    1.0f64..=10.0
}

fn arb_elapsed_days() -> impl Strategy<Value = f64> {
    prop_oneof![0.0f64..1.0, 1.0f64..3650.0]
}

/// (rating, hours until the next review) pairs
fn arb_review_plan() -> impl Strategy<Value = Vec<(Rating, u32)>> {
    prop::collection::vec((arb_rating(), 0u32..24 * 120), 1..25)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Memory model never leaves its legal ranges
    #[test]
    fn next_state_stays_in_range(
        stability in arb_stability(),
        difficulty in arb_difficulty(),
        rating in arb_rating(),
        elapsed in arb_elapsed_days(),
    ) {
        let params = Parameters::default();
        let next = next_state(stability, difficulty, rating, elapsed, &params);

        prop_assert!(next.stability > 0.0);
        prop_assert!(next.stability.is_finite());
        prop_assert!((1.0..=10.0).contains(&next.difficulty));
        prop_assert!((0.0..=1.0).contains(&next.retrievability));
    }

    /// A lapse after at least a day never raises stability
    #[test]
    fn lapse_lowers_stability(
        stability in arb_stability(),
        difficulty in arb_difficulty(),
        elapsed in 1.0f64..3650.0,
    ) {
        let params = Parameters::default();
        let next = next_state(stability, difficulty, Rating::Again, elapsed, &params);
        prop_assert!(next.stability <= stability);
    }

    #[test]
    fn retrievability_is_a_probability(
        elapsed in -100.0f64..100_000.0,
        stability in -10.0f64..40_000.0,
    ) {
        let params = Parameters::default();
        let r = retrievability(elapsed, stability, &params);
        prop_assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn retrievability_starts_at_one(stability in arb_stability()) {
        let params = Parameters::default();
        prop_assert_eq!(retrievability(0.0, stability, &params), 1.0);
    }

    /// Counters hold their invariants across arbitrary review sequences
    #[test]
    fn counters_are_monotonic(plan in arb_review_plan()) {
        let scheduler = FSRSScheduler::default();
        let mut state = TestDataFactory::new_state();
        let mut at = TestDataFactory::epoch();

        for (rating, gap_hours) in plan {
            let next = scheduler.review("prop", &state, ReviewOutcome::new(rating, at)).state;

            prop_assert!(next.reps > state.reps);
            prop_assert!(next.lapses >= state.lapses);
            prop_assert!(next.lapses <= next.reps);
            prop_assert!(next.stability > 0.0);
            prop_assert!((1.0..=10.0).contains(&next.difficulty));
            prop_assert!(next.due >= at);

            state = next;
            at += Duration::hours(gap_hours as i64);
        }
    }

    /// Same inputs, same interval, fuzz included
    #[test]
    fn interval_is_deterministic(
        stability in arb_stability(),
        retention in 0.7f64..0.97,
        id in "[a-z0-9-]{1,36}",
        reps in 0u32..500,
    ) {
        let params = Parameters::default();
        let scheduler = IntervalScheduler {
            desired_retention: retention,
            ..Default::default()
        };

        let first = scheduler.next_interval(stability, &params, &id, reps);
        let second = scheduler.next_interval(stability, &params, &id, reps);
        prop_assert_eq!(first, second);
        prop_assert!((1..=36500).contains(&first));
    }

    /// Lowering the retention target always lengthens the raw interval.
    /// Interval falls as target retention rises: a stricter target means earlier reviews.
    #[test]
    fn lower_retention_means_longer_interval(
        stability in arb_stability(),
        high in 0.75f64..0.99,
        gap in 0.01f64..0.2,
    ) {
        let params = Parameters::default();
        let low = high - gap;
        prop_assert!(next_interval(stability, low, &params) > next_interval(stability, high, &params));
    }

    /// Projecting twice gives the same points and leaves inputs unchanged
    #[test]
    fn curve_is_repeatable(
        ratings in prop::collection::vec(arb_rating(), 1..12),
        gap_days in 0.5f64..20.0,
        from in -60i64..0,
        len in 0i64..200,
    ) {
        let scheduler = FSRSScheduler::default();
        let (state, history) =
            TestDataFactory::history_from_ratings(&scheduler, "curve", &ratings, gap_days);
        let (state_copy, history_copy) = (state.clone(), history.clone());
        let window = CurveWindow::new(TestDataFactory::epoch(), from..from + len);

        let curve = project_curve(&state, &history, &window, scheduler.parameters());
        prop_assert_eq!(curve.len(), len as usize);
        let first: Vec<_> = curve.clone().collect();
        let second: Vec<_> = curve.collect();

        prop_assert_eq!(first, second);
        prop_assert_eq!(state, state_copy);
        prop_assert_eq!(history, history_copy);
    }
}
