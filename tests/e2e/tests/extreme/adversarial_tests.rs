//! Adversarial input: malformed weights, corrupted records, hostile timestamps
//!
//! None of these may make a review fail or produce an out-of-range value.

use chrono::Duration;
use mnemo_core::{
    FSRS6_WEIGHTS, FSRSScheduler, ItemState, MemoryState, ParameterStore, Parameters, Rating,
    ReviewOutcome, ReviewStore, SchedulerConfig,
};
use mnemo_e2e_tests::{TestDataFactory, TestStoreManager};

fn assert_schedulable(state: &MemoryState) {
    assert!(state.stability.is_finite() && state.stability > 0.0);
    assert!((1.0..=10.0).contains(&state.difficulty));
    assert!((0.0..=1.0).contains(&state.retrievability));
    assert!(state.lapses <= state.reps);
    assert!(state.last_review.is_some());
    assert!(state.corruption().is_none());
}

// ==================== Parameters ====================

#[test]
fn test_twenty_element_vector_falls_back_with_report() {
    let weights = &FSRS6_WEIGHTS[..20];

    let validation = ParameterStore::validate(weights);
    assert!(!validation.is_valid());
    assert_eq!(validation.errors.len(), 1);

    let effective = ParameterStore::effective(weights);
    assert_eq!(effective.as_array(), &FSRS6_WEIGHTS);
}

#[test]
fn test_every_malformed_vector_yields_working_scheduler() {
    for (label, weights) in TestDataFactory::malformed_parameter_vectors() {
        let config = SchedulerConfig {
            parameters: weights,
            ..Default::default()
        };
        let scheduler = FSRSScheduler::new(&config).expect(label);
        assert_eq!(scheduler.parameters(), &Parameters::default(), "{label}");

        let result = scheduler.review(
            "x",
            &TestDataFactory::new_state(),
            ReviewOutcome::new(Rating::Good, TestDataFactory::epoch()),
        );
        assert_schedulable(&result.state);
    }
}

#[test]
fn test_custom_parameters_are_used() {
    let config = SchedulerConfig {
        parameters: TestDataFactory::custom_parameters(),
        ..Default::default()
    };
    let scheduler = FSRSScheduler::new(&config).unwrap();
    assert_eq!(scheduler.parameters()[2], 3.1);

    let result = scheduler.review(
        "x",
        &TestDataFactory::new_state(),
        ReviewOutcome::new(Rating::Good, TestDataFactory::epoch()),
    );
    assert_eq!(result.state.stability, 3.1);
}

#[test]
fn test_weights_json_with_wrong_length_is_rejected_on_deserialize() {
    let json = serde_json::to_string(&FSRS6_WEIGHTS[..20]).unwrap();
    assert!(serde_json::from_str::<Parameters>(&json).is_err());

    let json = serde_json::to_string(&FSRS6_WEIGHTS).unwrap();
    let params: Parameters = serde_json::from_str(&json).unwrap();
    assert_eq!(params, Parameters::default());
}

// ==================== Corrupted Records ====================

#[test]
fn test_corrupted_records_are_reset_and_reviewed() {
    let scheduler = FSRSScheduler::default();
    let at = TestDataFactory::epoch() + Duration::days(3);

    for (reason, state) in TestDataFactory::corrupted_states() {
        for rating in Rating::ALL {
            let result = scheduler.review("bad", &state, ReviewOutcome::new(rating, at));

            assert_eq!(result.log.reset_from(), Some(reason));
            assert_ne!(result.state.state, ItemState::Relearning);
            assert_eq!(result.state.reps, state.reps + 1);
            assert_schedulable(&result.state);
        }
    }
}

#[test]
fn test_corrupted_record_in_store_recovers() {
    let mut env = TestStoreManager::new_temp();
    let (_, corrupted) = TestDataFactory::corrupted_states().remove(0);
    env.store.insert("broken", corrupted).unwrap();
    env.advance_days(5.0);

    let state = env.review("broken", Rating::Good);
    assert_eq!(state.state, ItemState::Learning);
    let history = env.history("broken");
    assert!(history.last().unwrap().reset_from().is_some());

    let next = env.review_when_due("broken", Rating::Good);
    assert_eq!(next.state, ItemState::Review);
    assert!(env.history("broken").last().unwrap().reset_from().is_none());
}

#[test]
fn test_out_of_range_difficulty_is_clamped() {
    let scheduler = FSRSScheduler::default();
    let at = TestDataFactory::epoch() + Duration::days(10);

    for difficulty in [-50.0, 0.0, 10.5, 1e9] {
        let state = TestDataFactory::review_state(10.0, difficulty, TestDataFactory::epoch());
        let result = scheduler.review("d", &state, ReviewOutcome::new(Rating::Hard, at));
        assert!(result.log.reset_from().is_none());
        assert_schedulable(&result.state);
    }
}

// ==================== Timestamps ====================

#[test]
fn test_review_before_last_review_counts_as_same_day() {
    let scheduler = FSRSScheduler::default();
    let last = TestDataFactory::epoch();
    let state = TestDataFactory::review_state(15.0, 5.0, last);

    let result = scheduler.review(
        "early",
        &state,
        ReviewOutcome::new(Rating::Good, last - Duration::days(2)),
    );
    assert_eq!(result.state.elapsed_days, 0.0);
    assert!(result.state.stability >= state.stability);
    assert_schedulable(&result.state);
}

#[test]
fn test_century_long_gap() {
    let scheduler = FSRSScheduler::default();
    let state = TestDataFactory::review_state(3.0, 7.0, TestDataFactory::epoch());
    let at = TestDataFactory::epoch() + Duration::days(365 * 100);

    for rating in Rating::ALL {
        let result = scheduler.review("old", &state, ReviewOutcome::new(rating, at));
        assert_schedulable(&result.state);
        assert!(result.state.scheduled_days <= 36500.0);
    }
}

#[test]
fn test_tiny_and_huge_stability() {
    let scheduler = FSRSScheduler::default();
    let at = TestDataFactory::epoch() + Duration::days(1);

    for stability in [1e-9, 0.001, 36500.0, 1e6] {
        let state = TestDataFactory::review_state(stability, 5.0, TestDataFactory::epoch());
        for rating in Rating::ALL {
            let result = scheduler.review("s", &state, ReviewOutcome::new(rating, at));
            assert_schedulable(&result.state);
            assert!(result.state.stability <= 36500.0);
        }
    }
}

#[test]
fn test_review_at_end_of_calendar_saturates() {
    let scheduler = FSRSScheduler::default();
    let last = chrono::DateTime::<chrono::Utc>::MAX_UTC - Duration::days(40);
    let state = TestDataFactory::review_state(30.0, 5.0, last);
    let at = chrono::DateTime::<chrono::Utc>::MAX_UTC - Duration::days(10);

    for rating in Rating::ALL {
        let result = scheduler.review("late", &state, ReviewOutcome::new(rating, at));
        assert_schedulable(&result.state);
        assert!(result.state.due >= at);
    }
}

// ==================== Configuration ====================

#[test]
fn test_invalid_configs_are_rejected() {
    let bad = [
        SchedulerConfig {
            desired_retention: 0.0,
            ..Default::default()
        },
        SchedulerConfig {
            desired_retention: f64::NAN,
            ..Default::default()
        },
        SchedulerConfig {
            minimum_interval: 0,
            ..Default::default()
        },
        SchedulerConfig {
            minimum_interval: 100,
            maximum_interval: 10,
            ..Default::default()
        },
        SchedulerConfig {
            relearning_steps: vec![10, 0],
            ..Default::default()
        },
        SchedulerConfig {
            desired_retention: 0.01,
            maximum_interval: u32::MAX,
            ..Default::default()
        },
    ];
    for config in &bad {
        assert!(FSRSScheduler::new(config).is_err());
    }
}

#[test]
fn test_missing_item_is_an_error_not_a_panic() {
    let env = TestStoreManager::new_temp();
    let outcome = ReviewOutcome::new(Rating::Good, env.now());
    assert!(env.store.mark_reviewed(&env.scheduler, "ghost", outcome).is_err());
}
