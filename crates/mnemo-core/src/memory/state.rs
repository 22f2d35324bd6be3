//! Per-item memory record
//!
//! [`MemoryState`] is what the storage layer persists for each learning item.
//! Only [`crate::fsrs::FSRSScheduler`] produces new values of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::Parameters;
use crate::fsrs::algorithm::{MAX_DIFFICULTY, MIN_DIFFICULTY, retrievability};

/// Difficulty given to an item before its first review
pub const DEFAULT_DIFFICULTY: f64 = 5.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ============================================================================
// RATING
// ============================================================================

/// The grade a reviewer gives a single review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Rating {
    /// Forgot the item
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Rating {
    /// All ratings in grade order
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Numeric grade 1..=4 used by the formulas
    #[inline]
    pub fn grade(self) -> f64 {
        self as u8 as f64
    }

    /// Zero-based index into rating-indexed weights
    #[inline]
    pub fn index(self) -> usize {
        self as usize - 1
    }

    /// True for every rating except `Again`
    #[inline]
    pub fn is_recalled(self) -> bool {
        self != Rating::Again
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    /// Parse a rating name or its numeric grade
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "again" | "1" => Some(Rating::Again),
            "hard" | "2" => Some(Rating::Hard),
            "good" | "3" => Some(Rating::Good),
            "easy" | "4" => Some(Rating::Easy),
            _ => None,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ITEM STATE
// ============================================================================

/// Lifecycle position of an item
///
/// `New → Learning → Review ⇄ Relearning`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Never reviewed
    #[default]
    New,
    /// Working through the initial learning steps
    Learning,
    /// Graduated; scheduled in days by stability
    Review,
    /// Lapsed from Review, working through relearning steps
    Relearning,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::New => "new",
            ItemState::Learning => "learning",
            ItemState::Review => "review",
            ItemState::Relearning => "relearning",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(ItemState::New),
            "learning" => Some(ItemState::Learning),
            "review" => Some(ItemState::Review),
            "relearning" => Some(ItemState::Relearning),
            _ => None,
        }
    }

    /// Learning and Relearning are driven by fixed steps, not stability
    #[inline]
    pub fn is_stepping(&self) -> bool {
        matches!(self, ItemState::Learning | ItemState::Relearning)
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CORRUPTION
// ============================================================================

/// Why a stored record cannot be scheduled as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corruption {
    /// Reviewed lifecycle state without a last review timestamp
    MissingLastReview,
    /// NaN, infinite or negative stability
    InvalidStability,
    /// Reviewed lifecycle state with zero stability
    UninitializedStability,
    /// NaN or infinite difficulty
    InvalidDifficulty,
    /// More lapses than reviews
    LapsesExceedReps,
}

impl std::fmt::Display for Corruption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Corruption::MissingLastReview => "reviewed item has no last review",
            Corruption::InvalidStability => "stability is not a finite non-negative number",
            Corruption::UninitializedStability => "reviewed item has zero stability",
            Corruption::InvalidDifficulty => "difficulty is not finite",
            Corruption::LapsesExceedReps => "lapses exceed reps",
        };
        f.write_str(text)
    }
}

// ============================================================================
// MEMORY STATE
// ============================================================================

/// Scheduling state of one learning item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Days until recall probability falls to 90%; 0 before the first review
    pub stability: f64,
    /// Intrinsic hardness, 1.0 (easy) to 10.0 (hard)
    pub difficulty: f64,
    /// Next scheduled review
    pub due: DateTime<Utc>,
    /// Most recent review, absent before the first one
    pub last_review: Option<DateTime<Utc>>,
    /// Actual days between the last two reviews
    pub elapsed_days: f64,
    /// Planned days until `due` at the last review
    pub scheduled_days: f64,
    pub reps: u32,
    pub lapses: u32,
    pub state: ItemState,
    /// Position in the learning/relearning step list
    #[serde(default)]
    pub step: u32,
    /// Recall probability computed at the last review (cached, not authoritative)
    pub retrievability: f64,
}

impl MemoryState {
    /// A never-reviewed item, due immediately
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            stability: 0.0,
            difficulty: DEFAULT_DIFFICULTY,
            due: now,
            last_review: None,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            reps: 0,
            lapses: 0,
            state: ItemState::New,
            step: 0,
            retrievability: 0.0,
        }
    }

    /// First field combination that makes this record unschedulable, if any
    pub fn corruption(&self) -> Option<Corruption> {
        if !self.stability.is_finite() || self.stability < 0.0 {
            return Some(Corruption::InvalidStability);
        }
        if !self.difficulty.is_finite() {
            return Some(Corruption::InvalidDifficulty);
        }
        if self.lapses > self.reps {
            return Some(Corruption::LapsesExceedReps);
        }
        if self.state != ItemState::New {
            if self.last_review.is_none() {
                return Some(Corruption::MissingLastReview);
            }
            if self.stability == 0.0 {
                return Some(Corruption::UninitializedStability);
            }
        }
        None
    }

    /// Fresh New record that keeps the review counters and due date
    pub fn reset(&self) -> Self {
        let reps = self.reps;
        Self {
            reps,
            lapses: self.lapses.min(reps),
            ..Self::new(self.due)
        }
    }

    /// Fractional days since the last review, clamped at zero
    pub fn days_since_review(&self, now: DateTime<Utc>) -> f64 {
        match self.last_review {
            Some(last) => days_between(last, now),
            None => 0.0,
        }
    }

    /// Recall probability at `now`, assuming no review in between
    pub fn retrievability_at(&self, now: DateTime<Utc>, params: &Parameters) -> f64 {
        retrievability(self.days_since_review(now), self.stability, params)
    }

    /// Whether the item should be presented at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Difficulty pulled into the legal range
    pub(crate) fn clamped_difficulty(&self) -> f64 {
        self.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }
}

/// Fractional days from `from` to `to`, never negative
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds();
    (millis as f64 / 1000.0 / SECONDS_PER_DAY).max(0.0)
}
