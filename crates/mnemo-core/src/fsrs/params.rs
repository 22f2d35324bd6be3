//! Parameter Store
//!
//! Owns the 21-weight FSRS-6 vector (w0..w20) and its validation.
//!
//! Weights usually arrive from user configuration, so every vector is checked
//! against the per-index range table before it reaches a formula. Validation is
//! all-or-nothing: a single bad weight discards the whole vector in favour of
//! [`FSRS6_WEIGHTS`].

use serde::{Deserialize, Serialize};
use std::ops::Index;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of weights in an FSRS-6 parameter vector
pub const PARAMETER_COUNT: usize = 21;

/// Published FSRS-6 default weights
pub const FSRS6_WEIGHTS: [f64; PARAMETER_COUNT] = [
    0.212,  // w0: initial stability (Again)
    1.2931, // w1: initial stability (Hard)
    2.3065, // w2: initial stability (Good)
    8.2956, // w3: initial stability (Easy)
    6.4133, // w4: initial difficulty base
    0.8334, // w5: initial difficulty rating slope
    3.0194, // w6: difficulty delta per rating
    0.001,  // w7: difficulty mean reversion
    1.8722, // w8: recall stability growth
    0.1666, // w9: recall stability saturation
    0.796,  // w10: recall retrievability gain
    1.4835, // w11: forget stability base
    0.0614, // w12: forget difficulty exponent
    0.2629, // w13: forget stability exponent
    1.6483, // w14: forget retrievability gain
    0.6014, // w15: hard penalty
    1.8729, // w16: easy bonus
    0.5425, // w17: short-term rating gain
    0.0912, // w18: short-term rating offset
    0.0658, // w19: short-term stability saturation
    0.1542, // w20: forgetting curve decay
];

/// Inclusive `[min, max]` range for each weight.
///
/// Persisted items were scheduled against these bounds; they must not change.
pub const PARAMETER_RANGES: [(f64, f64); PARAMETER_COUNT] = [
    (0.1, 2.0),     // w0
    (0.1, 5.0),     // w1
    (0.1, 10.0),    // w2
    (0.1, 100.0),   // w3
    (1.0, 10.0),    // w4
    (0.001, 4.0),   // w5
    (0.001, 4.0),   // w6
    (0.0, 0.5),     // w7
    (0.0, 4.5),     // w8
    (0.0, 0.8),     // w9
    (0.001, 3.5),   // w10
    (0.001, 5.0),   // w11
    (0.001, 0.25),  // w12
    (0.001, 0.9),   // w13
    (0.0, 4.0),     // w14
    (0.0, 1.0),     // w15
    (1.0, 6.0),     // w16
    (0.0, 2.0),     // w17
    (0.0, 2.0),     // w18
    (0.0, 1.0),     // w19
    (0.1, 0.8),     // w20
];

/// Human-readable weight names, index-aligned with [`PARAMETER_RANGES`]
pub const PARAMETER_NAMES: [&str; PARAMETER_COUNT] = [
    "initial stability (again)",
    "initial stability (hard)",
    "initial stability (good)",
    "initial stability (easy)",
    "initial difficulty base",
    "initial difficulty slope",
    "difficulty delta",
    "difficulty mean reversion",
    "recall growth",
    "recall saturation",
    "recall retrievability gain",
    "forget base",
    "forget difficulty exponent",
    "forget stability exponent",
    "forget retrievability gain",
    "hard penalty",
    "easy bonus",
    "short-term gain",
    "short-term offset",
    "short-term saturation",
    "curve decay",
];

// ============================================================================
// ERRORS
// ============================================================================

/// A single validation failure
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    /// Vector does not hold exactly 21 weights
    #[error("expected {expected} weights, found {found}")]
    WrongLength { expected: usize, found: usize },
    /// NaN or infinite weight
    #[error("w{index} is not finite ({value})")]
    NonFinite { index: usize, value: f64 },
    /// Weight outside its documented range
    #[error("w{index} ({name}) = {value} is outside [{min}, {max}]")]
    OutOfRange {
        index: usize,
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Outcome of validating a candidate weight vector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Every violation found, in index order
    pub errors: Vec<ParameterError>,
}

impl ValidationResult {
    /// True when no violation was found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// A validated FSRS-6 weight vector.
///
/// Only constructible through [`ParameterStore::effective`], [`Parameters::try_new`]
/// or `Default`, so every instance satisfies the range table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters([f64; PARAMETER_COUNT]);

impl Parameters {
    /// Validate `weights` and wrap them, or return every violation
    pub fn try_new(weights: &[f64]) -> Result<Self, ValidationResult> {
        let result = ParameterStore::validate(weights);
        if !result.is_valid() {
            return Err(result);
        }
        let mut w = [0.0; PARAMETER_COUNT];
        w.copy_from_slice(weights);
        Ok(Self(w))
    }

    /// The raw weights
    pub fn as_array(&self) -> &[f64; PARAMETER_COUNT] {
        &self.0
    }

    /// Forgetting-curve exponent (`-w20`)
    #[inline]
    pub fn decay(&self) -> f64 {
        -self.0[20]
    }

    /// Curve scale chosen so that `R(t = S) = 0.9`
    #[inline]
    pub fn factor(&self) -> f64 {
        0.9_f64.powf(1.0 / self.decay()) - 1.0
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self(FSRS6_WEIGHTS)
    }
}

impl Index<usize> for Parameters {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Vec::<f64>::deserialize(deserializer)?;
        Parameters::try_new(&raw).map_err(|result| {
            let reasons: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
            serde::de::Error::custom(reasons.join("; "))
        })
    }
}

// ============================================================================
// STORE
// ============================================================================

/// One row of the parameter diagnostics table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterReport {
    pub index: usize,
    pub name: &'static str,
    /// Supplied value, `None` when the vector is too short to have one
    pub value: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub in_range: bool,
}

/// Validation and fallback for weight vectors. Pure: callers decide how to log.
pub struct ParameterStore;

impl ParameterStore {
    /// Check length, finiteness and per-index range of `weights`
    pub fn validate(weights: &[f64]) -> ValidationResult {
        let mut errors = Vec::new();

        if weights.len() != PARAMETER_COUNT {
            errors.push(ParameterError::WrongLength {
                expected: PARAMETER_COUNT,
                found: weights.len(),
            });
        }

        for (index, &value) in weights.iter().enumerate().take(PARAMETER_COUNT) {
            if !value.is_finite() {
                errors.push(ParameterError::NonFinite { index, value });
                continue;
            }
            let (min, max) = PARAMETER_RANGES[index];
            if value < min || value > max {
                errors.push(ParameterError::OutOfRange {
                    index,
                    name: PARAMETER_NAMES[index],
                    value,
                    min,
                    max,
                });
            }
        }

        ValidationResult { errors }
    }

    /// `weights` if valid, otherwise the built-in default vector
    pub fn effective(weights: &[f64]) -> Parameters {
        Parameters::try_new(weights).unwrap_or_default()
    }

    /// Like [`ParameterStore::effective`], also returning the validation verdict
    pub fn resolve(weights: &[f64]) -> (Parameters, ValidationResult) {
        match Parameters::try_new(weights) {
            Ok(params) => (params, ValidationResult::default()),
            Err(result) => (Parameters::default(), result),
        }
    }

    /// Per-index diagnostics for `weights`
    pub fn report(weights: &[f64]) -> Vec<ParameterReport> {
        (0..PARAMETER_COUNT)
            .map(|index| {
                let (min, max) = PARAMETER_RANGES[index];
                let value = weights.get(index).copied();
                let in_range = value.is_some_and(|v| v.is_finite() && v >= min && v <= max);
                ParameterReport {
                    index,
                    name: PARAMETER_NAMES[index],
                    value,
                    min,
                    max,
                    default: FSRS6_WEIGHTS[index],
                    in_range,
                }
            })
            .collect()
    }
}
