//! Scheduler Configuration
//!
//! Everything a host can tune: retention target, interval bounds, fuzz, learning
//! steps and the weight vector. Loaded from JSON, then overridden from the
//! environment:
//!
//! - `MNEMO_DESIRED_RETENTION` (float in (0, 1))
//! - `MNEMO_MAXIMUM_INTERVAL` (days)
//! - `MNEMO_ENABLE_FUZZ` (`true`/`false`/`1`/`0`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fsrs::{
    DEFAULT_MAXIMUM_INTERVAL, DEFAULT_MINIMUM_INTERVAL, DEFAULT_RETENTION, FSRS6_WEIGHTS,
    IntervalScheduler,
};

/// Environment variable overriding `desiredRetention`
pub const ENV_DESIRED_RETENTION: &str = "MNEMO_DESIRED_RETENTION";
/// Environment variable overriding `maximumInterval`
pub const ENV_MAXIMUM_INTERVAL: &str = "MNEMO_MAXIMUM_INTERVAL";
/// Environment variable overriding `enableFuzz`
pub const ENV_ENABLE_FUZZ: &str = "MNEMO_ENABLE_FUZZ";

/// Configuration error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid JSON for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    /// Retention target outside (0, 1)
    #[error("desired retention must be in (0, 1), got {0}")]
    InvalidRetention(f64),
    /// Minimum interval of zero days
    #[error("minimum interval must be at least 1 day")]
    ZeroMinimumInterval,
    /// Maximum interval beyond the longest representable stability
    #[error("maximum interval {max} exceeds the limit of {limit} days")]
    MaximumIntervalTooLong { max: u32, limit: u32 },
    /// Bounds in the wrong order
    #[error("minimum interval {min} exceeds maximum interval {max}")]
    IntervalBounds { min: u32, max: u32 },
    /// A learning or relearning step of zero minutes
    #[error("learning steps must be at least one minute")]
    ZeroStep,
}

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// Target recall probability at the due date
    pub desired_retention: f64,
    /// Shortest Review interval in days
    pub minimum_interval: u32,
    /// Longest Review interval in days
    pub maximum_interval: u32,
    /// Spread Review intervals with deterministic fuzz
    pub enable_fuzz: bool,
    /// Learning steps in minutes
    pub learning_steps: Vec<u32>,
    /// Relearning steps in minutes
    pub relearning_steps: Vec<u32>,
    /// 21 FSRS-6 weights; invalid vectors fall back to the defaults
    pub parameters: Vec<f64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            desired_retention: DEFAULT_RETENTION,
            minimum_interval: DEFAULT_MINIMUM_INTERVAL,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            enable_fuzz: true,
            learning_steps: vec![1, 10],
            relearning_steps: vec![10],
            parameters: FSRS6_WEIGHTS.to_vec(),
        }
    }
}

impl SchedulerConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `MNEMO_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DESIRED_RETENTION) {
            match raw.trim().parse::<f64>() {
                Ok(value) => self.desired_retention = value,
                Err(_) => warn!(var = ENV_DESIRED_RETENTION, value = %raw, "ignoring unparseable override"),
            }
        }
        if let Some(raw) = lookup(ENV_MAXIMUM_INTERVAL) {
            match raw.trim().parse::<u32>() {
                Ok(value) => self.maximum_interval = value,
                Err(_) => warn!(var = ENV_MAXIMUM_INTERVAL, value = %raw, "ignoring unparseable override"),
            }
        }
        if let Some(raw) = lookup(ENV_ENABLE_FUZZ) {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.enable_fuzz = true,
                "0" | "false" | "no" | "off" => self.enable_fuzz = false,
                _ => warn!(var = ENV_ENABLE_FUZZ, value = %raw, "ignoring unparseable override"),
            }
        }
        self
    }

    /// Check the scalar settings. Weights are not checked here; they fall back instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = self.desired_retention;
        if !(r.is_finite() && r > 0.0 && r < 1.0) {
            return Err(ConfigError::InvalidRetention(r));
        }
        if self.minimum_interval == 0 {
            return Err(ConfigError::ZeroMinimumInterval);
        }
        if self.maximum_interval > DEFAULT_MAXIMUM_INTERVAL {
            return Err(ConfigError::MaximumIntervalTooLong {
                max: self.maximum_interval,
                limit: DEFAULT_MAXIMUM_INTERVAL,
            });
        }
        if self.minimum_interval > self.maximum_interval {
            return Err(ConfigError::IntervalBounds {
                min: self.minimum_interval,
                max: self.maximum_interval,
            });
        }
        if self
            .learning_steps
            .iter()
            .chain(&self.relearning_steps)
            .any(|&m| m == 0)
        {
            return Err(ConfigError::ZeroStep);
        }
        Ok(())
    }

    /// The interval part of this config
    pub fn interval_scheduler(&self) -> IntervalScheduler {
        IntervalScheduler {
            desired_retention: self.desired_retention,
            minimum_interval: self.minimum_interval,
            maximum_interval: self.maximum_interval,
            enable_fuzz: self.enable_fuzz,
        }
    }
}
