//! Solve tuning parameters, loadable from TOML.
//!
//! # Examples
//!
//! ```
//! use medrota_engine::config::SolveParams;
//!
//! let params = SolveParams::from_toml_str(r#"
//!     time_limit_ms = 8000
//!     shard_days = 7
//!
//!     [weights]
//!     preference = 200
//! "#).unwrap();
//!
//! assert_eq!(params.time_limit_ms, 8000);
//! assert_eq!(params.shard_days, Some(7));
//! ```
//!
//! Fall back to defaults when no file is present:
//!
//! ```
//! use medrota_engine::config::SolveParams;
//!
//! let params = SolveParams::load("solve.toml").unwrap_or_default();
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::weights::Weights;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tuning knobs of one solve run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolveParams {
    /// Global wall-clock budget for the whole request.
    pub time_limit_ms: u64,
    /// Split the range into shards of at most this many days.
    pub shard_days: Option<u32>,
    /// Nodes between cooperative cancellation checks in the backend.
    pub node_check_interval: u64,
    /// When false, at most one assignment per clinician and day.
    pub allow_multiple_shifts_per_day: bool,
    pub weights: Weights,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_limit_ms: 4_000,
            shard_days: None,
            node_check_interval: 256,
            allow_multiple_shifts_per_day: true,
            weights: Weights::default(),
        }
    }
}

impl SolveParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads parameters from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses parameters from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_ms == 0 {
            return Err(ConfigError::Invalid("time_limit_ms must be positive".into()));
        }
        if self.shard_days == Some(0) {
            return Err(ConfigError::Invalid("shard_days must be positive".into()));
        }
        Ok(())
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_shard_days(mut self, days: u32) -> Self {
        self.shard_days = Some(days);
        self
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SolveParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_budget() {
        assert!(SolveParams::from_toml_str("time_limit_ms = 0").is_err());
    }

    #[test]
    fn weight_overrides_merge_with_defaults() {
        let params = SolveParams::from_toml_str(
            r#"
            [weights]
            coverage = 5000000
            "#,
        )
        .unwrap();
        assert_eq!(params.weights.coverage, 5_000_000);
        assert_eq!(params.weights.preference, Weights::default().preference);
    }
}
