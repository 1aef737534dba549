// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler configuration
//!
//! Loaded from TOML with human-readable durations:
//!
//! ```toml
//! max_concurrent_operations = 4
//! minimum_sleep = "1s"
//! fallback_budget = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for the scheduler core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Size of the worker pool running operation chains
    pub max_concurrent_operations: usize,
    /// Floor for the sleep/wake interval
    #[serde(with = "humantime_serde")]
    pub minimum_sleep: Duration,
    /// Ordering budget used when the host reports no restriction
    #[serde(with = "humantime_serde")]
    pub fallback_budget: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_operations: 4,
            minimum_sleep: Duration::from_secs(1),
            fallback_budget: None,
        }
    }
}

impl SchedulerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_operations == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_operations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fallback_budget == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid {
                field: "fallback_budget",
                reason: "must be greater than zero when set".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_max_concurrent_operations(mut self, count: usize) -> Self {
        self.max_concurrent_operations = count;
        self
    }

    pub fn with_minimum_sleep(mut self, minimum_sleep: Duration) -> Self {
        self.minimum_sleep = minimum_sleep;
        self
    }

    pub fn with_fallback_budget(mut self, budget: Duration) -> Self {
        self.fallback_budget = Some(budget);
        self
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
