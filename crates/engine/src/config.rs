// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Foreman configuration: defaults, TOML file, then environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Runtime settings for one Foreman loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForemanConfig {
    /// Pause between ticks
    pub tick_interval: Duration,
    /// Agents not seen within this window are offline and never planned
    pub online_window: Duration,
    /// Applied to monitoring artifacts that do not set their own max-wait
    pub default_max_wait: Duration,
    /// Lifetime given to jobs created without an explicit expiry
    pub default_job_expiry: Duration,
    /// Agents fetched per directory page
    pub page_size: usize,
}

impl Default for ForemanConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            online_window: Duration::from_secs(60 * 60),
            default_max_wait: Duration::from_secs(120),
            default_job_expiry: Duration::from_secs(7 * 24 * 60 * 60),
            page_size: 1000,
        }
    }
}

/// On-disk form. Every key is optional; missing keys keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    tick_interval_ms: Option<u64>,
    online_window_secs: Option<u64>,
    default_max_wait_secs: Option<u64>,
    job_expiry_secs: Option<u64>,
    page_size: Option<usize>,
}

impl ForemanConfig {
    /// Load from an optional TOML file, then apply `FM_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = Self::default();
        config.merge(file);
        config.validate()?;
        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(ms) = file.tick_interval_ms {
            self.tick_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = file.online_window_secs {
            self.online_window = Duration::from_secs(secs);
        }
        if let Some(secs) = file.default_max_wait_secs {
            self.default_max_wait = Duration::from_secs(secs);
        }
        if let Some(secs) = file.job_expiry_secs {
            self.default_job_expiry = Duration::from_secs(secs);
        }
        if let Some(size) = file.page_size {
            self.page_size = size;
        }
    }

    fn apply_env(&mut self) {
        self.merge(ConfigFile {
            tick_interval_ms: env_u64("FM_TICK_INTERVAL_MS"),
            online_window_secs: env_u64("FM_ONLINE_WINDOW_SECS"),
            default_max_wait_secs: env_u64("FM_DEFAULT_MAX_WAIT_SECS"),
            job_expiry_secs: env_u64("FM_JOB_EXPIRY_SECS"),
            page_size: env_u64("FM_PAGE_SIZE").map(|n| n as usize),
        });
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid("tick interval must be positive"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page size must be positive"));
        }
        Ok(())
    }

    /// Oldest last-seen time that still counts as online at `now_ms`.
    pub fn online_cutoff_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.online_window.as_millis() as u64)
    }
}

fn env_u64(var: &str) -> Option<u64> {
    let value = std::env::var(var).ok()?;
    match value.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(var, value = %value, "ignoring unparsable environment override");
            None
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
