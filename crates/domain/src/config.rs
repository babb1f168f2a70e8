//! Configuration structures
//!
//! Every section deserializes with defaults for missing fields, so a config
//! file only needs to name what it overrides. Builders validate on `build()`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_LOG_LEVEL, DEFAULT_MAX_TARGET_FAILURES,
    DEFAULT_MIN_DISTINCT_SOURCES, DEFAULT_RESERVOIR_CAPACITY, DEFAULT_RETRIES,
    DEFAULT_RETRY_ON_STATUS, DEFAULT_TIMEOUT_SECS, MAX_RETRIES,
};
use crate::errors::{DataCollectorError, Result};

/* -------------------------------------------------------------------------- */
/* Client */
/* -------------------------------------------------------------------------- */

/// Request client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub retries: u32,
    /// Base of the exponential delay between attempts
    pub backoff_factor: u32,
    /// Statuses that trigger a retry while attempts remain
    pub retry_on_status: Vec<u16>,
    /// Write 2xx response bodies to `save_dir`
    pub save_responses: bool,
    pub save_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            retry_on_status: DEFAULT_RETRY_ON_STATUS.to_vec(),
            save_responses: false,
            save_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Per-attempt timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `DataCollectorError::Config` when a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(DataCollectorError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retries > MAX_RETRIES {
            return Err(DataCollectorError::Config(format!(
                "retries must be at most {MAX_RETRIES}, got {}",
                self.retries
            )));
        }

        if self.backoff_factor == 0 {
            return Err(DataCollectorError::Config(
                "backoff_factor must be at least 1".to_string(),
            ));
        }

        if let Some(status) = self.retry_on_status.iter().find(|s| !(100..=599).contains(*s)) {
            return Err(DataCollectorError::Config(format!(
                "retry_on_status contains invalid HTTP status {status}"
            )));
        }

        Ok(())
    }
}

/// Builder for `ClientConfig`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self { config: ClientConfig::default() }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    pub fn backoff_factor(mut self, factor: u32) -> Self {
        self.config.backoff_factor = factor;
        self
    }

    pub fn retry_on_status(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.config.retry_on_status = statuses.into();
        self
    }

    /// Enable automatic saving of 2xx bodies under `dir`
    pub fn save_responses(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.save_responses = true;
        self.config.save_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/* -------------------------------------------------------------------------- */
/* Metrics */
/* -------------------------------------------------------------------------- */

/// Shared metrics collector configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Samples kept per domain and per proxy
    pub reservoir_capacity: usize,
    /// Failures since the last success before a target may be unhealthy
    pub max_target_failures: u32,
    /// Distinct proxy keys among those failures before a target is unhealthy
    pub min_distinct_sources: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            reservoir_capacity: DEFAULT_RESERVOIR_CAPACITY,
            max_target_failures: DEFAULT_MAX_TARGET_FAILURES,
            min_distinct_sources: DEFAULT_MIN_DISTINCT_SOURCES,
        }
    }
}

impl MetricsConfig {
    pub fn builder() -> MetricsConfigBuilder {
        MetricsConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `DataCollectorError::Config` when a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.reservoir_capacity == 0 {
            return Err(DataCollectorError::Config(
                "reservoir_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for `MetricsConfig`
#[derive(Debug, Default)]
pub struct MetricsConfigBuilder {
    config: MetricsConfig,
}

impl MetricsConfigBuilder {
    pub fn new() -> Self {
        Self { config: MetricsConfig::default() }
    }

    pub fn reservoir_capacity(mut self, capacity: usize) -> Self {
        self.config.reservoir_capacity = capacity;
        self
    }

    pub fn max_target_failures(mut self, failures: u32) -> Self {
        self.config.max_target_failures = failures;
        self
    }

    pub fn min_distinct_sources(mut self, sources: usize) -> Self {
        self.config.min_distinct_sources = sources;
        self
    }

    pub fn build(self) -> Result<MetricsConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/* -------------------------------------------------------------------------- */
/* Logging */
/* -------------------------------------------------------------------------- */

/// Process-level logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}

/* -------------------------------------------------------------------------- */
/* Settings */
/* -------------------------------------------------------------------------- */

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        self.metrics.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retries, 3);
        assert_eq!(config.backoff_factor, 2);
        assert_eq!(config.retry_on_status, vec![429, 500, 502, 503, 504]);
        assert!(!config.save_responses);
        assert!(config.validate().is_ok());
    }

    /// Validates `ClientConfigBuilder` range checks.
    ///
    /// Assertions:
    /// - Ensures zero timeout, zero backoff factor, excessive retries and
    ///   out-of-range statuses are rejected.
    #[test]
    fn client_builder_rejects_out_of_range_values() {
        assert!(ClientConfig::builder().timeout_secs(0).build().is_err());
        assert!(ClientConfig::builder().backoff_factor(0).build().is_err());
        assert!(ClientConfig::builder().retries(MAX_RETRIES + 1).build().is_err());
        assert!(ClientConfig::builder().retry_on_status(vec![500, 1000]).build().is_err());
    }

    #[test]
    fn client_builder_save_responses_sets_dir() {
        let config = ClientConfig::builder().save_responses("/tmp/out").retries(0).build().unwrap();
        assert!(config.save_responses);
        assert_eq!(config.save_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.retries, 0);
    }

    #[test]
    fn metrics_builder_rejects_zero_capacity() {
        let err = MetricsConfig::builder().reservoir_capacity(0).build().unwrap_err();
        assert!(matches!(err, DataCollectorError::Config(_)));
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"client": {"retries": 1}, "logging": {"json": true}}"#)
                .unwrap();

        assert_eq!(settings.client.retries, 1);
        assert_eq!(settings.client.timeout_secs, 30);
        assert_eq!(settings.metrics, MetricsConfig::default());
        assert!(settings.logging.json);
        assert_eq!(settings.logging.level, "info");
    }
}
