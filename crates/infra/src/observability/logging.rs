//! Tracing subscriber installation
//!
//! `RUST_LOG` wins when set and valid; otherwise the configured level is
//! used, and an unparsable level falls back to `info`.

use datacollector_domain::constants::DEFAULT_LOG_LEVEL;
use datacollector_domain::{DataCollectorError, LoggingConfig, Result};
use tracing_subscriber::EnvFilter;

/// Filter for `config`, honouring `RUST_LOG`
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber
///
/// # Errors
/// Returns `DataCollectorError::Internal` if a global subscriber is already
/// installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|err| {
        DataCollectorError::Internal(format!("failed to install tracing subscriber: {err}"))
    })?;

    tracing::debug!(level = %config.level, json = config.json, "tracing initialized");
    Ok(())
}
