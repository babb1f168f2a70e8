//! Settings loader
//!
//! Loads [`Settings`] from a config file and environment variables.
//!
//! ## Loading Strategy
//! 1. Probe the standard locations for a config file; use defaults if none
//!    exists
//! 2. Layer environment variables over the result
//! 3. Validate every section
//!
//! ## Environment Variables
//! - `DATACOLLECTOR_REQUEST_TIMEOUT`: Per-attempt timeout in seconds
//! - `DATACOLLECTOR_REQUEST_RETRIES`: Retries after the first attempt
//! - `DATACOLLECTOR_REQUEST_BACKOFF_FACTOR`: Exponential backoff base
//! - `DATACOLLECTOR_REQUEST_RETRY_ON_STATUS`: Comma-separated status codes
//! - `DATACOLLECTOR_SAVE_DIR`: Enables response saving into this directory
//! - `DATACOLLECTOR_RESERVOIR_CAPACITY`: Latency samples kept per key
//! - `DATACOLLECTOR_MAX_TARGET_FAILURES`: Circuit-breaker failure threshold
//! - `DATACOLLECTOR_MIN_DISTINCT_SOURCES`: Circuit-breaker source threshold
//! - `DATACOLLECTOR_LOG_LEVEL`: Default tracing filter
//! - `DATACOLLECTOR_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./datacollector.toml` or `./datacollector.json`
//! 2. `./config.toml` or `./config.json`
//! 3. The same names in the parent directory
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use datacollector_domain::{DataCollectorError, Result, Settings};

const FILE_NAMES: [&str; 4] = ["datacollector.toml", "datacollector.json", "config.toml", "config.json"];

/// Load settings from the probed config file (or defaults) plus environment
/// overrides
///
/// # Errors
/// Returns `DataCollectorError::Config` if the file is malformed, an
/// environment variable has an invalid value, or validation fails.
pub fn load() -> Result<Settings> {
    let mut settings = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Settings::default()
        }
    };

    apply_env_overrides(&mut settings)?;
    settings.validate()?;
    Ok(settings)
}

/// Defaults with environment overrides applied
///
/// # Errors
/// Returns `DataCollectorError::Config` for unparsable or out-of-range
/// values.
pub fn load_from_env() -> Result<Settings> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// extension (`.toml` or `.json`). Missing fields take their defaults.
///
/// # Errors
/// Returns `DataCollectorError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Settings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DataCollectorError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DataCollectorError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DataCollectorError::Config(format!("Failed to read config file: {e}")))?;

    parse_settings(&contents, &config_path)
}

fn parse_settings(contents: &str, path: &Path) -> Result<Settings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DataCollectorError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DataCollectorError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DataCollectorError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a config file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Layer `DATACOLLECTOR_*` environment variables over `settings`
///
/// # Errors
/// Returns `DataCollectorError::Config` if a variable cannot be parsed.
pub fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
    apply_overrides(settings, |key| std::env::var(key).ok())
}

/// Layer overrides from `lookup` over `settings`; `lookup` maps a variable
/// name to its value
///
/// # Errors
/// Returns `DataCollectorError::Config` if a value cannot be parsed.
pub fn apply_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let client = &mut settings.client;
    if let Some(timeout) = parse_var(&lookup, "DATACOLLECTOR_REQUEST_TIMEOUT")? {
        client.timeout_secs = timeout;
    }
    if let Some(retries) = parse_var(&lookup, "DATACOLLECTOR_REQUEST_RETRIES")? {
        client.retries = retries;
    }
    if let Some(factor) = parse_var(&lookup, "DATACOLLECTOR_REQUEST_BACKOFF_FACTOR")? {
        client.backoff_factor = factor;
    }
    if let Some(list) = lookup("DATACOLLECTOR_REQUEST_RETRY_ON_STATUS") {
        client.retry_on_status = parse_status_list(&list)?;
    }
    if let Some(dir) = lookup("DATACOLLECTOR_SAVE_DIR").filter(|d| !d.trim().is_empty()) {
        client.save_responses = true;
        client.save_dir = Some(PathBuf::from(dir));
    }

    let metrics = &mut settings.metrics;
    if let Some(capacity) = parse_var(&lookup, "DATACOLLECTOR_RESERVOIR_CAPACITY")? {
        metrics.reservoir_capacity = capacity;
    }
    if let Some(failures) = parse_var(&lookup, "DATACOLLECTOR_MAX_TARGET_FAILURES")? {
        metrics.max_target_failures = failures;
    }
    if let Some(sources) = parse_var(&lookup, "DATACOLLECTOR_MIN_DISTINCT_SOURCES")? {
        metrics.min_distinct_sources = sources;
    }

    if let Some(level) = lookup("DATACOLLECTOR_LOG_LEVEL") {
        settings.logging.level = level;
    }
    if let Some(json) = lookup("DATACOLLECTOR_LOG_JSON") {
        settings.logging.json = parse_bool(&json);
    }

    Ok(())
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| DataCollectorError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

fn parse_status_list(raw: &str) -> Result<Vec<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>().map_err(|e| {
                DataCollectorError::Config(format!("Invalid status code '{s}' in retry list: {e}"))
            })
        })
        .collect()
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
