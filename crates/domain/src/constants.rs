//! Request engine constants
//!
//! Centralized location for the defaults and sentinels shared by the client,
//! the metrics collector and the configuration loader.

// Client defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: u32 = 2;
pub const DEFAULT_RETRY_ON_STATUS: [u16; 5] = [429, 500, 502, 503, 504];
pub const MAX_RETRIES: u32 = 100;

// Statuses that end the attempt loop immediately
pub const NO_RETRY_STATUSES: [u16; 3] = [401, 403, 404];

// Collector defaults
pub const DEFAULT_RESERVOIR_CAPACITY: usize = 1000;
pub const DEFAULT_MAX_TARGET_FAILURES: u32 = 3;
pub const DEFAULT_MIN_DISTINCT_SOURCES: usize = 2;

// Metric keys
pub const DIRECT_PROXY_KEY: &str = "direct";
pub const UNKNOWN_PROXY_KEY: &str = "unknown";
pub const SERVICE_DOMAIN: &str = "soap";
pub const SERVICE_SUCCESS_STATUS: u16 = 200;

// Auto-save naming
pub const SAVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";
pub const SAVE_INDEX_NAME: &str = "index";

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
