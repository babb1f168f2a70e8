//! Modular common utilities shared across DataCollector crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification
//! - `runtime`: resilience primitives (backoff, sleepers, clocks, sampling
//!   reservoirs)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{error_chain, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{
    percentile, BackoffStrategy, Clock, MockClock, RecordingSleeper, Reservoir, Sleeper,
    SystemClock, SystemSleeper, DEFAULT_RESERVOIR_CAPACITY,
};
