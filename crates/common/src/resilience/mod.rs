//! Resilience primitives for outbound calls
//!
//! This module provides **generic, reusable** building blocks:
//! - **Backoff**: delay calculation between retry attempts plus the `Sleeper`
//!   seam that lets the same retry loop block a thread or suspend a task
//! - **Clock**: monotonic and wall-clock time behind a trait so tests can
//!   freeze or advance time
//! - **Reservoir**: bounded uniform sampling (Algorithm R) and nearest-rank
//!   percentiles for latency statistics
//!
//! Nothing here knows about HTTP; the request engine in `datacollector-core`
//! composes these pieces.

pub mod backoff;
pub mod clock;
pub mod reservoir;

pub use backoff::{BackoffStrategy, RecordingSleeper, Sleeper, SystemSleeper};
pub use clock::{Clock, MockClock, SystemClock};
pub use reservoir::{percentile, Reservoir, DEFAULT_RESERVOIR_CAPACITY};
