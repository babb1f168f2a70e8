//! Resilient outbound request engine
//!
//! - `classify`: status and transport-failure classification
//! - `journal`: per-client exception journal
//! - `metrics`: shared, thread-safe collector with circuit breaker
//! - `session`: headers, cookies, auth and proxy for one client
//! - `client`: the retrying client (blocking and async)
//! - `response`: body helpers and disk persistence
//! - `service`: generic service-call wrapper types

pub mod classify;
pub mod client;
pub mod journal;
pub mod metrics;
pub mod response;
pub mod service;
pub mod session;

pub use classify::{classify, classify_status, StatusOutcome};
pub use client::Client;
pub use journal::{ExceptionJournal, JournalMark};
pub use metrics::{RequestMetrics, TargetFailure};
pub use response::{auto_save, auto_save_file_name};
pub use service::{CallError, ServiceFault};
pub use session::{extract_domain, proxy_key, RequestOptions, Session};
