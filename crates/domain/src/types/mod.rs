//! Domain types for the request engine
//!
//! - `error_kind`: closed failure taxonomy and per-client counters
//! - `journal`: exception journal entries
//! - `stats`: serializable statistics snapshot

pub mod error_kind;
pub mod journal;
pub mod stats;

pub use error_kind::{ErrorCounters, ErrorKind};
pub use journal::JournalEntry;
pub use stats::{DomainStats, ProxyStats, StatsSnapshot, TimingSummary};
