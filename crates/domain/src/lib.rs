//! # DataCollector Domain
//!
//! Domain types shared by the request engine and its adapters.
//!
//! This crate contains:
//! - Error taxonomy (`ErrorKind`) and local error counters
//! - Exception journal entries
//! - Statistics snapshot types (the serializable contract for stats sinks)
//! - Configuration structures and their validation
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other DataCollector crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
