//! # DataCollector Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-backed transport (blocking and async)
//! - Conversions from reqwest errors into transport errors
//! - Settings loading from files and environment variables
//! - Process-level tracing subscriber set-up
//!
//! ## Architecture
//! - Implements traits defined in `datacollector-core`
//! - Contains all "impure" code (sockets, files, environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use errors::IntoTransportError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use observability::init_tracing;
