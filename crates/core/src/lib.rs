//! # DataCollector Core
//!
//! Request engine logic - no HTTP library dependencies.
//!
//! This crate contains:
//! - The retrying request client and its exception journal
//! - The shared metrics collector and per-target circuit breaker
//! - Port interfaces (traits) for transports and logger sinks
//! - Test doubles for those ports
//!
//! ## Architecture Principles
//! - Only depends on `datacollector-common` and `datacollector-domain`
//! - No sockets, TLS or HTTP library code
//! - All external dependencies via traits

pub mod request;
pub mod testing;

// Ports
pub mod log_ports;
pub mod transport_ports;

// Re-export specific items to avoid ambiguity
pub use log_ports::{LogSink, TracingSink};
pub use request::{Client, ExceptionJournal, RequestMetrics, RequestOptions, ServiceFault};
pub use transport_ports::{
    AsyncTransport, BasicAuth, HttpMethod, HttpResponse, RequestBody, Transport, TransportError,
    TransportFailure, TransportRequest,
};
