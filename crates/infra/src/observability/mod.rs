//! Process-level observability set-up

pub mod logging;

pub use logging::{build_filter, init_tracing};
