//! Common error classification for DataCollector crates
//!
//! Module-specific errors stay in their own crates (`thiserror` enums). This
//! module only provides the shared vocabulary used to reason about them:
//!
//! - **`ErrorClassification` trait**: retryability, severity, criticality and
//!   an optional suggested retry delay.
//! - **`ErrorSeverity` enum**: a unified severity level for logging and
//!   alerting.
//! - **`error_chain`**: flattens an error and its `source()` chain into one
//!   line, so transport failures keep the low-level cause (e.g. "connection
//!   refused") in their message.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Resource not found |
//! | **Warning** | Degraded but operational | Timeouts, proxy failures |
//! | **Error** | Failure requiring attention | Protocol errors, bad config |
//! | **Critical** | System integrity at risk | Invariant violations |
//!
//! ## Example
//!
//! ```rust,ignore
//! use datacollector_common::error::{ErrorClassification, ErrorSeverity};
//!
//! impl ErrorClassification for FetchError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Timeout | Self::Connect)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         if self.is_retryable() { ErrorSeverity::Warning } else { ErrorSeverity::Error }
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as timeouts or refused connections.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Render an error followed by every `source()` in its chain, joined by `": "`.
///
/// Consecutive duplicates are skipped; some libraries repeat the inner
/// message in their own `Display`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut last = rendered.clone();
    let mut source = err.source();

    while let Some(cause) = source {
        let message = cause.to_string();
        if !message.is_empty() && !last.contains(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        last = message;
        source = cause.source();
    }

    rendered
}
