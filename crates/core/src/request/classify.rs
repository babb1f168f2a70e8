//! Outcome classification
//!
//! Status codes are judged first; only attempts that produced no response
//! reach [`classify`]. The message heuristics at the bottom look at free
//! text and are approximate: a message that merely contains "503" inside an
//! unrelated token is still read as a server error.

use datacollector_common::error::{ErrorClassification, ErrorSeverity};
use datacollector_domain::constants::NO_RETRY_STATUSES;
use datacollector_domain::ErrorKind;

use crate::transport_ports::{TransportError, TransportFailure};

/// Map a transport failure to its kind and whether another attempt may help
pub fn classify(error: &TransportError) -> (ErrorKind, bool) {
    let kind = match error.failure {
        TransportFailure::Timeout => ErrorKind::Timeout,
        TransportFailure::Connect | TransportFailure::Proxy => ErrorKind::Proxy,
        TransportFailure::TooManyRedirects => ErrorKind::Redirect,
        TransportFailure::Protocol => ErrorKind::Request,
        TransportFailure::Other => ErrorKind::Other,
    };
    (kind, kind.is_retryable())
}

impl ErrorClassification for TransportError {
    fn is_retryable(&self) -> bool {
        classify(self).1
    }

    fn severity(&self) -> ErrorSeverity {
        match self.failure {
            TransportFailure::Timeout | TransportFailure::Connect | TransportFailure::Proxy => {
                ErrorSeverity::Warning
            }
            _ => ErrorSeverity::Error,
        }
    }
}

/// How a received status code ends (or continues) the attempt loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// 2xx
    Success,
    /// 401, 403 or 404: terminal whatever the remaining budget
    NoRetry,
    /// In the retry set and attempts remain
    Retry,
    /// Any other non-2xx, or a retryable status with no attempts left
    Fatal,
}

impl StatusOutcome {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, StatusOutcome::Retry)
    }
}

/// Classify a response status
pub fn classify_status(status: u16, retry_on_status: &[u16], attempts_remain: bool) -> StatusOutcome {
    if (200..300).contains(&status) {
        StatusOutcome::Success
    } else if NO_RETRY_STATUSES.contains(&status) {
        StatusOutcome::NoRetry
    } else if attempts_remain && retry_on_status.contains(&status) {
        StatusOutcome::Retry
    } else {
        StatusOutcome::Fatal
    }
}

/// Message suggests the caller was blocked (401, 403, 429 or a forcibly
/// closed connection). Approximate.
pub fn message_indicates_block(message: &str) -> bool {
    let message = message.to_lowercase();
    ["401", "403", "429", "forcibly closed"].iter().any(|needle| message.contains(needle))
}

/// Message contains a 5xx status code anywhere. Approximate.
pub fn message_indicates_server_down(message: &str) -> bool {
    (500..600).any(|code: u16| message.contains(&code.to_string()))
}
