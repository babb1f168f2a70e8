//! Generic service-call wrapper types
//!
//! SOAP and similar clients are built elsewhere; the engine only wraps a
//! bound callable so its outcome lands in the same journal, counters and
//! collector as HTTP requests. The callable reports failures as a
//! [`ServiceFault`].

use datacollector_domain::ErrorKind;
use thiserror::Error;

/// Failure reported by a wrapped service callable
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceFault {
    /// The remote service answered with a protocol fault
    #[error("SOAP Fault: {0}")]
    Fault(String),
    /// The call never reached the service
    #[error("SOAP TransportError: {0}")]
    Transport(String),
    /// Anything else raised by the callable
    #[error("{0}")]
    Other(String),
}

impl ServiceFault {
    /// Journal kind for this fault
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceFault::Fault(_) => ErrorKind::Request,
            ServiceFault::Transport(_) => ErrorKind::Proxy,
            ServiceFault::Other(message) if message.to_lowercase().contains("timeout") => {
                ErrorKind::Timeout
            }
            ServiceFault::Other(_) => ErrorKind::Other,
        }
    }
}

/// Error surfaced to callers that opted into fault propagation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("SOAP Fault: {0}")]
    Fault(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_kinds() {
        assert_eq!(ServiceFault::Fault("bad arg".into()).kind(), ErrorKind::Request);
        assert_eq!(ServiceFault::Transport("refused".into()).kind(), ErrorKind::Proxy);
        assert_eq!(ServiceFault::Other("Read TIMEOUT".into()).kind(), ErrorKind::Timeout);
        assert_eq!(ServiceFault::Other("oops".into()).kind(), ErrorKind::Other);
    }

    #[test]
    fn messages_carry_prefixes() {
        assert_eq!(ServiceFault::Fault("x".into()).to_string(), "SOAP Fault: x");
        assert_eq!(ServiceFault::Transport("y".into()).to_string(), "SOAP TransportError: y");
        assert_eq!(ServiceFault::Other("z".into()).to_string(), "z");
    }
}
