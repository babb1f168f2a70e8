//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for DataCollector
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DataCollectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DataCollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DataCollectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for DataCollector operations
pub type Result<T> = std::result::Result<T, DataCollectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts_with_message() {
        let err: DataCollectorError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing dir").into();
        assert_eq!(err, DataCollectorError::Io("missing dir".to_string()));
        assert_eq!(err.to_string(), "I/O error: missing dir");
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = DataCollectorError::Config("bad retries".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Config");
        assert_eq!(json["message"], "bad retries");
    }
}
