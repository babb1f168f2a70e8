//! Exception journal entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error_kind::ErrorKind;

/// One recorded failure
///
/// `seq` is assigned by the journal and increases strictly with every
/// append, so entries sharing a timestamp still have a total order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: ErrorKind,
    pub message: String,
    pub url: String,
}

impl std::fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({})", self.kind, self.message, self.url)
    }
}
