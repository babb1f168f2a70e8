//! Exception journal
//!
//! Per-client, insertion-ordered history of failures. "Last error" is the
//! most recently appended entry. Every entry carries a sequence number that
//! keeps increasing across [`ExceptionJournal::clear`], so a [`JournalMark`]
//! taken before a call still scopes "errors from this call" correctly when
//! the clock does not advance between entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use datacollector_common::resilience::{Clock, SystemClock};
use datacollector_domain::{ErrorKind, JournalEntry};

/// Position in the journal at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalMark {
    pub timestamp: DateTime<Utc>,
    next_seq: u64,
}

/// Ordered failure history for one client
pub struct ExceptionJournal {
    entries: Vec<JournalEntry>,
    next_seq: u64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ExceptionJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionJournal")
            .field("entries", &self.entries)
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl Default for ExceptionJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionJournal {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Vec::new(), next_seq: 0, clock }
    }

    /// Append a failure stamped with the current time
    pub fn record(&mut self, kind: ErrorKind, message: impl Into<String>, url: impl Into<String>) {
        let entry = JournalEntry {
            seq: self.next_seq,
            timestamp: self.clock.utc_now(),
            kind,
            message: message.into(),
            url: url.into(),
        };
        self.next_seq += 1;
        self.entries.push(entry);
    }

    /// Most recently appended entry
    pub fn last_error(&self) -> Option<&JournalEntry> {
        self.entries.last()
    }

    pub fn by_kind(&self, kind: ErrorKind) -> Vec<&JournalEntry> {
        self.entries.iter().filter(|entry| entry.kind == kind).collect()
    }

    /// Any entry stamped strictly after `timestamp`
    pub fn has_errors_since(&self, timestamp: DateTime<Utc>) -> bool {
        self.entries.iter().any(|entry| entry.timestamp > timestamp)
    }

    /// Capture the current position
    pub fn mark(&self) -> JournalMark {
        JournalMark { timestamp: self.clock.utc_now(), next_seq: self.next_seq }
    }

    /// Any entry appended after `mark` was taken
    pub fn has_errors_after(&self, mark: &JournalMark) -> bool {
        self.entries.last().is_some_and(|entry| entry.seq >= mark.next_seq)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
