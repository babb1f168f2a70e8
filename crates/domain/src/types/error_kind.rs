//! Failure taxonomy for outbound requests

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed classification of request failure causes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The attempt exceeded its deadline
    Timeout,
    /// Connection refused, proxy handshake or other transport-level failure
    Proxy,
    /// Non-2xx HTTP outcome
    #[serde(rename = "bad_status_code")]
    BadStatus,
    /// Redirect-chain limit exceeded
    Redirect,
    /// Generic protocol or application error
    Request,
    /// Anything unrecognized
    Other,
}

impl ErrorKind {
    /// Every kind, in report order
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::Timeout,
        ErrorKind::Proxy,
        ErrorKind::BadStatus,
        ErrorKind::Redirect,
        ErrorKind::Request,
        ErrorKind::Other,
    ];

    /// Stable key used in statistics breakdowns
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Proxy => "proxy",
            ErrorKind::BadStatus => "bad_status_code",
            ErrorKind::Redirect => "redirect",
            ErrorKind::Request => "request",
            ErrorKind::Other => "other",
        }
    }

    /// Default retryability when a transport failure of this kind is caught
    pub const fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Proxy)
    }

    const fn index(self) -> usize {
        match self {
            ErrorKind::Timeout => 0,
            ErrorKind::Proxy => 1,
            ErrorKind::BadStatus => 2,
            ErrorKind::Redirect => 3,
            ErrorKind::Request => 4,
            ErrorKind::Other => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request and per-kind error counters
///
/// Used both for a single client's local bookkeeping and for the shared
/// collector's global totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounters {
    requests: u64,
    errors: [u64; 6],
}

impl ErrorCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one observed outcome
    pub fn record_request(&mut self) {
        self.requests += 1;
    }

    /// Count one error of `kind`
    pub fn increment(&mut self, kind: ErrorKind) {
        self.errors[kind.index()] += 1;
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn get(&self, kind: ErrorKind) -> u64 {
        self.errors[kind.index()]
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.iter().sum()
    }

    /// `total_errors / requests * 100`, rounded to two decimals; 0 when idle
    pub fn error_rate_percent(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        let rate = self.total_errors() as f64 / self.requests as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }

    /// Non-zero counters keyed by [`ErrorKind::as_str`]
    pub fn breakdown(&self) -> BTreeMap<String, u64> {
        ErrorKind::ALL
            .iter()
            .filter(|kind| self.get(**kind) > 0)
            .map(|kind| (kind.as_str().to_string(), self.get(*kind)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeout_and_proxy_are_retryable() {
        let retryable: Vec<_> = ErrorKind::ALL.into_iter().filter(|k| k.is_retryable()).collect();
        assert_eq!(retryable, vec![ErrorKind::Timeout, ErrorKind::Proxy]);
    }

    #[test]
    fn bad_status_serializes_with_legacy_key() {
        assert_eq!(serde_json::to_string(&ErrorKind::BadStatus).unwrap(), "\"bad_status_code\"");
        assert_eq!(ErrorKind::BadStatus.to_string(), "bad_status_code");
    }

    /// Validates error rate and breakdown.
    ///
    /// Assertions:
    /// - Confirms one success and one error yields a 50% rate.
    /// - Ensures zero counters are omitted from the breakdown.
    #[test]
    fn error_rate_and_breakdown() {
        let mut counters = ErrorCounters::new();
        counters.record_request();
        counters.record_request();
        counters.increment(ErrorKind::Timeout);

        assert!((counters.error_rate_percent() - 50.0).abs() < f64::EPSILON);
        assert_eq!(counters.breakdown().len(), 1);
        assert_eq!(counters.breakdown()["timeout"], 1);
    }

    #[test]
    fn error_rate_rounds_to_two_decimals() {
        let mut counters = ErrorCounters::new();
        for _ in 0..3 {
            counters.record_request();
        }
        counters.increment(ErrorKind::Other);

        assert!((counters.error_rate_percent() - 33.33).abs() < 1e-9);
    }

    #[test]
    fn idle_counters_report_zero_rate() {
        assert_eq!(ErrorCounters::new().error_rate_percent(), 0.0);
        assert!(ErrorCounters::new().breakdown().is_empty());
    }
}
