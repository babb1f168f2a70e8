//! Statistics snapshot types
//!
//! The snapshot is the only structure that leaves the request engine for
//! reporting. It serializes to a plain nested mapping:
//! - Global counters and error breakdown
//! - Latency summary over every domain reservoir
//! - Per-domain and per-proxy aggregates
//!
//! Latencies are reported as whole milliseconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/* -------------------------------------------------------------------------- */
/* Snapshot */
/* -------------------------------------------------------------------------- */

/// Aggregated request statistics
///
/// The `timing`, `by_domain` and `by_proxy` sections are only present when
/// the statistics come from a metrics collector; a client without one
/// reports its local counters alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Every recorded outcome, success or failure
    pub total_requests: u64,

    /// Sum of all per-kind error counters
    pub total_errors: u64,

    /// `total_errors / total_requests * 100`, two decimals
    pub error_rate_percent: f64,

    /// Non-zero error counters keyed by kind
    pub error_breakdown: BTreeMap<String, u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_domain: Option<BTreeMap<String, DomainStats>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_proxy: Option<BTreeMap<String, ProxyStats>>,
}

/* -------------------------------------------------------------------------- */
/* Sections */
/* -------------------------------------------------------------------------- */

/// Latency summary; all zeros when nothing has been sampled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub avg_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

/// Per-domain aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStats {
    /// Responses recorded for the domain
    pub count: u64,

    /// 2xx responses recorded for the domain
    pub success: u64,

    pub p95_ms: u64,

    /// Status code (as a string) to number of responses
    pub status_codes: BTreeMap<String, u64>,
}

/// Per-proxy aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStats {
    pub count: u64,
    pub success: u64,
    pub p95_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates the wire shape of a local-only snapshot.
    ///
    /// Assertions:
    /// - Ensures collector-only sections are omitted when absent.
    #[test]
    fn local_snapshot_omits_collector_sections() {
        let snapshot = StatsSnapshot {
            total_requests: 2,
            total_errors: 1,
            error_rate_percent: 50.0,
            error_breakdown: BTreeMap::from([("proxy".to_string(), 1)]),
            timing: None,
            by_domain: None,
            by_proxy: None,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();

        assert_eq!(
            keys,
            vec!["error_breakdown", "error_rate_percent", "total_errors", "total_requests"]
        );
    }

    #[test]
    fn domain_stats_keys_status_codes_as_strings() {
        let stats = DomainStats {
            count: 3,
            success: 2,
            p95_ms: 120,
            status_codes: BTreeMap::from([("200".to_string(), 2), ("500".to_string(), 1)]),
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["status_codes"]["500"], 1);
        assert_eq!(json["p95_ms"], 120);
    }
}
