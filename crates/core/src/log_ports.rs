//! Logger sink port
//!
//! Callers pass a sink into `should_abort` and `log_stats` so the decision
//! and statistics records land wherever the caller's pipeline wants them.
//! [`TracingSink`] forwards to `tracing` and is the usual choice.

use datacollector_domain::StatsSnapshot;
use tracing::{debug, error, info};

/// Structured message sink supplied by callers
pub trait LogSink: Send + Sync {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn error(&self, message: &str);

    /// Emit a statistics record at info level
    fn stats(&self, snapshot: &StatsSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => self.info(&format!("Request statistics: {json}")),
            Err(err) => self.error(&format!("failed to serialize request statistics: {err}")),
        }
    }
}

/// Sink that forwards every record to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn debug(&self, message: &str) {
        debug!(target: "datacollector::request", "{message}");
    }

    fn info(&self, message: &str) {
        info!(target: "datacollector::request", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "datacollector::request", "{message}");
    }

    fn stats(&self, snapshot: &StatsSnapshot) {
        let breakdown = serde_json::to_string(&snapshot.error_breakdown).unwrap_or_default();
        info!(
            target: "datacollector::request",
            total_requests = snapshot.total_requests,
            total_errors = snapshot.total_errors,
            error_rate_percent = snapshot.error_rate_percent,
            error_breakdown = %breakdown,
            p95_ms = snapshot.timing.map(|t| t.p95_ms),
            "Request statistics"
        );
    }
}
