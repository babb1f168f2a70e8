//! Shared request metrics and per-target circuit breaker
//!
//! One [`RequestMetrics`] is built per run and shared as
//! `Arc<RequestMetrics>` by every client. All state sits behind a single
//! mutex; every critical section is a handful of map and vector operations.
//!
//! ## Counting rule
//! Every recorded outcome increments `total_requests`: each response
//! (`record_success`, any status) and each failure (`record_failure`). The
//! error rate is therefore `total_errors / total_requests` over one
//! consistent population.
//!
//! ## Circuit breaker
//! A target (domain) accumulates failures and the set of proxy keys they came
//! through. It is unhealthy once both thresholds are met, and any 2xx for the
//! domain removes its entry.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use datacollector_common::resilience::{percentile, Reservoir};
use datacollector_domain::{
    DomainStats, ErrorCounters, ErrorKind, MetricsConfig, ProxyStats, StatsSnapshot,
    TimingSummary,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::warn;

use super::session::extract_domain;
use crate::log_ports::LogSink;

/// Failures recorded for one domain since its last success
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetFailure {
    pub failure_count: u32,
    pub distinct_sources: HashSet<String>,
}

#[derive(Debug)]
struct DomainState {
    reservoir: Reservoir,
    status_codes: BTreeMap<u16, u64>,
}

#[derive(Debug)]
struct ProxyState {
    count: u64,
    success: u64,
    reservoir: Reservoir,
}

struct MetricsState {
    counters: ErrorCounters,
    domains: HashMap<String, DomainState>,
    proxies: HashMap<String, ProxyState>,
    target_failures: HashMap<String, TargetFailure>,
    rng: Box<dyn RngCore + Send>,
}

impl MetricsState {
    fn bump_target_failure(&mut self, domain: &str, proxy_key: &str) {
        let entry = self.target_failures.entry(domain.to_string()).or_default();
        entry.failure_count = entry.failure_count.saturating_add(1);
        entry.distinct_sources.insert(proxy_key.to_string());
    }
}

/// Thread-safe metrics collector shared across clients
pub struct RequestMetrics {
    config: MetricsConfig,
    state: Mutex<MetricsState>,
}

impl std::fmt::Debug for RequestMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMetrics").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

impl RequestMetrics {
    /// Collector seeded from OS entropy
    pub fn new(config: MetricsConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Collector drawing reservoir slots from `rng`; seed it for
    /// reproducible sampling
    pub fn with_rng(config: MetricsConfig, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            config,
            state: Mutex::new(MetricsState {
                counters: ErrorCounters::new(),
                domains: HashMap::new(),
                proxies: HashMap::new(),
                target_failures: HashMap::new(),
                rng: Box::new(rng),
            }),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("request metrics mutex poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Record a received response of any status
    pub fn record_success(&self, domain: &str, proxy_key: &str, status: u16, elapsed_ms: f64) {
        let capacity = self.config.reservoir_capacity;
        let success = (200..300).contains(&status);

        let mut guard = self.state();
        let state = &mut *guard;

        state.counters.record_request();

        let domain_state = state.domains.entry(domain.to_string()).or_insert_with(|| DomainState {
            reservoir: Reservoir::new(capacity),
            status_codes: BTreeMap::new(),
        });
        domain_state.reservoir.offer(elapsed_ms, &mut *state.rng);
        *domain_state.status_codes.entry(status).or_insert(0) += 1;

        let proxy_state = state.proxies.entry(proxy_key.to_string()).or_insert_with(|| ProxyState {
            count: 0,
            success: 0,
            reservoir: Reservoir::new(capacity),
        });
        proxy_state.count += 1;
        if success {
            proxy_state.success += 1;
        }
        proxy_state.reservoir.offer(elapsed_ms, &mut *state.rng);

        if success {
            state.target_failures.remove(domain);
        } else {
            state.bump_target_failure(domain, proxy_key);
            state.counters.increment(ErrorKind::BadStatus);
        }
    }

    /// Record an outcome that produced no response
    pub fn record_failure(&self, domain: &str, proxy_key: &str, kind: ErrorKind) {
        let mut state = self.state();
        state.counters.increment(kind);
        state.counters.record_request();
        state.bump_target_failure(domain, proxy_key);
    }

    /// Circuit-breaker check for the domain of `url`
    pub fn is_target_unhealthy(&self, url: &str) -> bool {
        let domain = extract_domain(url);
        let state = self.state();
        state.target_failures.get(&domain).is_some_and(|entry| {
            entry.failure_count >= self.config.max_target_failures
                && entry.distinct_sources.len() >= self.config.min_distinct_sources
        })
    }

    /// Circuit-breaker state for `domain`, if it has failed since its last
    /// success
    pub fn target_failure(&self, domain: &str) -> Option<TargetFailure> {
        self.state().target_failures.get(domain).cloned()
    }

    /// Samples currently retained for `domain`
    pub fn domain_sample_count(&self, domain: &str) -> Option<usize> {
        self.state().domains.get(domain).map(|d| d.reservoir.len())
    }

    /// Global counters
    pub fn counters(&self) -> ErrorCounters {
        self.state().counters
    }

    /// Aggregate everything recorded so far
    pub fn snapshot(&self) -> StatsSnapshot {
        let state = self.state();

        let all_samples: Vec<f64> =
            state.domains.values().flat_map(|d| d.reservoir.samples().iter().copied()).collect();
        let timing = timing_summary(&all_samples);

        let by_domain = state
            .domains
            .iter()
            .map(|(domain, d)| {
                let success = d
                    .status_codes
                    .iter()
                    .filter(|(status, _)| (200..300).contains(*status))
                    .map(|(_, count)| count)
                    .sum();
                let stats = DomainStats {
                    count: d.reservoir.seen(),
                    success,
                    p95_ms: whole_ms(d.reservoir.percentile(0.95)),
                    status_codes: d
                        .status_codes
                        .iter()
                        .map(|(status, count)| (status.to_string(), *count))
                        .collect(),
                };
                (domain.clone(), stats)
            })
            .collect();

        let by_proxy = state
            .proxies
            .iter()
            .map(|(key, p)| {
                let stats = ProxyStats {
                    count: p.count,
                    success: p.success,
                    p95_ms: whole_ms(p.reservoir.percentile(0.95)),
                };
                (key.clone(), stats)
            })
            .collect();

        StatsSnapshot {
            total_requests: state.counters.requests(),
            total_errors: state.counters.total_errors(),
            error_rate_percent: state.counters.error_rate_percent(),
            error_breakdown: state.counters.breakdown(),
            timing: Some(timing),
            by_domain: Some(by_domain),
            by_proxy: Some(by_proxy),
        }
    }

    /// Snapshot and emit it to `logger`
    pub fn log_stats(&self, logger: &dyn LogSink) -> StatsSnapshot {
        let snapshot = self.snapshot();
        logger.stats(&snapshot);
        snapshot
    }
}

fn whole_ms(value: Option<f64>) -> u64 {
    value.map_or(0, |v| v.max(0.0).round() as u64)
}

fn timing_summary(samples: &[f64]) -> TimingSummary {
    if samples.is_empty() {
        return TimingSummary::default();
    }
    let avg = samples.iter().sum::<f64>() / samples.len() as f64;
    TimingSummary {
        avg_ms: whole_ms(Some(avg)),
        p50_ms: whole_ms(percentile(samples, 0.50)),
        p95_ms: whole_ms(percentile(samples, 0.95)),
        p99_ms: whole_ms(percentile(samples, 0.99)),
    }
}
