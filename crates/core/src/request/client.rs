//! Retrying request client
//!
//! One [`Client`] per worker. It owns its session and journal and may hold a
//! shared [`RequestMetrics`]. The blocking and async entry points run the
//! same attempt loop: every attempt is settled by [`Client::settle`], which
//! decides between finishing and backing off. Only the transport call and
//! the sleep primitive differ between the two modes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use datacollector_common::resilience::{
    BackoffStrategy, Clock, Sleeper, SystemClock, SystemSleeper,
};
use datacollector_domain::constants::{SERVICE_DOMAIN, SERVICE_SUCCESS_STATUS};
use datacollector_domain::{ClientConfig, ErrorCounters, ErrorKind, Result, StatsSnapshot};
use tracing::{debug, warn};

use super::classify::{
    classify, classify_status, message_indicates_block, message_indicates_server_down,
    StatusOutcome,
};
use super::journal::{ExceptionJournal, JournalMark};
use super::metrics::RequestMetrics;
use super::response::auto_save;
use super::service::{CallError, ServiceFault};
use super::session::{extract_domain, RequestOptions, Session};
use crate::log_ports::LogSink;
use crate::transport_ports::{
    AsyncTransport, HttpMethod, HttpResponse, Transport, TransportError, TransportRequest,
};

/// Per-call context fixed before the first attempt
struct CallContext {
    request: TransportRequest,
    domain: String,
    proxy_key: String,
}

/// What the loop does after an attempt
enum AttemptStep {
    Finish(Option<HttpResponse>),
    Backoff(Duration),
}

/// Retrying HTTP client with journal, local counters and optional shared
/// metrics
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
    backoff: BackoffStrategy,
    session: Session,
    journal: ExceptionJournal,
    counters: ErrorCounters,
    metrics: Option<Arc<RequestMetrics>>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    last_response: Option<HttpResponse>,
    last_request_url: Option<String>,
    call_mark: Option<JournalMark>,
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("counters", &self.counters)
            .field("last_request_url", &self.last_request_url)
            .finish_non_exhaustive()
    }
}

impl<T> Client<T> {
    /// Create a client over `transport`
    pub fn new(transport: T, config: ClientConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            transport,
            backoff: BackoffStrategy::exponential_seconds(config.backoff_factor),
            config,
            session: Session::new(),
            journal: ExceptionJournal::with_clock(Arc::clone(&clock)),
            counters: ErrorCounters::new(),
            metrics: None,
            clock,
            sleeper: Arc::new(SystemSleeper),
            last_response: None,
            last_request_url: None,
            call_mark: None,
        }
    }

    /// Attach a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<RequestMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the clock used for latencies, journal timestamps and file
    /// names. Resets the journal.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.journal = ExceptionJournal::with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    /// Replace the primitive used to wait between attempts
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn metrics(&self) -> Option<&Arc<RequestMetrics>> {
        self.metrics.as_ref()
    }

    /* ---------------------------------------------------------------------- */
    /* Session */
    /* ---------------------------------------------------------------------- */

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.session.set_headers(headers);
    }

    pub fn reset_headers(&mut self) {
        self.session.reset_headers();
    }

    pub fn set_cookies<I, K, V>(&mut self, cookies: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.session.set_cookies(cookies);
    }

    pub fn reset_cookies(&mut self) {
        self.session.reset_cookies();
    }

    pub fn set_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.session.set_auth(username, password);
    }

    pub fn set_proxy(&mut self, proxy: Option<String>) {
        self.session.set_proxy(proxy);
    }

    /* ---------------------------------------------------------------------- */
    /* Attempt loop */
    /* ---------------------------------------------------------------------- */

    fn begin_call(&mut self, method: HttpMethod, url: &str, options: RequestOptions) -> CallContext {
        self.call_mark = Some(self.journal.mark());
        self.last_request_url = Some(url.to_string());
        self.last_response = None;

        CallContext {
            request: self.session.build_request(method, url, options, self.config.timeout()),
            domain: extract_domain(url),
            proxy_key: self.session.proxy_key(),
        }
    }

    /// Record one attempt and decide what happens next
    fn settle(
        &mut self,
        call: &CallContext,
        attempt: u32,
        result: std::result::Result<HttpResponse, TransportError>,
        elapsed_ms: f64,
    ) -> AttemptStep {
        let url = call.request.url.as_str();
        let attempts_remain = attempt < self.config.retries;

        match result {
            Ok(response) => {
                let status = response.status;
                debug!(attempt = attempt + 1, method = %call.request.method, %url, status, elapsed_ms, "received HTTP response");

                self.counters.record_request();
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(&call.domain, &call.proxy_key, status, elapsed_ms);
                }

                let outcome = classify_status(status, &self.config.retry_on_status, attempts_remain);
                self.last_response = Some(response);

                match outcome {
                    StatusOutcome::Success => {
                        self.save_if_enabled(url);
                        AttemptStep::Finish(self.last_response.clone())
                    }
                    StatusOutcome::NoRetry | StatusOutcome::Fatal => {
                        self.record_error(ErrorKind::BadStatus, format!("HTTP {status}"), url);
                        AttemptStep::Finish(self.last_response.clone())
                    }
                    StatusOutcome::Retry => {
                        let delay = self.backoff.calculate_delay(attempt);
                        warn!(attempt = attempt + 1, %url, status, delay_ms = delay.as_millis() as u64, "retryable status, backing off");
                        AttemptStep::Backoff(delay)
                    }
                }
            }
            Err(err) => {
                let (kind, retryable) = classify(&err);
                debug!(attempt = attempt + 1, method = %call.request.method, %url, error = %err, %kind, "HTTP request failed");

                if retryable && attempts_remain {
                    let delay = self.backoff.calculate_delay(attempt);
                    warn!(attempt = attempt + 1, %url, %kind, delay_ms = delay.as_millis() as u64, "transport failure, backing off");
                    return AttemptStep::Backoff(delay);
                }

                self.record_error(kind, err.message, url);
                self.counters.record_request();
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(&call.domain, &call.proxy_key, kind);
                }
                AttemptStep::Finish(None)
            }
        }
    }

    /// Journal a terminal failure and bump the local counter
    fn record_error(&mut self, kind: ErrorKind, message: String, url: &str) {
        self.journal.record(kind, message, url);
        self.counters.increment(kind);
    }

    fn save_if_enabled(&self, url: &str) {
        if !self.config.save_responses {
            return;
        }
        let (Some(dir), Some(response)) = (self.config.save_dir.as_deref(), &self.last_response)
        else {
            return;
        };
        match auto_save(dir, url, response, self.clock.utc_now()) {
            Ok(path) => debug!(path = %path.display(), "saved response"),
            Err(err) => warn!(error = %err, %url, "failed to save response"),
        }
    }

    /* ---------------------------------------------------------------------- */
    /* Generic service calls */
    /* ---------------------------------------------------------------------- */

    /// Run an externally bound service callable with the same bookkeeping
    /// as HTTP requests. No retries.
    ///
    /// Returns `Ok(None)` when the call failed and the failure was absorbed.
    ///
    /// # Errors
    /// Returns `CallError::Fault` only when `raise_on_fault` is set and the
    /// service answered with a protocol fault.
    pub fn call_service<R, F>(&mut self, method: F, raise_on_fault: bool) -> std::result::Result<Option<R>, CallError>
    where
        F: FnOnce() -> std::result::Result<R, ServiceFault>,
    {
        self.call_mark = Some(self.journal.mark());
        let proxy_key = self.session.proxy_key();

        let start = self.clock.now();
        let result = method();
        let elapsed_ms = self.clock.millis_since(start);

        match result {
            Ok(value) => {
                self.counters.record_request();
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(SERVICE_DOMAIN, &proxy_key, SERVICE_SUCCESS_STATUS, elapsed_ms);
                }
                Ok(Some(value))
            }
            Err(fault) => {
                let kind = fault.kind();
                debug!(%kind, error = %fault, "service call failed");

                self.record_error(kind, fault.to_string(), SERVICE_DOMAIN);
                self.counters.record_request();
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(SERVICE_DOMAIN, &proxy_key, kind);
                }

                match fault {
                    ServiceFault::Fault(message) if raise_on_fault => Err(CallError::Fault(message)),
                    _ => Ok(None),
                }
            }
        }
    }

    /* ---------------------------------------------------------------------- */
    /* Error introspection */
    /* ---------------------------------------------------------------------- */

    pub fn journal(&self) -> &ExceptionJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut ExceptionJournal {
        &mut self.journal
    }

    /// Local request and error counters
    pub fn counters(&self) -> &ErrorCounters {
        &self.counters
    }

    /// Whether the most recent call journaled anything
    pub fn has_errors(&self) -> bool {
        self.call_mark.as_ref().is_some_and(|mark| self.journal.has_errors_after(mark))
    }

    /// Last error suggests a block: 401, 403, 429 or a forcibly closed
    /// connection in its message. Approximate.
    pub fn is_blocked(&self) -> bool {
        self.journal.last_error().is_some_and(|entry| message_indicates_block(&entry.message))
    }

    pub fn is_proxy_error(&self) -> bool {
        self.last_error_kind() == Some(ErrorKind::Proxy)
    }

    pub fn is_timeout(&self) -> bool {
        self.last_error_kind() == Some(ErrorKind::Timeout)
    }

    /// Last error message contains a 5xx code. Approximate.
    pub fn is_server_down(&self) -> bool {
        self.journal.last_error().is_some_and(|entry| message_indicates_server_down(&entry.message))
    }

    fn last_error_kind(&self) -> Option<ErrorKind> {
        self.journal.last_error().map(|entry| entry.kind)
    }

    /// Whether the caller should stop issuing requests
    ///
    /// False when the last call recorded nothing; otherwise true, with the
    /// reason logged at debug level. Unrecognized errors also abort, and the
    /// last error is logged at error level.
    pub fn should_abort(&self, logger: &dyn LogSink, proxy_active: bool) -> bool {
        if !self.has_errors() {
            return false;
        }

        if proxy_active && (self.is_blocked() || self.is_proxy_error()) {
            logger.debug("Aborting: proxy is blocked or not working");
            return true;
        }

        if self.is_timeout() {
            logger.debug("Aborting: page or proxy timeout");
            return true;
        }

        if self.is_server_down() {
            logger.debug("Aborting: server page is down");
            return true;
        }

        if let Some(entry) = self.journal.last_error() {
            logger.error(&entry.to_string());
        }
        true
    }

    /// Circuit-breaker state from the attached collector; healthy without one
    pub fn is_target_unhealthy(&self, url: &str) -> bool {
        self.metrics.as_ref().is_some_and(|metrics| metrics.is_target_unhealthy(url))
    }

    /// Emit and return statistics: the shared snapshot when a collector is
    /// attached, local counters otherwise
    pub fn log_stats(&self, logger: &dyn LogSink) -> StatsSnapshot {
        if let Some(metrics) = &self.metrics {
            return metrics.log_stats(logger);
        }

        let snapshot = StatsSnapshot {
            total_requests: self.counters.requests(),
            total_errors: self.counters.total_errors(),
            error_rate_percent: self.counters.error_rate_percent(),
            error_breakdown: self.counters.breakdown(),
            timing: None,
            by_domain: None,
            by_proxy: None,
        };
        logger.stats(&snapshot);
        snapshot
    }

    /* ---------------------------------------------------------------------- */
    /* Response helpers */
    /* ---------------------------------------------------------------------- */

    /// Response of the most recent call, if it produced one
    pub fn last_response(&self) -> Option<&HttpResponse> {
        self.last_response.as_ref()
    }

    pub fn last_request_url(&self) -> Option<&str> {
        self.last_request_url.as_deref()
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.last_response.as_ref().map(|r| r.body.as_slice())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.last_response.as_ref().and_then(HttpResponse::content_length)
    }

    /// Parsed JSON body; `Err` carries the parse error text
    pub fn json(&self) -> Option<std::result::Result<serde_json::Value, String>> {
        self.last_response.as_ref().map(HttpResponse::json)
    }

    /// Write the last response body to `path`; no-op without a response
    pub fn save_content(&self, path: impl AsRef<Path>) -> Result<()> {
        match &self.last_response {
            Some(response) => response.save_to(path.as_ref()),
            None => Ok(()),
        }
    }
}

impl<T: Transport> Client<T> {
    /// Blocking GET
    pub fn get(&mut self, url: &str, options: RequestOptions) -> Option<HttpResponse> {
        self.request(HttpMethod::Get, url, options)
    }

    /// Blocking POST
    pub fn post(&mut self, url: &str, options: RequestOptions) -> Option<HttpResponse> {
        self.request(HttpMethod::Post, url, options)
    }

    /// Run the attempt loop on the current thread
    pub fn request(&mut self, method: HttpMethod, url: &str, options: RequestOptions) -> Option<HttpResponse> {
        let call = self.begin_call(method, url, options);
        let mut attempt = 0;

        loop {
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");
            let start = self.clock.now();
            let result = self.transport.execute(&call.request);
            let elapsed_ms = self.clock.millis_since(start);

            match self.settle(&call, attempt, result, elapsed_ms) {
                AttemptStep::Finish(response) => return response,
                AttemptStep::Backoff(delay) => {
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl<T: AsyncTransport> Client<T> {
    /// Suspendable GET
    pub async fn get_async(&mut self, url: &str, options: RequestOptions) -> Option<HttpResponse> {
        self.request_async(HttpMethod::Get, url, options).await
    }

    /// Suspendable POST
    pub async fn post_async(&mut self, url: &str, options: RequestOptions) -> Option<HttpResponse> {
        self.request_async(HttpMethod::Post, url, options).await
    }

    /// Run the attempt loop, suspending on the transport call and between
    /// attempts
    pub async fn request_async(
        &mut self,
        method: HttpMethod,
        url: &str,
        options: RequestOptions,
    ) -> Option<HttpResponse> {
        let call = self.begin_call(method, url, options);
        let mut attempt = 0;

        loop {
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");
            let start = self.clock.now();
            let result = self.transport.execute_async(&call.request).await;
            let elapsed_ms = self.clock.millis_since(start);

            match self.settle(&call, attempt, result, elapsed_ms) {
                AttemptStep::Finish(response) => return response,
                AttemptStep::Backoff(delay) => {
                    self.sleeper.sleep_async(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
