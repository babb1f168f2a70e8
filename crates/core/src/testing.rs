//! Test doubles for the core ports
//!
//! - [`ScriptedTransport`]: replays a fixed list of attempt outcomes and
//!   records every request it receives. Implements both transport traits.
//! - [`RecordingSink`]: captures logger output and statistics snapshots.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use datacollector_domain::StatsSnapshot;

use crate::log_ports::LogSink;
use crate::transport_ports::{
    AsyncTransport, HttpResponse, Transport, TransportError, TransportFailure, TransportRequest,
};

/// One scripted attempt outcome
pub type Scripted = Result<HttpResponse, TransportError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Transport that replays scripted outcomes
///
/// Outcomes are consumed in order; once the script runs out the last outcome
/// repeats.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every attempt answers with `status`
    pub fn always(status: u16) -> Self {
        Self::new([Ok(HttpResponse::new(status))])
    }

    /// Every attempt fails with `failure`
    pub fn failing(failure: TransportFailure, message: &str) -> Self {
        Self::new([Err(TransportError::new(failure, message))])
    }

    /// Number of attempts executed
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<TransportRequest> {
        lock(&self.requests).clone()
    }

    fn next(&self, request: &TransportRequest) -> Scripted {
        lock(&self.requests).push(request.clone());

        let mut last = lock(&self.last);
        if let Some(outcome) = lock(&self.script).pop_front() {
            *last = Some(outcome.clone());
            return outcome;
        }

        last.clone().unwrap_or_else(|| {
            Err(TransportError::new(TransportFailure::Other, "scripted transport has no outcomes"))
        })
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &TransportRequest) -> Result<HttpResponse, TransportError> {
        self.next(request)
    }
}

#[async_trait]
impl AsyncTransport for ScriptedTransport {
    async fn execute_async(
        &self,
        request: &TransportRequest,
    ) -> Result<HttpResponse, TransportError> {
        self.next(request)
    }
}

/// Level of a captured log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

/// Sink that keeps everything it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(LogLevel, String)>>,
    snapshots: Mutex<Vec<StatsSnapshot>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(LogLevel, String)> {
        lock(&self.records).clone()
    }

    /// Messages logged at `level`
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        lock(&self.records)
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn snapshots(&self) -> Vec<StatsSnapshot> {
        lock(&self.snapshots).clone()
    }

    fn push(&self, level: LogLevel, message: &str) {
        lock(&self.records).push((level, message.to_string()));
    }
}

impl LogSink for RecordingSink {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    fn stats(&self, snapshot: &StatsSnapshot) {
        lock(&self.snapshots).push(snapshot.clone());
        self.push(LogLevel::Info, "Request statistics");
    }
}
