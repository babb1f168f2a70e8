//! Transport port - the seam between the request engine and an HTTP library
//!
//! The engine never opens sockets itself. It hands a fully resolved
//! [`TransportRequest`] to an injected transport and gets back either an
//! [`HttpResponse`] (any status) or a [`TransportError`] describing why no
//! response was produced. Blocking and suspendable transports are separate
//! traits so one adapter can offer both.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// HTTP method supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP basic authentication pair
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with `content-type: application/json`
    Json(serde_json::Value),
    /// Sent verbatim
    Bytes(Vec<u8>),
}

/// A single attempt, fully resolved from session state and call options
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub auth: Option<BasicAuth>,
    /// Forward proxy URL, possibly with credentials
    pub proxy: Option<String>,
    /// Deadline for this attempt only
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    /// Minimal request with no session state
    pub fn new(method: HttpMethod, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            auth: None,
            proxy: None,
            timeout,
            follow_redirects: true,
            body: None,
        }
    }

    /// Cookies rendered as a single `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> =
            self.cookies.iter().map(|(name, value)| format!("{name}={value}")).collect();
        Some(pairs.join("; "))
    }
}

/// Response received from the transport, whatever its status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self { status, headers: BTreeMap::new(), body: Vec::new() }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Coarse cause of a transport failure, independent of the HTTP library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The attempt exceeded its deadline
    Timeout,
    /// Connection refused, reset or unreachable
    Connect,
    /// Proxy handshake or tunnel failure
    Proxy,
    /// Redirect-chain limit exceeded
    TooManyRedirects,
    /// Recognized protocol-level failure (malformed response, body decode)
    Protocol,
    /// Anything the adapter could not recognize
    Other,
}

/// Why an attempt produced no response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub failure: TransportFailure,
    pub message: String,
}

impl TransportError {
    pub fn new(failure: TransportFailure, message: impl Into<String>) -> Self {
        Self { failure, message: message.into() }
    }
}

/// Blocking transport used by thread-per-worker clients
pub trait Transport: Send + Sync {
    /// Execute one attempt
    fn execute(&self, request: &TransportRequest) -> Result<HttpResponse, TransportError>;
}

/// Suspendable transport used by task-per-worker clients
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Execute one attempt without blocking the executor
    async fn execute_async(&self, request: &TransportRequest)
        -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &TransportRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Arc<T> {
    async fn execute_async(
        &self,
        request: &TransportRequest,
    ) -> Result<HttpResponse, TransportError> {
        (**self).execute_async(request).await
    }
}
