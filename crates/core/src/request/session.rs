//! Client session state and request assembly
//!
//! A session holds the headers, cookies, basic auth and proxy that every
//! future request from one client carries. It is owned by a single client
//! and changes only through its setters.

use std::collections::BTreeMap;
use std::time::Duration;

use datacollector_domain::constants::{DIRECT_PROXY_KEY, UNKNOWN_PROXY_KEY};
use url::Url;

use crate::transport_ports::{BasicAuth, HttpMethod, RequestBody, TransportRequest};

/// Per-call additions on top of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Merged over session headers; per-call values win
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self
    }
}

/// Headers, cookies, auth and proxy shared by one client's requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    auth: Option<BasicAuth>,
    proxy: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default headers
    pub fn set_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    }

    pub fn reset_headers(&mut self) {
        self.headers.clear();
    }

    /// Replace the session cookies
    pub fn set_cookies<I, K, V>(&mut self, cookies: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.cookies = cookies.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    }

    pub fn reset_cookies(&mut self) {
        self.cookies.clear();
    }

    pub fn set_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.auth = Some(BasicAuth { username: username.into(), password: password.into() });
    }

    /// Set or clear the forward proxy URL
    pub fn set_proxy(&mut self, proxy: Option<String>) {
        self.proxy = proxy.filter(|p| !p.is_empty());
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn auth(&self) -> Option<&BasicAuth> {
        self.auth.as_ref()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Metrics key for the current proxy: `host:port` without credentials
    pub fn proxy_key(&self) -> String {
        self.proxy.as_deref().map_or_else(|| DIRECT_PROXY_KEY.to_string(), proxy_key)
    }

    /// Resolve one attempt's request from session state and call options
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        options: RequestOptions,
        timeout: Duration,
    ) -> TransportRequest {
        let mut headers = self.headers.clone();
        headers.extend(options.headers);

        TransportRequest {
            method,
            url: url.to_string(),
            query: options.query,
            headers,
            cookies: self.cookies.clone(),
            auth: self.auth.clone(),
            proxy: self.proxy.clone(),
            timeout,
            follow_redirects: true,
            body: options.body,
        }
    }
}

/// Authority (`host[:port]`) of `url`; empty when it cannot be parsed
pub fn extract_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Sanitized proxy identifier, or `unknown` when the URL cannot be parsed
pub fn proxy_key(proxy_url: &str) -> String {
    match Url::parse(proxy_url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            }
        }
        Err(_) => UNKNOWN_PROXY_KEY.to_string(),
    }
}
