//! reqwest-backed implementation of the transport ports.
//!
//! Proxy, redirect policy and timeout are client-level settings in reqwest,
//! and all three vary per request, so a client is built for each attempt.
//! The blocking side uses `reqwest::blocking` and must not run on an async
//! worker thread; wrap it in `spawn_blocking` when called from async code.

use async_trait::async_trait;
use datacollector_core::{
    AsyncTransport, HttpMethod, HttpResponse, RequestBody, Transport, TransportError,
    TransportRequest,
};
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::{Method, Proxy};
use tracing::trace;

use crate::errors::conversions::proxy_setup_error;
use crate::errors::IntoTransportError;

/// Redirect hops followed before giving up
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Transport executing requests with reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    user_agent: Option<String>,
    max_redirects: usize,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Transport with reqwest's default user agent and redirect limit
    pub fn new() -> Self {
        Self::builder().build()
    }

    fn redirect_policy(&self, request: &TransportRequest) -> Policy {
        if request.follow_redirects {
            Policy::limited(self.max_redirects)
        } else {
            Policy::none()
        }
    }

    fn proxy(request: &TransportRequest) -> Result<Option<Proxy>, TransportError> {
        request
            .proxy
            .as_deref()
            .map(|url| Proxy::all(url).map_err(|err| proxy_setup_error(url, &err)))
            .transpose()
    }

    fn blocking_client(
        &self,
        request: &TransportRequest,
    ) -> Result<reqwest::blocking::Client, TransportError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(request.timeout)
            .redirect(self.redirect_policy(request));

        builder = match Self::proxy(request)? {
            Some(proxy) => builder.proxy(proxy),
            None => builder.no_proxy(),
        };
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.as_str());
        }

        builder.build().map_err(IntoTransportError::into_transport)
    }

    fn async_client(&self, request: &TransportRequest) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder()
            .timeout(request.timeout)
            .redirect(self.redirect_policy(request));

        builder = match Self::proxy(request)? {
            Some(proxy) => builder.proxy(proxy),
            None => builder.no_proxy(),
        };
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.as_str());
        }

        builder.build().map_err(IntoTransportError::into_transport)
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}

/// Shared request decoration for both reqwest builders
macro_rules! decorate {
    ($builder:expr, $request:expr) => {{
        let request: &TransportRequest = $request;
        let mut builder = $builder;
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = request.cookie_header() {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(auth) = &request.auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }
        match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Bytes(bytes)) => builder.body(bytes.clone()),
            None => builder,
        }
    }};
}

fn into_response(status: u16, headers: &HeaderMap, body: Vec<u8>) -> HttpResponse {
    let mut response = HttpResponse::new(status).with_body(body);
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            response = response.with_header(name.as_str(), value);
        }
    }
    response
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &TransportRequest) -> Result<HttpResponse, TransportError> {
        trace!(method = %request.method, url = %request.url, "executing blocking request");
        let client = self.blocking_client(request)?;
        let builder = decorate!(client.request(method(request.method), &request.url), request);

        let response = builder.send().map_err(IntoTransportError::into_transport)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(IntoTransportError::into_transport)?;

        Ok(into_response(status, &headers, body.to_vec()))
    }
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
    async fn execute_async(&self, request: &TransportRequest) -> Result<HttpResponse, TransportError> {
        trace!(method = %request.method, url = %request.url, "executing async request");
        let client = self.async_client(request)?;
        let builder = decorate!(client.request(method(request.method), &request.url), request);

        let response = builder.send().await.map_err(IntoTransportError::into_transport)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(IntoTransportError::into_transport)?;

        Ok(into_response(status, &headers, body.to_vec()))
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    user_agent: Option<String>,
    max_redirects: usize,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self { user_agent: None, max_redirects: DEFAULT_MAX_REDIRECTS }
    }
}

impl ReqwestTransportBuilder {
    /// Default `User-Agent`; a session header of the same name wins
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }

    pub fn build(self) -> ReqwestTransport {
        ReqwestTransport { user_agent: self.user_agent, max_redirects: self.max_redirects }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use datacollector_core::TransportFailure;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn get(url: String) -> TransportRequest {
        TransportRequest::new(HttpMethod::Get, url, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn returns_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(418)
                    .insert_header("X-Custom", "yes")
                    .set_body_string("teapot"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response =
            ReqwestTransport::new().execute_async(&get(format!("{}/page", server.uri()))).await.unwrap();

        assert_eq!(response.status, 418);
        assert_eq!(response.header("x-custom"), Some("yes"));
        assert_eq!(response.body, b"teapot");
    }

    #[tokio::test]
    async fn user_agent_is_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "collector-test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::builder().user_agent("collector-test").build();
        let response = transport.execute_async(&get(server.uri())).await.unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn redirects_are_not_followed_when_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
            .mount(&server)
            .await;

        let mut request = get(format!("{}/old", server.uri()));
        request.follow_redirects = false;
        let response = ReqwestTransport::new().execute_async(&request).await.unwrap();

        assert_eq!(response.status, 302);
        assert_eq!(response.header("location"), Some("/new"));
    }

    #[tokio::test]
    async fn redirect_loop_exceeds_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::builder().max_redirects(3).build();
        let err = transport.execute_async(&get(format!("{}/loop", server.uri()))).await.unwrap_err();

        assert_eq!(err.failure, TransportFailure::TooManyRedirects);
    }
}
