//! Conversions from reqwest errors into transport errors.
//!
//! `TransportError` lives in core and `reqwest::Error` in reqwest, so the
//! mapping goes through a local extension trait instead of `From`.

use datacollector_common::error_chain;
use datacollector_core::{TransportError, TransportFailure};
use reqwest::Error as HttpError;

/// Convert an infrastructure error into the transport contract
pub trait IntoTransportError {
    fn into_transport(self) -> TransportError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

impl IntoTransportError for HttpError {
    fn into_transport(self) -> TransportError {
        let failure = if self.is_timeout() {
            TransportFailure::Timeout
        } else if self.is_connect() {
            TransportFailure::Connect
        } else if self.is_redirect() {
            TransportFailure::TooManyRedirects
        } else if self.is_request() || self.is_body() || self.is_decode() {
            TransportFailure::Protocol
        } else {
            TransportFailure::Other
        };

        TransportError::new(failure, error_chain(&self))
    }
}

/// Failure to configure the proxy for a request
pub(crate) fn proxy_setup_error(proxy: &str, err: &HttpError) -> TransportError {
    TransportError::new(
        TransportFailure::Proxy,
        format!("invalid proxy {proxy}: {}", error_chain(err)),
    )
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use tokio::runtime::Runtime;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn runtime() -> Runtime {
        Runtime::new().unwrap()
    }

    #[test]
    fn timeout_maps_to_timeout_failure() {
        let rt = runtime();
        let err = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
                .mount(&server)
                .await;

            reqwest::Client::builder()
                .timeout(Duration::from_millis(50))
                .build()
                .unwrap()
                .get(server.uri())
                .send()
                .await
                .unwrap_err()
        });

        let transport = err.into_transport();
        assert_eq!(transport.failure, TransportFailure::Timeout);
    }

    #[test]
    fn refused_connection_maps_to_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let rt = runtime();
        let err = rt.block_on(async {
            reqwest::Client::new().get(format!("http://{addr}")).send().await.unwrap_err()
        });

        let transport = err.into_transport();
        assert_eq!(transport.failure, TransportFailure::Connect);
        assert!(!transport.message.is_empty());
    }

    #[test]
    fn invalid_url_maps_to_other_failure() {
        let rt = runtime();
        let err = rt.block_on(async { reqwest::Client::new().get("not a url").send().await.unwrap_err() });

        assert_eq!(err.into_transport().failure, TransportFailure::Other);
    }
}
