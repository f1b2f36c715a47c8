//! HTTP transport for the Electra mobile API.
//!
//! The remote surface is a single endpoint that takes every command as an
//! HTTP POST with a JSON body, so the transport contract is just
//! `post(body) -> decoded JSON`. The [`Transport`] trait keeps the client
//! testable without a network; [`HttpTransport`] is the production
//! implementation and [`crate::fake_transport::FakeTransport`] the scripted
//! one for tests.
//!
//! reqwest error types stop here: every failure is mapped into
//! [`Error::Timeout`], [`Error::InvalidResponse`] or [`Error::Connection`]
//! before it reaches the orchestration layer.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

use crate::error::{Error, Result};

/// Fixed endpoint all commands are POSTed to.
pub const BASE_URL: &str = "https://app.ecpiot.co.il/mobile/mobilecommand";

/// User-agent the vendor expects; requests without it get rejected.
pub const USER_AGENT: &str = "Electra Client";

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal transport contract: POST a JSON body, get decoded JSON back.
pub trait Transport: Send + Sync {
    fn post(&self, body: Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>>;
}

/// reqwest-backed transport talking to the real Electra endpoint.
///
/// The inner [`reqwest::Client`] holds the connection pool and is shared
/// read-only across concurrent calls.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport pointed at the production endpoint.
    pub fn new() -> Result<Self> {
        Self::with_url(BASE_URL)
    }

    /// Create a transport pointed at an alternate endpoint.
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| Error::Connection(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpoint this transport posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn post(&self, body: Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .json(&body)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            // The endpoint serves JSON with inconsistent content-type
            // headers, so decode the body regardless of what it claims.
            response.json::<Value>().await.map_err(map_reqwest_error)
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else if err.is_decode() {
        Error::InvalidResponse(err.to_string())
    } else {
        Error::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_transport_builds_with_default_endpoint() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.url(), BASE_URL);
    }

    #[test]
    fn http_transport_accepts_custom_endpoint() {
        let transport = HttpTransport::with_url("http://127.0.0.1:8080/mock").unwrap();
        assert_eq!(transport.url(), "http://127.0.0.1:8080/mock");
    }
}
