//! Transport boundary: the only place the client touches the network.
//!
//! A [`Transport`] performs exactly one HTTP exchange per call. The default
//! [`ReqwestTransport`] uses a shared `reqwest::Client`; tests and embedders
//! can supply their own implementation.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{ApiError, BoxError, Result};
use crate::request::RequestMethod;

/// A fully built outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: RequestMethod,
    /// Absolute URL including the query string.
    pub url: String,
    /// Headers in the order they should be sent.
    pub headers: Vec<(String, String)>,
    /// Serialized body; `None` sends no body.
    pub body: Option<String>,
    /// Time budget for the exchange. `None` when deadlines are disabled.
    pub deadline: Option<Duration>,
}

impl TransportRequest {
    /// Look up a header, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

type BodyFuture = BoxFuture<'static, std::result::Result<String, BoxError>>;

/// Response handed back by a transport. The body is read at most once.
pub struct TransportResponse {
    ok: bool,
    status: u16,
    status_text: String,
    body: BodyFuture,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("ok", &self.ok)
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .finish_non_exhaustive()
    }
}

impl TransportResponse {
    /// Create a response whose body is produced by `body`. `ok` is derived
    /// from the status (2xx).
    pub fn new<F>(status: u16, status_text: impl Into<String>, body: F) -> Self
    where
        F: Future<Output = std::result::Result<String, BoxError>> + Send + 'static,
    {
        Self {
            ok: (200..300).contains(&status),
            status,
            status_text: status_text.into(),
            body: body.boxed(),
        }
    }

    /// Create a response with an already available text body.
    pub fn from_text(status: u16, status_text: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(status, status_text, async move { Ok(text) })
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Read the whole body as text.
    pub async fn text(self) -> std::result::Result<String, BoxError> {
        self.body.await
    }
}

/// A fetch-like HTTP transport.
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange. Network failures are returned as errors;
    /// non-2xx responses are returned as responses.
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, std::result::Result<TransportResponse, BoxError>>;
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh `reqwest::Client`.
    pub fn new() -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(crate::CLIENT_ID)
            .build()
            .map_err(|e| ApiError::wrap("Failed to build HTTP client", e))?;
        Ok(Self { inner })
    }

    /// Use an existing `reqwest::Client`, e.g. to share a connection pool.
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, std::result::Result<TransportResponse, BoxError>> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(deadline) = request.deadline {
            req = req.timeout(deadline);
        }

        async move {
            let response = req.send().await?;
            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or_default();

            Ok::<_, BoxError>(TransportResponse::new(
                status.as_u16(),
                status_text,
                async move { response.text().await.map_err(BoxError::from) },
            ))
        }
        .boxed()
    }
}
