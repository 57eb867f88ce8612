//! Meshes events client: the per-call request pipeline and emit operations.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{ClientConfig, ClientOptions};
use crate::error::{ApiError, BoxError, Result};
use crate::event::{check_batch_size, validate_batch, validate_event};
use crate::request::{ApiRequest, EffectiveOptions, RequestOptions, BULK_EVENTS_PATH, EVENTS_PATH};
use crate::response::read_body;
use crate::transport::{ReqwestTransport, Transport};

/// The outcome of a request, resolved by awaiting it.
///
/// Nothing is sent until the value is polled.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct PendingResponse {
    inner: BoxFuture<'static, Result<Value>>,
}

impl PendingResponse {
    fn new(fut: impl Future<Output = Result<Value>> + Send + 'static) -> Self {
        Self { inner: fut.boxed() }
    }
}

impl Future for PendingResponse {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl std::fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResponse").finish_non_exhaustive()
    }
}

/// Raised when a request outlives its deadline.
#[derive(Debug, thiserror::Error)]
#[error("request aborted after exceeding its {}ms deadline", .timeout.as_millis())]
pub struct DeadlineExceeded {
    pub timeout: Duration,
}

/// Client for the Meshes events API.
///
/// Cheap to clone; clones share the same configuration and transport, and
/// any number of calls may be in flight at once.
///
/// # Example
///
/// ```rust,ignore
/// use meshes_events_client::{Client, ClientOptions, Event};
///
/// let client = Client::new("mesh_pub_ws_prod_abc123", ClientOptions::default())?;
///
/// // Awaitable form
/// let created = client
///     .emit(&Event::new("user.signed_up", "ada@example.com"), None)?
///     .await?;
///
/// // Callback form
/// client.emit_with_callback(&Event::new("user.login", "ada@example.com"), None, |result| {
///     if let Err(err) = result {
///         eprintln!("emit failed: {err}");
///     }
/// })?;
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client using the default reqwest transport.
    pub fn new(publishable_key: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let config = ClientConfig::new(publishable_key, options)?;
        let transport = ReqwestTransport::new()?;
        Ok(Self::from_parts(config, transport))
    }

    /// Create a client that dispatches through `transport`.
    pub fn with_transport(
        publishable_key: impl Into<String>,
        options: ClientOptions,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        let config = ClientConfig::new(publishable_key, options)?;
        Ok(Self::from_parts(config, transport))
    }

    /// Create a client from `MESHES_PUBLISHABLE_KEY` plus the variables read
    /// by [`ClientOptions::from_env`].
    pub fn from_env() -> Result<Self> {
        let key = std::env::var("MESHES_PUBLISHABLE_KEY")
            .map_err(|e| ApiError::wrap("MESHES_PUBLISHABLE_KEY is not set", e))?;
        Self::new(key, ClientOptions::from_env()?)
    }

    fn from_parts(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Emit a single event.
    ///
    /// The event is validated before anything is sent; a malformed event is
    /// returned as an error right away. Everything after that is reported
    /// through the returned [`PendingResponse`].
    pub fn emit<E>(&self, event: &E, options: Option<RequestOptions>) -> Result<PendingResponse>
    where
        E: Serialize + ?Sized,
    {
        let record = to_record(event)?;
        validate_event(&record)?;

        Ok(self.request(
            ApiRequest::post(EVENTS_PATH)
                .json(record)
                .options(options.unwrap_or_default()),
        ))
    }

    /// Emit a single event and deliver the outcome to `callback` on the
    /// current Tokio runtime.
    pub fn emit_with_callback<E, F>(
        &self,
        event: &E,
        options: Option<RequestOptions>,
        callback: F,
    ) -> Result<()>
    where
        E: Serialize + ?Sized,
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let pending = self.emit(event, options)?;
        deliver(pending, callback)
    }

    /// Emit between 1 and 100 events in one request.
    ///
    /// Every event is validated first; the first invalid one fails the whole
    /// call before anything is sent.
    pub fn emit_batch<E>(&self, events: &[E], options: Option<RequestOptions>) -> Result<PendingResponse>
    where
        E: Serialize,
    {
        check_batch_size(events.len())?;
        let records = events.iter().map(to_record).collect::<Result<Vec<_>>>()?;
        validate_batch(&records)?;

        Ok(self.request(
            ApiRequest::post(BULK_EVENTS_PATH)
                .json(Value::Array(records))
                .options(options.unwrap_or_default()),
        ))
    }

    /// Batch form of [`Client::emit_with_callback`].
    pub fn emit_batch_with_callback<E, F>(
        &self,
        events: &[E],
        options: Option<RequestOptions>,
        callback: F,
    ) -> Result<()>
    where
        E: Serialize,
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let pending = self.emit_batch(events, options)?;
        deliver(pending, callback)
    }

    /// Run a request through the pipeline.
    ///
    /// Validation failures surface when the returned value is awaited, like
    /// any other failure.
    pub fn request(&self, request: ApiRequest) -> PendingResponse {
        let config = Arc::clone(&self.config);
        let transport = Arc::clone(&self.transport);
        PendingResponse::new(async move { execute(&config, transport.as_ref(), request).await })
    }

    /// Run a request and deliver the outcome to `callback`.
    pub fn request_with_callback<F>(&self, request: ApiRequest, callback: F) -> Result<()>
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        deliver(self.request(request), callback)
    }
}

fn to_record<E: Serialize + ?Sized>(event: &E) -> Result<Value> {
    serde_json::to_value(event).map_err(|e| ApiError::wrap("Event could not be serialized", e))
}

fn deliver<F>(pending: PendingResponse, callback: F) -> Result<()>
where
    F: FnOnce(Result<Value>) + Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|e| ApiError::wrap("Callback delivery requires a Tokio runtime", e))?;
    handle.spawn(async move { callback(pending.await) });
    Ok(())
}

async fn execute(config: &ClientConfig, transport: &dyn Transport, request: ApiRequest) -> Result<Value> {
    let effective = EffectiveOptions::resolve(config, request);
    let method = effective.validate()?;
    let timeout = effective.timeout;
    let request = effective.into_transport_request(method)?;
    let deadline = request.deadline.map(|budget| Instant::now() + budget);

    if config.debug() {
        debug!(
            method = method.as_str(),
            url = %request.url,
            timeout_ms = timeout.as_millis() as u64,
            deadline = deadline.is_some(),
            "Sending request"
        );
    }

    let response = match within(deadline, timeout, transport.send(request)).await {
        Ok(response) => response,
        Err(err) => {
            if config.debug() {
                warn!(error = %err, "Request failed before a response was received");
            }
            return Err(ApiError::wrap("Request Failure", err));
        }
    };

    let ok = response.ok();
    let status = response.status();
    let status_text = response.status_text().to_string();
    let body = within(deadline, timeout, read_body(response)).await;

    match (ok, body) {
        (true, Ok(value)) => {
            if config.debug() {
                debug!(status, "Response received");
            }
            Ok(value)
        }
        (true, Err(err)) => {
            if config.debug() {
                warn!(status, error = %err, "Failed to read response body");
            }
            Err(ApiError::wrap("Error parsing response data", err))
        }
        (false, Ok(data)) => {
            if config.debug() {
                warn!(status, status_text = %status_text, "Non-success response");
            }
            Err(ApiError::new("Meshes API request failed").with_data(json!({
                "status": status,
                "statusText": status_text,
                "data": data,
            })))
        }
        (false, Err(err)) => {
            if config.debug() {
                warn!(status, error = %err, "Failed to read error response body");
            }
            let mut api_err = ApiError::wrap("Error parsing response data", err);
            api_err.data = Some(json!({
                "status": status,
                "statusText": status_text,
                "error": api_err.data.take(),
            }));
            Err(api_err)
        }
    }
}

/// Await `fut`, giving up at `deadline` when one is set.
async fn within<T, F>(
    deadline: Option<Instant>,
    timeout: Duration,
    fut: F,
) -> std::result::Result<T, BoxError>
where
    F: Future<Output = std::result::Result<T, BoxError>>,
{
    match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(Box::new(DeadlineExceeded { timeout })),
        },
        None => fut.await,
    }
}
