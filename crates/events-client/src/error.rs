//! Error type for the Meshes events client.
//!
//! Every failure the client can produce, from a malformed publishable key to
//! a rejected HTTP response, is reported as an [`ApiError`]. Cases are told
//! apart by `message` and the shape of `data`, not by subtype.

use std::backtrace::{Backtrace, BacktraceStatus};

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{json, Value};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Boxed lower-level error, as produced by transports and body readers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Discriminator carried by every [`ApiError`].
pub const ERROR_NAME: &str = "MeshesApiError";

/// The single error type surfaced by the client.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable description.
    pub message: String,
    /// Optional structured context: validation details, HTTP status and
    /// body, or a description of a wrapped error.
    pub data: Option<Value>,
    /// The wrapped lower-level error, if any.
    #[source]
    pub source: Option<BoxError>,
    stack: Option<String>,
}

impl ApiError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            source: None,
            stack: capture_stack(),
        }
    }

    /// Attach a data payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Wrap a lower-level error. `data` describes the wrapped error so that
    /// it stays serializable; the error itself is kept as the source.
    pub fn wrap(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        let source = source.into();
        let mut err = Self::new(message).with_data(describe_error(source.as_ref()));
        err.source = Some(source);
        err
    }

    /// The fixed discriminator string, [`ERROR_NAME`].
    pub fn name(&self) -> &'static str {
        ERROR_NAME
    }

    /// HTTP status for errors produced from a remote response.
    pub fn status(&self) -> Option<u16> {
        self.data
            .as_ref()?
            .get("status")?
            .as_u64()
            .and_then(|s| u16::try_from(s).ok())
    }

    /// Backtrace captured at construction, when `RUST_BACKTRACE` enabled it.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// JSON form of the error. The stack is included only when requested
    /// and actually captured.
    pub fn to_json(&self, include_stack: bool) -> Value {
        let mut value = json!({
            "name": ERROR_NAME,
            "message": self.message,
        });
        if let Some(data) = &self.data {
            value["data"] = data.clone();
        }
        if include_stack {
            if let Some(stack) = &self.stack {
                value["stack"] = Value::String(stack.clone());
            }
        }
        value
    }
}

impl Serialize for ApiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = if self.data.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("ApiError", len)?;
        state.serialize_field("name", ERROR_NAME)?;
        state.serialize_field("message", &self.message)?;
        if let Some(data) = &self.data {
            state.serialize_field("data", data)?;
        }
        state.end()
    }
}

/// Serializable description of a lower-level error.
pub(crate) fn describe_error(err: &(dyn std::error::Error + 'static)) -> Value {
    let mut value = json!({ "message": err.to_string() });
    if let Some(cause) = err.source() {
        value["cause"] = Value::String(cause.to_string());
    }
    value
}

fn capture_stack() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}
