//! Event records and their validation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ApiError, Result};

/// Maximum number of events accepted by a single batch call.
pub const MAX_BATCH_SIZE: usize = 100;

/// An event to emit.
///
/// Any `Serialize` value with the same shape can be emitted; this type is a
/// convenience for building one.
///
/// ```rust
/// use meshes_events_client::Event;
///
/// let event = Event::new("user.signed_up", "ada@example.com")
///     .with_field("plan", "pro")
///     .resource("account")
///     .resource_id("acc_42");
/// assert_eq!(event.payload["plan"], "pro");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name.
    pub event: String,
    /// Event payload; must contain a non-blank `email`.
    pub payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl Event {
    /// Create an event whose payload holds only `email`.
    pub fn new(event: impl Into<String>, email: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("email".to_string(), Value::String(email.into()));
        Self {
            event: event.into(),
            payload,
            resource: None,
            resource_id: None,
        }
    }

    /// Add a payload field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

/// Validate one event record.
///
/// Only `event` and `payload.email` are checked; all other fields pass
/// through untouched.
pub fn validate_event(record: &Value) -> Result<()> {
    let record = record
        .as_object()
        .ok_or_else(|| ApiError::new("Event must be an object"))?;

    if !is_non_blank(record.get("event")) {
        return Err(ApiError::new("Event name is required").with_data(json!({ "field": "event" })));
    }

    let payload = record
        .get("payload")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ApiError::new("Event payload must be an object").with_data(json!({ "field": "payload" }))
        })?;

    if !is_non_blank(payload.get("email")) {
        return Err(ApiError::new("Event payload.email is required")
            .with_data(json!({ "field": "payload.email" })));
    }

    Ok(())
}

/// Validate a batch: between 1 and [`MAX_BATCH_SIZE`] events, each valid.
/// Fails on the first invalid element, reporting its index.
pub fn validate_batch(records: &[Value]) -> Result<()> {
    check_batch_size(records.len())?;

    for (index, record) in records.iter().enumerate() {
        validate_event(record).map_err(|err| {
            let mut data = json!({ "index": index });
            if let Some(Value::Object(context)) = &err.data {
                for (k, v) in context {
                    data[k] = v.clone();
                }
            }
            ApiError::new(format!("Invalid event at index {index}: {}", err.message)).with_data(data)
        })?;
    }

    Ok(())
}

/// Check that a batch holds between 1 and [`MAX_BATCH_SIZE`] events.
pub(crate) fn check_batch_size(count: usize) -> Result<()> {
    if count == 0 {
        return Err(ApiError::new("Events must be a non-empty array"));
    }
    if count > MAX_BATCH_SIZE {
        return Err(
            ApiError::new(format!("A batch may contain at most {MAX_BATCH_SIZE} events"))
                .with_data(json!({ "count": count, "max": MAX_BATCH_SIZE })),
        );
    }
    Ok(())
}

fn is_non_blank(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}
