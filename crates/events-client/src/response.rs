//! Response body reading.

use serde_json::Value;

use crate::error::BoxError;
use crate::transport::TransportResponse;

/// Read a response body and classify it.
///
/// - empty text becomes `Value::Null`
/// - text that parses as JSON becomes the parsed value
/// - anything else is returned unmodified as `Value::String`
///
/// Errors raised while reading the body are returned as-is; the caller
/// decides how to wrap them.
pub async fn read_body(response: TransportResponse) -> Result<Value, BoxError> {
    let text = response.text().await?;
    Ok(parse_body(text))
}

/// Classify already-read body text. See [`read_body`].
pub fn parse_body(text: String) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}
