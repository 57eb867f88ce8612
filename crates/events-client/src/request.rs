//! Request description, per-call options, and option layering.

use std::time::Duration;

use serde_json::Value;

use crate::config::{validate_timeout, validate_timeout_ms, ClientConfig};
use crate::error::{ApiError, Result};
use crate::headers::{clean_headers, clean_json_headers, Headers};
use crate::transport::TransportRequest;

/// Path for single events, relative to the API base URL.
pub const EVENTS_PATH: &str = "/events";

/// Path for batched events, relative to the API base URL.
pub const BULK_EVENTS_PATH: &str = "/events/bulk";

/// HTTP request method. The events API only accepts POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Post,
}

impl RequestMethod {
    /// Parse a method name, case-insensitively.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "POST" => Some(RequestMethod::Post),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Post => "POST",
        }
    }

    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Request body content.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent verbatim.
    Text(String),
    /// Serialized as JSON.
    Json(Value),
}

impl RequestBody {
    fn serialize(&self) -> Result<String> {
        match self {
            RequestBody::Text(text) => Ok(text.clone()),
            RequestBody::Json(value) => serde_json::to_string(value)
                .map_err(|e| ApiError::wrap("Error serializing request body", e)),
        }
    }
}

/// Options for a single call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header. Reserved headers are dropped when the request is built.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Override the client's default timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build options from a loosely-typed JSON object
    /// `{"headers": {...}, "query": {...}, "timeout": 8000}`.
    ///
    /// Headers are lenient: non-object `headers` and non-string values are
    /// dropped. `query` must be an object of strings, numbers or booleans
    /// (`null` values are skipped) and `timeout` must be a number within
    /// the same bound as the client default.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ApiError::new("Request options must be an object"))?;

        let mut options = RequestOptions::new();

        if let Some(Value::Object(headers)) = map.get("headers") {
            options.headers = clean_json_headers(headers).into_vec();
        }

        match map.get("query") {
            None | Some(Value::Null) => {}
            Some(Value::Object(query)) => {
                for (name, value) in query {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        Value::Null => continue,
                        _ => {
                            return Err(ApiError::new(
                                "Query values must be strings, numbers or booleans",
                            )
                            .with_data(serde_json::json!({ "query": name })))
                        }
                    };
                    options.query.push((name.clone(), value));
                }
            }
            Some(_) => return Err(ApiError::new("Query must be an object")),
        }

        if let Some(timeout) = map.get("timeout") {
            let ms = timeout
                .as_f64()
                .ok_or_else(|| ApiError::new("Timeout must be a number"))?;
            validate_timeout_ms(ms)?;
            options.timeout = Some(Duration::from_secs_f64(ms / 1_000.0));
        }

        Ok(options)
    }
}

/// A request for the pipeline: method, path, body and per-call options.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) body: Option<RequestBody>,
    pub(crate) options: RequestOptions,
}

impl ApiRequest {
    /// Create a new request. Method and path are validated when it runs.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// POST to `path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post.as_str(), path)
    }

    /// Set a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Set a body sent verbatim.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Fully merged settings for one call.
///
/// | setting  | source                                             |
/// |----------|----------------------------------------------------|
/// | timeout  | per-call override, else client default             |
/// | headers  | cleaned per-call headers < client default headers  |
/// | query    | per-call only                                      |
/// | deadline | client capability flag                             |
#[derive(Debug, Clone)]
pub(crate) struct EffectiveOptions {
    pub method: String,
    pub path: String,
    pub url: String,
    pub headers: Headers,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Duration,
    pub timeout_overridden: bool,
    pub deadlines: bool,
}

impl EffectiveOptions {
    /// Merge the client configuration with a request. No validation happens
    /// here.
    pub fn resolve(config: &ClientConfig, request: ApiRequest) -> Self {
        let path = request.path.trim().to_string();
        let mut headers = clean_headers(request.options.headers);
        headers.overlay(config.headers());

        let url = join_url(config.api_base_url(), &path);

        Self {
            method: request.method,
            path,
            url,
            headers,
            query: request.options.query,
            body: request.body,
            timeout: request.options.timeout.unwrap_or(config.default_timeout()),
            timeout_overridden: request.options.timeout.is_some(),
            deadlines: config.deadlines(),
        }
    }

    /// Check method, path and an overridden timeout.
    pub fn validate(&self) -> Result<RequestMethod> {
        if self.method.is_empty() {
            return Err(ApiError::new("Request method is required"));
        }
        let method = RequestMethod::parse(&self.method).ok_or_else(|| {
            ApiError::new(format!("Unsupported request method: {}", self.method))
                .with_data(serde_json::json!({ "method": self.method }))
        })?;

        if self.path.is_empty() || self.path == "/" {
            return Err(ApiError::new("Request path is required")
                .with_data(serde_json::json!({ "path": self.path })));
        }

        if self.timeout_overridden {
            validate_timeout(self.timeout)?;
        }

        Ok(method)
    }

    /// Build the outgoing request.
    pub fn into_transport_request(self, method: RequestMethod) -> Result<TransportRequest> {
        let mut url = self.url;
        if !self.query.is_empty() {
            let query = serde_urlencoded::to_string(&self.query)
                .map_err(|e| ApiError::wrap("Error encoding query string", e))?;
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
        }

        let body = self.body.as_ref().map(RequestBody::serialize).transpose()?;

        Ok(TransportRequest {
            method,
            url,
            headers: self.headers.into_vec(),
            body,
            deadline: self.deadlines.then_some(self.timeout),
        })
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
