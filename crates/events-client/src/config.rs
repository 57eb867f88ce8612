//! Client configuration.
//!
//! Settings are layered: built-in defaults, then [`ClientOptions`] supplied
//! at construction, then per-call [`crate::RequestOptions`]. Construction
//! validates everything once and produces an immutable [`ClientConfig`]
//! that every request reads from.

use std::sync::LazyLock;
use std::time::Duration;

use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::headers::{
    is_reserved, Headers, ACCEPT_HEADER, CLIENT_HEADER, CONTENT_TYPE_HEADER, JSON_MEDIA_TYPE,
    PUBLISHABLE_KEY_HEADER,
};

/// The only API version the client speaks.
pub const SUPPORTED_VERSION: &str = "v1";

/// Host used to derive the base URL when none is given.
pub const DEFAULT_HOST: &str = "events.meshes.io";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Smallest accepted timeout, inclusive.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(1_000);

/// Largest accepted timeout, inclusive.
pub const MAX_TIMEOUT: Duration = Duration::from_millis(30_000);

static PUBLISHABLE_KEY_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^mesh_pub_[A-Za-z0-9.-]+_[A-Za-z0-9.-]+_[^_]+$")
        .expect("publishable key pattern is valid")
});

/// Check a publishable key against the structural pattern
/// `mesh_pub_<segment>_<segment>_<segment>`.
pub fn validate_publishable_key(key: &str) -> Result<()> {
    if PUBLISHABLE_KEY_PATTERN.is_match(key) {
        Ok(())
    } else {
        Err(ApiError::new("Invalid publishable key format"))
    }
}

/// Check a timeout against the inclusive [1000, 30000] ms bound.
pub fn validate_timeout(timeout: Duration) -> Result<()> {
    validate_timeout_ms(timeout.as_secs_f64() * 1_000.0)
}

pub(crate) fn validate_timeout_ms(ms: f64) -> Result<()> {
    let min = MIN_TIMEOUT.as_millis() as f64;
    let max = MAX_TIMEOUT.as_millis() as f64;
    if (min..=max).contains(&ms) {
        Ok(())
    } else {
        Err(
            ApiError::new(format!("Timeout must be between {min} and {max} milliseconds"))
                .with_data(serde_json::json!({ "timeout": ms })),
        )
    }
}

/// Options supplied when constructing a client. Unset fields keep their
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub(crate) version: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) debug: Option<bool>,
    pub(crate) api_base_url: Option<String>,
    pub(crate) deadlines: Option<bool>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API version. Only `"v1"` is accepted.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a default header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several default headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Enable diagnostic logging.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    /// Override the base URL, e.g. for a staging deployment or a mock server.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Whether the host can enforce request deadlines. When disabled no
    /// timeout is applied to any request.
    pub fn deadlines(mut self, enabled: bool) -> Self {
        self.deadlines = Some(enabled);
        self
    }

    /// Build options from a loosely-typed JSON object such as
    /// `{"version": "v1", "timeout": 8000, "headers": {...}, "debug": true,
    /// "apiBaseUrl": "..."}`. Unknown keys are ignored.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Err(ApiError::new("Options must not be null")),
            _ => return Err(ApiError::new("Options must be an object")),
        };

        let mut options = ClientOptions::new();

        if let Some(version) = map.get("version") {
            let version = version
                .as_str()
                .ok_or_else(|| ApiError::new("Version must be a string"))?;
            options.version = Some(version.to_string());
        }

        if let Some(timeout) = map.get("timeout") {
            let ms = timeout
                .as_f64()
                .ok_or_else(|| ApiError::new("Timeout must be a number"))?;
            validate_timeout_ms(ms)?;
            options.timeout = Some(Duration::from_secs_f64(ms / 1_000.0));
        }

        if let Some(headers) = map.get("headers") {
            let headers = headers
                .as_object()
                .ok_or_else(|| ApiError::new("Headers must be an object"))?;
            for (name, value) in headers {
                let value = value.as_str().ok_or_else(|| {
                    ApiError::new("Header values must be strings")
                        .with_data(serde_json::json!({ "header": name }))
                })?;
                options.headers.push((name.clone(), value.to_string()));
            }
        }

        if let Some(debug) = map.get("debug") {
            let debug = debug
                .as_bool()
                .ok_or_else(|| ApiError::new("Debug must be a boolean"))?;
            options.debug = Some(debug);
        }

        if let Some(url) = map.get("apiBaseUrl") {
            let url = url
                .as_str()
                .ok_or_else(|| ApiError::new("apiBaseUrl must be a string"))?;
            options.api_base_url = Some(url.to_string());
        }

        Ok(options)
    }

    /// Build options from `MESHES_API_BASE_URL`, `MESHES_API_VERSION`,
    /// `MESHES_TIMEOUT_MS` and `MESHES_DEBUG`. Unset variables keep defaults.
    pub fn from_env() -> Result<Self> {
        let mut options = ClientOptions::new();

        if let Some(url) = non_empty_env("MESHES_API_BASE_URL") {
            options = options.api_base_url(url);
        }

        if let Some(version) = non_empty_env("MESHES_API_VERSION") {
            options = options.version(version);
        }

        if let Some(timeout) = non_empty_env("MESHES_TIMEOUT_MS") {
            let ms: u64 = timeout.parse().map_err(|e| {
                ApiError::wrap("MESHES_TIMEOUT_MS must be an integer", e)
            })?;
            options = options.timeout(Duration::from_millis(ms));
        }

        if let Some(debug) = non_empty_env("MESHES_DEBUG") {
            options = options.debug(matches!(debug.as_str(), "1" | "true" | "TRUE" | "yes"));
        }

        Ok(options)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Immutable, validated configuration shared by every request of a client.
///
/// The publishable key is redacted in Debug output.
#[derive(Clone)]
pub struct ClientConfig {
    publishable_key: String,
    api_base_url: String,
    version: String,
    default_timeout: Duration,
    additional_headers: Headers,
    headers: Headers,
    debug: bool,
    deadlines: bool,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("publishable_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("version", &self.version)
            .field("default_timeout", &self.default_timeout)
            .field("additional_headers", &self.additional_headers)
            .field("debug", &self.debug)
            .field("deadlines", &self.deadlines)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Validate a publishable key and options.
    pub fn new(publishable_key: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let publishable_key = publishable_key.into();
        validate_publishable_key(&publishable_key)?;

        let version = options
            .version
            .unwrap_or_else(|| SUPPORTED_VERSION.to_string());
        if version != SUPPORTED_VERSION {
            return Err(ApiError::new(format!(
                "Unsupported API version: {version}"
            ))
            .with_data(serde_json::json!({ "version": version })));
        }

        let default_timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT);
        validate_timeout(default_timeout)?;

        let mut additional_headers = Headers::new();
        for (name, value) in &options.headers {
            let name = name.trim();
            if is_reserved(name) {
                return Err(ApiError::new(format!(
                    "Header {name} is reserved and cannot be overridden"
                ))
                .with_data(serde_json::json!({ "header": name })));
            }
            let value = value.trim();
            if !name.is_empty() && !value.is_empty() {
                additional_headers.insert(name, value);
            }
        }

        let api_base_url = match options.api_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{DEFAULT_HOST}/api/{version}"),
        };

        let mut headers = additional_headers.clone();
        headers.overlay(&contract_headers(&publishable_key));

        Ok(Self {
            publishable_key,
            api_base_url,
            version,
            default_timeout,
            additional_headers,
            headers,
            debug: options.debug.unwrap_or(false),
            deadlines: options.deadlines.unwrap_or(true),
        })
    }

    pub fn publishable_key(&self) -> &str {
        &self.publishable_key
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Cleaned caller headers from construction, without contract headers.
    pub fn additional_headers(&self) -> &Headers {
        &self.additional_headers
    }

    /// Default headers for every request: additional headers overlaid by the
    /// contract headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Whether request deadlines are enforced.
    pub fn deadlines(&self) -> bool {
        self.deadlines
    }
}

/// The headers the client always sends.
fn contract_headers(publishable_key: &str) -> Headers {
    [
        (PUBLISHABLE_KEY_HEADER, publishable_key),
        (CLIENT_HEADER, crate::CLIENT_ID),
        (CONTENT_TYPE_HEADER, JSON_MEDIA_TYPE),
        (ACCEPT_HEADER, JSON_MEDIA_TYPE),
    ]
    .into_iter()
    .collect()
}
