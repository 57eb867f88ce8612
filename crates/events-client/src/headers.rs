//! Header contract and cleaning rules.
//!
//! Four headers are owned by the client: the publishable key, the client
//! identity, `Content-Type` and `Accept`. Caller-supplied headers can never
//! set or override them. At construction time a reserved name is a hard
//! error (see [`crate::ClientConfig`]); per call it is silently dropped by
//! [`clean_headers`].

use serde_json::{Map, Value};

/// Header carrying the publishable key.
pub const PUBLISHABLE_KEY_HEADER: &str = "X-Meshes-Publishable-Key";

/// Header identifying this client library and its version.
pub const CLIENT_HEADER: &str = "X-Meshes-Client";

/// Content type header name.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Accept header name.
pub const ACCEPT_HEADER: &str = "Accept";

/// Media type used for both request and response bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Header names that caller input can never set, compared case-insensitively.
pub const RESERVED_HEADERS: [&str; 4] = [
    PUBLISHABLE_KEY_HEADER,
    CLIENT_HEADER,
    CONTENT_TYPE_HEADER,
    ACCEPT_HEADER,
];

/// Returns true if `name` matches a reserved header, ignoring ASCII case.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Ordered header mapping with exact-key replacement.
///
/// Keys are compared exactly on insert, so `accept` and `Accept` are two
/// entries; reserved-name checks are the case-insensitive part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing an existing entry with the same key.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get a header value by exact key.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header value, ignoring ASCII case.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Overlay `other` on top of `self`; `other` wins on key collision.
    pub fn overlay(&mut self, other: &Headers) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the mapping into its entries.
    pub fn into_vec(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Clean caller-supplied headers.
///
/// Keys and values are trimmed; entries whose trimmed key or value is
/// empty are dropped, as are entries naming a reserved header.
pub fn clean_headers<I, K, V>(headers: I) -> Headers
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut cleaned = Headers::new();
    for (name, value) in headers {
        let name = name.as_ref().trim();
        let value = value.as_ref().trim();
        if name.is_empty() || value.is_empty() || is_reserved(name) {
            continue;
        }
        cleaned.insert(name, value);
    }
    cleaned
}

/// Clean a loosely-typed header object: entries whose value is not a
/// string are dropped before the rules of [`clean_headers`] apply.
pub fn clean_json_headers(headers: &Map<String, Value>) -> Headers {
    clean_headers(
        headers
            .iter()
            .filter_map(|(name, value)| value.as_str().map(|v| (name.as_str(), v))),
    )
}
