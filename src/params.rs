//! Route parameters and query strings
//!
//! [`RouteParams`] holds values extracted from pattern segments (like `:name`)
//! and from submitted form fields. [`QueryParams`] holds the `?page=1&tag=a`
//! part of a location, in document order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named parameters carried by a request
///
/// # Example
///
/// ```
/// use history_router::RouteParams;
///
/// // Route pattern: /welcome/:name
/// // Matched path:  /welcome/bob
/// let mut params = RouteParams::new();
/// params.insert("name", "bob");
///
/// assert_eq!(params.get("name"), Some("bob"));
/// assert_eq!(params.get_as::<u32>("name"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create new empty params
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from hashmap
    pub fn from_map(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Insert a parameter, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Merge `other` into `self`; values from `other` win
    pub fn merge(&mut self, other: RouteParams) {
        self.params.extend(other.params);
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Iterate over all parameters
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters parsed from a location's query string
///
/// Pairs keep their document order, so a query string survives a
/// parse/serialize cycle unchanged apart from normalized escaping.
///
/// # Example
///
/// ```
/// use history_router::QueryParams;
///
/// let query = QueryParams::from_query_string("page=1&tag=rust&tag=wasm");
///
/// assert_eq!(query.get("page"), Some("1"));
/// assert_eq!(query.get_as::<i32>("page"), Some(1));
/// assert_eq!(query.get_all("tag"), vec!["rust", "wasm"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a query string, with or without the leading `?`
    ///
    /// A key without `=` gets an empty value.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_form_component(key), decode_form_component(value))
            })
            .collect();

        Self { pairs }
    }

    /// Get the first value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get all values for a key, in order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Append a pair
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize back to a query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    encode_uri_component(key),
                    encode_uri_component(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of pairs, counting repeated keys
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

/// Percent-encode everything outside the unreserved set
pub(crate) fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Decode `%XX` escapes in a path segment; `+` stays literal
///
/// Malformed escapes are kept literally. Invalid UTF-8 is replaced.
pub(crate) fn decode_uri_component(s: &str) -> String {
    percent_decode(s, false)
}

/// Decode an `application/x-www-form-urlencoded` component: `%XX` and `+`
pub(crate) fn decode_form_component(s: &str) -> String {
    percent_decode(s, true)
}

fn percent_decode(s: &str, plus_as_space: bool) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let decoded = s
                    .get(i + 1..i + 3)
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(byte) = decoded {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b'+' if plus_as_space => out.push(b' '),
            byte => out.push(byte),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

// ============================================================================
// Tests
// ============================================================================
