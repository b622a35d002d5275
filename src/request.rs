//! Navigation requests
//!
//! A [`Request`] is the normalized form of every navigation intent the router
//! sees: a link click, a form submission, a programmatic push, or a native
//! back/forward. It is immutable once built; the `with_*` methods consume the
//! value and return a new one.

use crate::dom::{FormSubmit, LinkClick};
use crate::params::{QueryParams, RouteParams};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Method
// ============================================================================

/// HTTP-verb-like request method
///
/// Parsing is case-insensitive; unknown verbs are kept upper-cased in
/// [`Method::Custom`] so that lookup still compares them exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Custom(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Custom(verb) => verb,
        }
    }
}

impl From<&str> for Method {
    fn from(verb: &str) -> Self {
        let upper = verb.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            _ => Method::Custom(upper),
        }
    }
}

impl From<String> for Method {
    fn from(verb: String) -> Self {
        Method::from(verb.as_str())
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Location
// ============================================================================

/// The host's current location: URL (path, query, fragment) and document title
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub url: String,
    pub title: String,
}

impl Location {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// Path component, without query or fragment
    pub fn path(&self) -> &str {
        split_url(&self.url).0
    }
}

/// Split a URL into its path and query, dropping any fragment
///
/// An empty path becomes `/`.
pub(crate) fn split_url(url: &str) -> (&str, &str) {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    (if path.is_empty() { "/" } else { path }, query)
}

// ============================================================================
// Request
// ============================================================================

/// The DOM event a request was built from
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Click(LinkClick),
    Submit(FormSubmit),
}

/// A single navigation intent
///
/// # Example
///
/// ```
/// use history_router::{Method, Request};
///
/// let request = Request::get("/search?q=rust").with_title("Search");
///
/// assert_eq!(request.method(), &Method::Get);
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.query().get("q"), Some("rust"));
/// assert_eq!(request.url(), "/search?q=rust");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    method: Method,
    path: String,
    #[serde(default)]
    params: RouteParams,
    #[serde(default)]
    query: QueryParams,
    #[serde(default)]
    title: String,
    /// Never carried through history state
    #[serde(skip)]
    raw: Option<RawEvent>,
}

impl Request {
    /// Create a request for `url`, which may carry a query and a fragment
    pub fn new(method: impl Into<Method>, url: &str) -> Self {
        let (path, query) = split_url(url);
        Self {
            method: method.into(),
            path: path.to_string(),
            params: RouteParams::new(),
            query: QueryParams::from_query_string(query),
            title: String::new(),
            raw: None,
        }
    }

    /// Shorthand for a GET request
    pub fn get(url: &str) -> Self {
        Self::new(Method::Get, url)
    }

    /// Synthesize the request for loading `location` directly
    ///
    /// Used for the initial page load and for history entries the router
    /// never created. Carries no params and no raw event.
    pub fn for_page_load(location: &Location) -> Self {
        Self::get(&location.url).with_title(location.title.clone())
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add params; values given here override existing ones of the same name
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params.merge(params);
        self
    }

    pub fn with_raw(mut self, raw: RawEvent) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// Shorthand for `params().get(key)`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn raw(&self) -> Option<&RawEvent> {
        self.raw.as_ref()
    }

    /// Path plus query string; what the host history entry records
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.to_query_string())
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url())
    }
}
