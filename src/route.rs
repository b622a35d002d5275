//! Route definitions and the route table

use crate::error::RouterError;
use crate::params::RouteParams;
use crate::pattern::PathPattern;
use crate::request::{Method, Request};
use crate::trace_log;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Callback run with the request when its route is selected
pub type RouteCallback = Rc<dyn Fn(&Request)>;

// ============================================================================
// Route
// ============================================================================

/// A registered (method, pattern, callback) triple
pub struct Route {
    method: Method,
    pattern: PathPattern,
    name: Option<String>,
    meta: HashMap<String, String>,
    callback: RouteCallback,
}

impl Route {
    /// Create a route
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid. Use `try_new` for non-panicking
    /// validation.
    ///
    /// # Example
    ///
    /// ```
    /// use history_router::{Method, Route};
    ///
    /// let route = Route::new(Method::Get, "/welcome/:name", |request| {
    ///     println!("hello {}", request.param("name").unwrap_or("stranger"));
    /// });
    /// assert_eq!(route.pattern().as_str(), "/welcome/:name");
    /// ```
    pub fn new<F>(method: impl Into<Method>, pattern: &str, callback: F) -> Self
    where
        F: Fn(&Request) + 'static,
    {
        match Self::try_new(method, pattern, callback) {
            Ok(route) => route,
            Err(e) => panic!("{}", e),
        }
    }

    /// Create a route, returning an error for an invalid pattern
    pub fn try_new<F>(
        method: impl Into<Method>,
        pattern: &str,
        callback: F,
    ) -> Result<Self, RouterError>
    where
        F: Fn(&Request) + 'static,
    {
        Ok(Self {
            method: method.into(),
            pattern: PathPattern::parse(pattern)?,
            name: None,
            meta: HashMap::new(),
            callback: Rc::new(callback),
        })
    }

    /// Shorthand for a GET route
    pub fn get<F>(pattern: &str, callback: F) -> Self
    where
        F: Fn(&Request) + 'static,
    {
        Self::new(Method::Get, pattern, callback)
    }

    /// Shorthand for a POST route
    pub fn post<F>(pattern: &str, callback: F) -> Self
    where
        F: Fn(&Request) + 'static,
    {
        Self::new(Method::Post, pattern, callback)
    }

    /// Set route name, used by `url_for`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add metadata to the route
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Match a method and path against this route
    pub fn matches(&self, method: &Method, path: &str) -> Option<RouteParams> {
        if &self.method != method {
            return None;
        }
        self.pattern.matches(path)
    }

    /// Run the callback
    pub fn run(&self, request: &Request) {
        (self.callback)(request);
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RouteTable
// ============================================================================

/// A successful lookup
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Rc<Route>,
    pub params: RouteParams,
}

/// Ordered route list with first-match lookup
///
/// Routes are never deduplicated; when several match, the one registered
/// first wins.
///
/// # Example
///
/// ```
/// use history_router::{Method, Route, RouteTable};
///
/// let mut table = RouteTable::new();
/// table.add(Route::get("/welcome/:name", |_| {}));
///
/// let found = table.lookup(&Method::Get, "/welcome/bob").unwrap();
/// assert_eq!(found.params.get("name"), Some("bob"));
/// assert!(table.lookup(&Method::Post, "/welcome/bob").is_none());
/// ```
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Rc<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route
    pub fn add(&mut self, route: Route) {
        trace_log!(
            "Registering route {} {}",
            route.method(),
            route.pattern().as_str()
        );
        self.routes.push(Rc::new(route));
    }

    /// Linear first-match scan in registration order
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            route.matches(method, path).map(|params| RouteMatch {
                route: Rc::clone(route),
                params,
            })
        })
    }

    /// Find the first route with the given name
    pub fn named(&self, name: &str) -> Option<&Rc<Route>> {
        self.routes
            .iter()
            .find(|route| route.route_name() == Some(name))
    }

    /// Generate a URL for a named route
    ///
    /// # Example
    ///
    /// ```
    /// use history_router::{Route, RouteParams, RouteTable};
    ///
    /// let mut table = RouteTable::new();
    /// table.add(Route::get("/users/:id", |_| {}).name("user.detail"));
    ///
    /// let params: RouteParams = [("id", "123")].into_iter().collect();
    /// assert_eq!(table.url_for("user.detail", &params).unwrap(), "/users/123");
    /// ```
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
        let route = self.named(name).ok_or_else(|| RouterError::UnknownRoute {
            name: name.to_string(),
        })?;
        route
            .pattern()
            .url_for(params)
            .ok_or_else(|| RouterError::MissingParams {
                name: name.to_string(),
            })
    }

    pub fn routes(&self) -> &[Rc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_lookup_extracts_params() {
        let mut table = RouteTable::new();
        table.add(Route::get("/welcome/:name", |_| {}));

        let found = table.lookup(&Method::Get, "/welcome/bob").unwrap();
        assert_eq!(found.params.get("name"), Some("bob"));
        assert_eq!(found.params.len(), 1);
    }

    #[test]
    fn test_lookup_unregistered_method_is_not_found() {
        let mut table = RouteTable::new();
        table.add(Route::get("/", |_| {}));
        table.add(Route::get("/*", |_| {}));
        table.add(Route::post("/signup", |_| {}));

        for path in ["/", "/signup", "/anything/at/all"] {
            assert!(table.lookup(&Method::Delete, path).is_none());
        }
        assert!(table.lookup(&Method::Custom("PURGE".into()), "/").is_none());
    }

    #[test]
    fn test_first_registered_route_wins() {
        let mut table = RouteTable::new();
        table.add(Route::get("/users/:id", |_| {}).name("first"));
        table.add(Route::get("/users/me", |_| {}).name("second"));

        let found = table.lookup(&Method::Get, "/users/me").unwrap();
        assert_eq!(found.route.route_name(), Some("first"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_run_invokes_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let route = Route::get("/a", move |request| {
            sink.borrow_mut().push(request.path().to_string());
        });

        route.run(&Request::get("/a"));
        assert_eq!(*seen.borrow(), vec!["/a".to_string()]);
    }

    #[test]
    fn test_try_new_rejects_bad_pattern() {
        let result = Route::try_new(Method::Get, "no-slash", |_| {});
        assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
    }

    #[test]
    #[should_panic(expected = "Invalid route pattern")]
    fn test_new_panics_on_bad_pattern() {
        let _ = Route::get("/a//b", |_| {});
    }

    #[test]
    fn test_url_for_errors() {
        let mut table = RouteTable::new();
        table.add(Route::get("/users/:id", |_| {}).name("user"));

        assert_eq!(
            table.url_for("nope", &RouteParams::new()),
            Err(RouterError::UnknownRoute {
                name: "nope".to_string()
            })
        );
        assert_eq!(
            table.url_for("user", &RouteParams::new()),
            Err(RouterError::MissingParams {
                name: "user".to_string()
            })
        );
    }

    #[test]
    fn test_route_meta() {
        let route = Route::get("/admin", |_| {}).meta("title", "Admin");
        assert_eq!(route.get_meta("title"), Some("Admin"));
        assert_eq!(route.get_meta("missing"), None);
    }
}
