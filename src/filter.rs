//! Before and after filters
//!
//! Filters run around every matched route. Before filters run in
//! registration order and may stop the request or redirect it; after filters
//! run once the route callback has returned.

use crate::request::Request;
use std::rc::Rc;

/// Result of a before filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    /// Continue with the next filter, then the route
    Continue,

    /// Stop here; the route callback does not run
    Halt { reason: String },

    /// Replace the current history entry with a GET for `to`
    Redirect { to: String },
}

impl FilterResult {
    /// Create a continue result
    pub fn cont() -> Self {
        Self::Continue
    }

    /// Create a halt result
    pub fn halt(reason: impl Into<String>) -> Self {
        Self::Halt {
            reason: reason.into(),
        }
    }

    /// Create a redirect result
    pub fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect { to: to.into() }
    }

    pub fn allows_continue(&self) -> bool {
        matches!(self, FilterResult::Continue)
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, FilterResult::Halt { .. })
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, FilterResult::Redirect { .. })
    }
}

/// Filter run before the route callback
pub type BeforeFilter = Rc<dyn Fn(&Request) -> FilterResult>;

/// Filter run after the route callback
pub type AfterFilter = Rc<dyn Fn(&Request)>;

/// Build a before filter that only applies to paths under `prefix`
///
/// # Example
///
/// ```
/// use history_router::{for_prefix, FilterResult, Request};
///
/// let filter = for_prefix("/admin", |_| FilterResult::redirect("/login"));
///
/// assert!(filter(&Request::get("/admin/users")).is_redirect());
/// assert!(filter(&Request::get("/administrator")).allows_continue());
/// assert!(filter(&Request::get("/")).allows_continue());
/// ```
pub fn for_prefix<F>(prefix: &str, filter: F) -> impl Fn(&Request) -> FilterResult
where
    F: Fn(&Request) -> FilterResult,
{
    let prefix = prefix.trim_end_matches('/').to_string();
    move |request| {
        let path = request.path();
        let under = path
            .strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if under {
            filter(request)
        } else {
            FilterResult::Continue
        }
    }
}
