//! Error handling for the router
//!
//! Configuration-time failures are [`RouterError`]s. A missing route is not an
//! error: it is reported through [`Dispatch::NotFound`] and the
//! `routeNotFound` notification so the application can fall back to a full
//! page load.

use crate::request::Method;
use std::fmt;

// ============================================================================
// Dispatch Outcome
// ============================================================================

/// Result of dispatching a single request through the route table
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A route matched and its callback ran
    Matched { method: Method, pattern: String },
    /// No route matched the request
    NotFound { method: Method, path: String },
    /// A before filter stopped the request
    Halted { reason: String },
    /// A before filter redirected to another path
    Redirected { to: String },
}

impl Dispatch {
    /// Check if a route callback ran
    pub fn is_matched(&self) -> bool {
        matches!(self, Dispatch::Matched { .. })
    }

    /// Check if no route matched
    pub fn is_not_found(&self) -> bool {
        matches!(self, Dispatch::NotFound { .. })
    }

    /// Check if a filter halted the request
    pub fn is_halted(&self) -> bool {
        matches!(self, Dispatch::Halted { .. })
    }

    /// Get the redirect target, if a filter redirected
    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Dispatch::Redirected { to } => Some(to),
            _ => None,
        }
    }
}

// ============================================================================
// RouterError
// ============================================================================

/// Errors raised while configuring or driving the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A route pattern failed validation
    InvalidPattern { pattern: String, reason: String },

    /// A link or form selector could not be parsed
    InvalidSelector { selector: String, reason: String },

    /// Settings could not be decoded
    InvalidSettings { message: String },

    /// `start` was called on a running app
    AlreadyRunning,

    /// `stop` was called on a stopped app
    NotRunning,

    /// No route carries the requested name
    UnknownRoute { name: String },

    /// A named route needs parameters that were not supplied
    MissingParams { name: String },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid route pattern '{}': {}", pattern, reason)
            }
            RouterError::InvalidSelector { selector, reason } => {
                write!(f, "Invalid selector '{}': {}", selector, reason)
            }
            RouterError::InvalidSettings { message } => {
                write!(f, "Invalid settings: {}", message)
            }
            RouterError::AlreadyRunning => write!(f, "Router is already running"),
            RouterError::NotRunning => write!(f, "Router is not running"),
            RouterError::UnknownRoute { name } => write!(f, "No route named '{}'", name),
            RouterError::MissingParams { name } => {
                write!(f, "Route '{}' is missing required parameters", name)
            }
        }
    }
}

impl std::error::Error for RouterError {}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        RouterError::InvalidSettings {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_matched() {
        let outcome = Dispatch::Matched {
            method: Method::Get,
            pattern: "/".to_string(),
        };
        assert!(outcome.is_matched());
        assert!(!outcome.is_not_found());
        assert!(!outcome.is_halted());
        assert_eq!(outcome.redirect_path(), None);
    }

    #[test]
    fn test_dispatch_not_found() {
        let outcome = Dispatch::NotFound {
            method: Method::Post,
            path: "/missing".to_string(),
        };
        assert!(outcome.is_not_found());
        assert!(!outcome.is_matched());
    }

    #[test]
    fn test_dispatch_redirect_path() {
        let outcome = Dispatch::Redirected {
            to: "/login".to_string(),
        };
        assert_eq!(outcome.redirect_path(), Some("/login"));
    }

    #[test]
    fn test_router_error_display() {
        let error = RouterError::InvalidPattern {
            pattern: "/a//b".to_string(),
            reason: "consecutive slashes".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid route pattern '/a//b': consecutive slashes"
        );
        assert_eq!(RouterError::NotRunning.to_string(), "Router is not running");
    }

    #[test]
    fn test_settings_error_from_json() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let error = RouterError::from(err);
        assert!(matches!(error, RouterError::InvalidSettings { .. }));
    }
}
