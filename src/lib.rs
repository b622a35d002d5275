//! # History Router
//!
//! A small client-side router built on the session-history model of a web
//! page:
//!
//! - **History normalization** - `pushState`/`replaceState` and native
//!   back/forward collapse into a single change notification carrying a
//!   [`Request`]
//! - **Link and form interception** - delegated clicks and submits become
//!   in-app navigations
//! - **Route matching** - method plus path patterns with parameters,
//!   constraints and wildcards; first registered match wins
//! - **Lifecycle notifications** - `start`, `stop`, `lookupRoute`,
//!   `runRoute`, `routeNotFound`
//! - **Filters** - before/after hooks that can halt or redirect
//! - **Named Routes** - generate URLs from a route name and parameters
//!
//! The browser is reached through the [`HistoryHost`] trait. [`MemoryHistory`]
//! is an in-memory host for tests and non-browser use.
//!
//! # Quick Start
//!
//! ```
//! use history_router::{App, AppSettings, Element, EventKind, LinkClick, MemoryHistory};
//!
//! let app = App::new(MemoryHistory::new("/"), AppSettings::default()).unwrap();
//!
//! app.get("/", |_| println!("home"))
//!     .get("/users/:id<int>", |request| {
//!         println!("user {}", request.param("id").unwrap_or_default());
//!     });
//!
//! app.on(EventKind::RouteNotFound, |event| {
//!     if let Some(request) = event.request() {
//!         println!("nothing at {}", request.path());
//!     }
//! });
//!
//! app.start().unwrap();
//! app.load();
//!
//! // A click on <a href="/users/42"> delegated from the document
//! let outcome = app.handle_click(&LinkClick::new(Element::anchor("/users/42")));
//! assert!(outcome.is_intercepted());
//! assert_eq!(app.history().host().current_url(), "/users/42");
//! ```
//!
//! # Navigation
//!
//! ```
//! use history_router::{App, AppSettings, MemoryHistory};
//!
//! let app = App::new(MemoryHistory::new("/"), AppSettings::default()).unwrap();
//! app.start().unwrap();
//!
//! // Push a new entry
//! app.navigate("/profile");
//!
//! // Replace the current entry
//! app.redirect("/login");
//!
//! // Step back
//! app.history().back();
//! assert_eq!(app.history().host().current_url(), "/");
//! ```
//!
//! # Filters
//!
//! ```
//! use history_router::{for_prefix, App, AppSettings, FilterResult, MemoryHistory};
//!
//! let app = App::new(MemoryHistory::new("/"), AppSettings::default()).unwrap();
//! app.get("/admin", |_| {})
//!     .get("/login", |_| {})
//!     .before(for_prefix("/admin", |_| FilterResult::redirect("/login")));
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)

#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Request model and route matching
pub mod params;
pub mod pattern;
pub mod request;
pub mod route;

// Error handling and settings
pub mod config;
pub mod error;

// Browser seams
pub mod dom;
pub mod history;
pub mod listener;

// Application
pub mod app;
pub mod filter;
pub mod notifier;

// Re-export main types for convenient access
pub use app::{App, MAX_REDIRECTS};
pub use config::AppSettings;
pub use dom::{Element, FormSubmit, LinkClick, Modifiers, Selector};
pub use error::{Dispatch, RouterError};
pub use filter::{for_prefix, AfterFilter, BeforeFilter, FilterResult};
pub use history::{
    ChangeHandler, HistoryHost, HistoryNormalizer, HistoryState, MemoryEntry, MemoryHistory,
    Navigate, PopStateEvent, StateBlob,
};
pub use listener::{IgnoreReason, Interception, Listener, METHOD_OVERRIDE_FIELD};
pub use notifier::{Event, EventKind, Notifier, SubscriptionId};
pub use params::{QueryParams, RouteParams};
pub use pattern::{Constraint, PathPattern, Segment};
pub use request::{Location, Method, RawEvent, Request};
pub use route::{Route, RouteCallback, RouteMatch, RouteTable};
