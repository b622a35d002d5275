//! Application controller
//!
//! [`App`] composes the collaborators: a [`Notifier`] for lifecycle
//! notifications, a [`Listener`] for link/form interception, a
//! [`RouteTable`] for lookup, and the shared [`HistoryNormalizer`]. Every
//! change the normalizer reports is dispatched through the route table.
//!
//! Lifecycle: stopped -> running -> stopped, restartable.

use crate::config::AppSettings;
use crate::dom::{FormSubmit, LinkClick};
use crate::error::{Dispatch, RouterError};
use crate::filter::{AfterFilter, BeforeFilter, FilterResult};
use crate::history::{HistoryHost, HistoryNormalizer, Navigate, PopStateEvent};
use crate::listener::{Interception, Listener};
use crate::notifier::{Event, EventKind, Notifier, SubscriptionId};
use crate::params::RouteParams;
use crate::request::{Method, Request};
use crate::route::{Route, RouteMatch, RouteTable};
use crate::{debug_log, info_log, trace_log, warn_log};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Redirect chains longer than this are cut off
pub const MAX_REDIRECTS: u8 = 10;

struct AppInner<H> {
    settings: AppSettings,
    running: Cell<bool>,
    subscribed: Cell<bool>,
    redirect_depth: Cell<u8>,
    routes: RefCell<RouteTable>,
    before: RefCell<Vec<BeforeFilter>>,
    after: RefCell<Vec<AfterFilter>>,
    notifier: Notifier,
    listener: Listener,
    history: Rc<HistoryNormalizer<H>>,
}

/// A routed application
///
/// Cloning an `App` yields another handle to the same application.
///
/// # Example
///
/// ```
/// use history_router::{App, AppSettings, MemoryHistory};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let greeted = Rc::new(RefCell::new(Vec::new()));
/// let app = App::new(MemoryHistory::new("/"), AppSettings::default()).unwrap();
///
/// let sink = Rc::clone(&greeted);
/// app.get("/welcome/:name", move |request| {
///     sink.borrow_mut().push(request.param("name").unwrap_or_default().to_string());
/// });
///
/// app.start().unwrap();
/// app.navigate("/welcome/bob");
///
/// assert_eq!(*greeted.borrow(), vec!["bob"]);
/// ```
pub struct App<H: HistoryHost + 'static> {
    inner: Rc<AppInner<H>>,
}

impl<H: HistoryHost + 'static> App<H> {
    /// Create an app over `host`
    pub fn new(host: H, settings: AppSettings) -> Result<Self, RouterError> {
        Self::with_history(Rc::new(HistoryNormalizer::new(host)), settings)
    }

    /// Create an app over an existing normalizer, which may be shared
    pub fn with_history(
        history: Rc<HistoryNormalizer<H>>,
        settings: AppSettings,
    ) -> Result<Self, RouterError> {
        let navigator: Rc<dyn Navigate> = history.clone();
        let listener = Listener::new(&settings, navigator)?;

        Ok(Self {
            inner: Rc::new(AppInner {
                settings,
                running: Cell::new(false),
                subscribed: Cell::new(false),
                redirect_depth: Cell::new(0),
                routes: RefCell::new(RouteTable::new()),
                before: RefCell::new(Vec::new()),
                after: RefCell::new(Vec::new()),
                notifier: Notifier::new(),
                listener,
                history,
            }),
        })
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Register a route
    pub fn route(&self, route: Route) -> &Self {
        self.inner.routes.borrow_mut().add(route);
        self
    }

    /// Register a GET route
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid.
    pub fn get<F>(&self, pattern: &str, callback: F) -> &Self
    where
        F: Fn(&Request) + 'static,
    {
        self.route(Route::get(pattern, callback))
    }

    /// Register a POST route
    pub fn post<F>(&self, pattern: &str, callback: F) -> &Self
    where
        F: Fn(&Request) + 'static,
    {
        self.route(Route::post(pattern, callback))
    }

    /// Register a route for any method
    pub fn on_method<F>(&self, method: impl Into<Method>, pattern: &str, callback: F) -> &Self
    where
        F: Fn(&Request) + 'static,
    {
        self.route(Route::new(method, pattern, callback))
    }

    /// Add a filter that runs before every matched route
    pub fn before<F>(&self, filter: F) -> &Self
    where
        F: Fn(&Request) -> FilterResult + 'static,
    {
        self.inner.before.borrow_mut().push(Rc::new(filter));
        self
    }

    /// Add a filter that runs after every matched route
    pub fn after<F>(&self, filter: F) -> &Self
    where
        F: Fn(&Request) + 'static,
    {
        self.inner.after.borrow_mut().push(Rc::new(filter));
        self
    }

    /// Subscribe to a notification
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event<'_>) + 'static,
    {
        self.inner.notifier.on(kind, handler)
    }

    /// Remove a notification subscription
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.off(id)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Start routing
    ///
    /// The first start registers the default logging subscriptions and the
    /// `on_change` subscription; later restarts reuse them.
    pub fn start(&self) -> Result<(), RouterError> {
        let inner = &self.inner;
        if inner.running.get() {
            return Err(RouterError::AlreadyRunning);
        }

        let first_start = !inner.subscribed.get();
        if first_start && inner.settings.log_events {
            register_default_subscriptions(&inner.notifier);
        }

        inner.listener.listen();
        inner.notifier.emit(&Event::Start);

        if first_start {
            let weak: Weak<AppInner<H>> = Rc::downgrade(inner);
            inner.history.on_change(move |request| {
                if let Some(inner) = weak.upgrade() {
                    inner.dispatch(request);
                }
            });
            inner.subscribed.set(true);
        }

        inner.running.set(true);
        Ok(())
    }

    /// Stop intercepting links and forms
    ///
    /// Native back/forward navigation keeps being dispatched: the
    /// `on_change` subscription is never removed.
    pub fn stop(&self) -> Result<(), RouterError> {
        let inner = &self.inner;
        if !inner.running.get() {
            return Err(RouterError::NotRunning);
        }

        inner.listener.unlisten();
        inner.notifier.emit(&Event::Stop);
        inner.running.set(false);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Push a GET for `url` onto the session history
    pub fn navigate(&self, url: &str) {
        self.inner.history.push_state(&Request::get(url));
    }

    /// Replace the current history entry with a GET for `url`
    pub fn redirect(&self, url: &str) {
        self.inner.history.replace_state(&Request::get(url));
    }

    /// Dispatch the page-load request for the host's current location
    ///
    /// Call once after `start` to route the page the user landed on.
    pub fn load(&self) -> Dispatch {
        let request = Request::for_page_load(&self.inner.history.location());
        self.inner.dispatch(&request)
    }

    /// Look up and run a request without touching history
    pub fn dispatch(&self, request: &Request) -> Dispatch {
        self.inner.dispatch(request)
    }

    /// Look up a route without running it
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.inner.routes.borrow().lookup(method, path)
    }

    /// Forward a delegated click; prevent the default if intercepted
    pub fn handle_click(&self, click: &LinkClick) -> Interception {
        self.inner.listener.handle_click(click)
    }

    /// Forward a delegated submit; prevent the default if intercepted
    pub fn handle_submit(&self, submit: &FormSubmit) -> Interception {
        self.inner.listener.handle_submit(submit)
    }

    /// Forward a native `popstate`
    pub fn handle_pop_state(&self, event: PopStateEvent) -> Request {
        self.inner.history.pop_state(event)
    }

    /// Generate a URL for a named route
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
        self.inner.routes.borrow().url_for(name, params)
    }

    pub fn settings(&self) -> &AppSettings {
        &self.inner.settings
    }

    pub fn history(&self) -> &Rc<HistoryNormalizer<H>> {
        &self.inner.history
    }

    pub fn route_count(&self) -> usize {
        self.inner.routes.borrow().len()
    }
}

impl<H: HistoryHost + 'static> AppInner<H> {
    fn dispatch(&self, request: &Request) -> Dispatch {
        self.notifier.emit(&Event::LookupRoute(request));

        // The table borrow ends here; callbacks may register routes.
        let found = self
            .routes
            .borrow()
            .lookup(request.method(), request.path());

        let Some(RouteMatch { route, params }) = found else {
            self.notifier.emit(&Event::RouteNotFound(request));
            return Dispatch::NotFound {
                method: request.method().clone(),
                path: request.path().to_string(),
            };
        };

        let request = request.clone().with_params(params);

        let before: Vec<BeforeFilter> = self.before.borrow().clone();
        for filter in before {
            match filter(&request) {
                FilterResult::Continue => {}
                FilterResult::Halt { reason } => {
                    debug_log!("Halted {}: {}", request, reason);
                    return Dispatch::Halted { reason };
                }
                FilterResult::Redirect { to } => return self.follow_redirect(&request, to),
            }
        }

        self.notifier.emit(&Event::RunRoute {
            request: &request,
            route: &route,
        });
        route.run(&request);

        let after: Vec<AfterFilter> = self.after.borrow().clone();
        for filter in after {
            filter(&request);
        }

        Dispatch::Matched {
            method: route.method().clone(),
            pattern: route.pattern().as_str().to_string(),
        }
    }

    fn follow_redirect(&self, from: &Request, to: String) -> Dispatch {
        let depth = self.redirect_depth.get();
        if depth >= MAX_REDIRECTS {
            warn_log!("Redirect loop at {} -> {}; giving up", from, to);
            return Dispatch::Halted {
                reason: format!("too many redirects at {}", to),
            };
        }

        trace_log!("Redirecting {} -> {}", from, to);
        let target = Request::get(&to);
        self.redirect_depth.set(depth + 1);
        self.history.replace_state(&target);
        // Before the first start nothing listens on the history.
        if !self.subscribed.get() {
            self.dispatch(&target);
        }
        self.redirect_depth.set(depth);

        Dispatch::Redirected { to }
    }
}

fn register_default_subscriptions(notifier: &Notifier) {
    notifier.on(EventKind::Start, |_| {
        info_log!("Router started");
    });
    notifier.on(EventKind::RunRoute, |event| {
        if let Event::RunRoute { request, route } = event {
            debug_log!("runRoute: {} -> {}", request, route.pattern());
        }
    });
    notifier.on(EventKind::RouteNotFound, |event| {
        if let Event::RouteNotFound(request) = event {
            warn_log!("routeNotFound: {}", request);
        }
    });
}

impl<H: HistoryHost + 'static> Clone for App<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: HistoryHost + 'static> fmt::Debug for App<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("settings", &self.inner.settings)
            .field("running", &self.inner.running.get())
            .field("routes", &self.inner.routes.borrow().len())
            .field("notifier", &self.inner.notifier)
            .field("listener", &self.inner.listener)
            .finish_non_exhaustive()
    }
}
