//! Session history
//!
//! Two very different things can change the current location:
//! - the application pushes or replaces an entry (`pushState`/`replaceState`)
//! - the user presses back or forward and the host fires `popstate`
//!
//! [`HistoryNormalizer`] merges both into one ordered `on_change` stream of
//! [`Request`]s. The request travels through the host's history entry as a
//! tagged JSON state ([`HistoryState`]) and is decoded again on `popstate`;
//! when an entry carries no state (first page load, or an entry the router
//! never created) a page-load request for the current location is
//! synthesized instead.
//!
//! [`MemoryHistory`] is an in-process session history implementing
//! [`HistoryHost`], for tests and non-browser embedders.

use crate::request::{Location, Request};
use crate::{trace_log, warn_log};
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Opaque state blob stored with a history entry
pub type StateBlob = serde_json::Value;

/// Handler invoked for every location change
pub type ChangeHandler = Rc<dyn Fn(&Request)>;

// ============================================================================
// State encoding
// ============================================================================

/// Typed form of the state blob the router attaches to history entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum HistoryState {
    Request(Request),
}

impl HistoryState {
    /// Encode a request into a state blob
    ///
    /// Returns `Null` if the request cannot be encoded; such an entry pops
    /// back as a page load.
    pub fn encode(request: &Request) -> StateBlob {
        match serde_json::to_value(HistoryState::Request(request.clone())) {
            Ok(blob) => blob,
            Err(err) => {
                warn_log!("Failed to encode history state for {}: {}", request, err);
                StateBlob::Null
            }
        }
    }

    /// Decode a state blob back into the request it was created from
    ///
    /// `None`, `Null` and foreign blobs (written by someone else's
    /// `pushState`) all decode to `None`.
    pub fn decode(blob: Option<&StateBlob>) -> Option<Request> {
        let blob = blob.filter(|blob| !blob.is_null())?;
        match HistoryState::deserialize(blob) {
            Ok(HistoryState::Request(request)) => Some(request),
            Err(err) => {
                warn_log!("Ignoring undecodable history state: {}", err);
                None
            }
        }
    }
}

// ============================================================================
// Host
// ============================================================================

/// The host's session-history primitives
///
/// In a browser this is `history.pushState`, `history.replaceState` and
/// `location`; the glue also forwards each `popstate` event to
/// [`HistoryNormalizer::pop_state`].
pub trait HistoryHost {
    /// Append a new entry
    fn push_entry(&mut self, state: StateBlob, title: &str, url: &str);

    /// Overwrite the current entry
    fn replace_entry(&mut self, state: StateBlob, title: &str, url: &str);

    /// The current location
    fn location(&self) -> Location;
}

/// A native back/forward event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopStateEvent {
    pub state: Option<StateBlob>,
}

impl PopStateEvent {
    pub fn new(state: Option<StateBlob>) -> Self {
        Self { state }
    }
}

/// Capability to move the session history
///
/// The listener reaches history only through this trait.
pub trait Navigate {
    fn push_state(&self, request: &Request);
    fn replace_state(&self, request: &Request);
    fn location(&self) -> Location;
}

// ============================================================================
// HistoryNormalizer
// ============================================================================

/// Merges push/replace and popstate into one `on_change` stream
///
/// Every push, replace and popstate invokes every handler exactly once, in
/// registration order. Nothing is buffered or deduplicated. Handler lists
/// only grow.
///
/// # Example
///
/// ```
/// use history_router::{HistoryNormalizer, MemoryHistory, Request};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let history = HistoryNormalizer::new(MemoryHistory::new("/"));
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = Rc::clone(&seen);
/// history.on_change(move |request| sink.borrow_mut().push(request.url()));
///
/// history.push_state(&Request::get("/about"));
/// history.back();
///
/// assert_eq!(*seen.borrow(), vec!["/about", "/"]);
/// ```
pub struct HistoryNormalizer<H> {
    host: RefCell<H>,
    push_handlers: RefCell<Vec<ChangeHandler>>,
    pop_handlers: RefCell<Vec<ChangeHandler>>,
}

impl<H: HistoryHost> HistoryNormalizer<H> {
    pub fn new(host: H) -> Self {
        Self {
            host: RefCell::new(host),
            push_handlers: RefCell::new(Vec::new()),
            pop_handlers: RefCell::new(Vec::new()),
        }
    }

    /// Register `handler` for both sources
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(&Request) + 'static,
    {
        let handler: ChangeHandler = Rc::new(handler);
        self.push_handlers.borrow_mut().push(Rc::clone(&handler));
        self.pop_handlers.borrow_mut().push(handler);
    }

    /// Append a history entry for `request`, then relay it
    pub fn push_state(&self, request: &Request) {
        trace_log!("pushState {}", request);
        let state = HistoryState::encode(request);
        self.host
            .borrow_mut()
            .push_entry(state, request.title(), &request.url());
        relay(&self.push_handlers, request);
    }

    /// Overwrite the current history entry with `request`, then relay it
    pub fn replace_state(&self, request: &Request) {
        trace_log!("replaceState {}", request);
        let state = HistoryState::encode(request);
        self.host
            .borrow_mut()
            .replace_entry(state, request.title(), &request.url());
        relay(&self.push_handlers, request);
    }

    /// Handle a native back/forward event
    ///
    /// Returns the request that was relayed.
    pub fn pop_state(&self, event: PopStateEvent) -> Request {
        let request = match HistoryState::decode(event.state.as_ref()) {
            Some(request) => request,
            None => Request::for_page_load(&self.host.borrow().location()),
        };
        trace_log!("popstate {}", request);
        relay(&self.pop_handlers, &request);
        request
    }

    pub fn location(&self) -> Location {
        self.host.borrow().location()
    }

    /// Borrow the host
    ///
    /// Panics if called from inside `push_entry`/`replace_entry`.
    pub fn host(&self) -> Ref<'_, H> {
        self.host.borrow()
    }

    pub fn host_mut(&self) -> RefMut<'_, H> {
        self.host.borrow_mut()
    }

    /// Number of `on_change` registrations
    pub fn handler_count(&self) -> usize {
        self.push_handlers.borrow().len()
    }
}

impl HistoryNormalizer<MemoryHistory> {
    /// Step back one entry and relay the resulting popstate
    ///
    /// Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Step forward one entry and relay the resulting popstate
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move `delta` entries and relay the resulting popstate
    pub fn go(&self, delta: isize) -> bool {
        let event = self.host.borrow_mut().go(delta);
        match event {
            Some(event) => {
                self.pop_state(event);
                true
            }
            None => false,
        }
    }
}

impl<H: HistoryHost> Navigate for HistoryNormalizer<H> {
    fn push_state(&self, request: &Request) {
        HistoryNormalizer::push_state(self, request);
    }

    fn replace_state(&self, request: &Request) {
        HistoryNormalizer::replace_state(self, request);
    }

    fn location(&self) -> Location {
        HistoryNormalizer::location(self)
    }
}

/// Invoke a snapshot of `handlers`, holding no borrow while they run
///
/// Handlers may push, replace or register further handlers; a handler
/// registered during a relay first sees the next change.
fn relay(handlers: &RefCell<Vec<ChangeHandler>>, request: &Request) {
    let snapshot: Vec<ChangeHandler> = handlers.borrow().clone();
    for handler in snapshot {
        handler(request);
    }
}

// ============================================================================
// MemoryHistory
// ============================================================================

/// One entry of a [`MemoryHistory`]
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    pub url: String,
    pub title: String,
    pub state: Option<StateBlob>,
}

impl MemoryEntry {
    fn new(url: String, title: String, state: Option<StateBlob>) -> Self {
        Self { url, title, state }
    }
}

/// In-process session history stack
///
/// Behaves like a browser tab: pushing truncates forward entries, moving
/// through the stack yields a [`PopStateEvent`] carrying the destination
/// entry's state.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<MemoryEntry>,
    current: usize,
    /// Maximum number of entries (0 = unlimited)
    max_size: usize,
}

impl MemoryHistory {
    /// Default limit on retained entries
    pub const DEFAULT_MAX_SIZE: usize = 1000;

    /// Start with a single stateless entry for `initial_url`
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self::with_max_size(initial_url, Self::DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(initial_url: impl Into<String>, max_size: usize) -> Self {
        Self {
            entries: vec![MemoryEntry::new(initial_url.into(), String::new(), None)],
            current: 0,
            max_size,
        }
    }

    pub fn current_entry(&self) -> &MemoryEntry {
        &self.entries[self.current]
    }

    pub fn current_url(&self) -> &str {
        &self.current_entry().url
    }

    /// Move `delta` entries; `None` if that leaves the stack
    pub fn go(&mut self, delta: isize) -> Option<PopStateEvent> {
        if delta == 0 {
            return None;
        }
        let target = self.current.checked_add_signed(delta)?;
        if target >= self.entries.len() {
            return None;
        }
        self.current = target;
        Some(PopStateEvent::new(self.current_entry().state.clone()))
    }

    pub fn back(&mut self) -> Option<PopStateEvent> {
        self.go(-1)
    }

    pub fn forward(&mut self) -> Option<PopStateEvent> {
        self.go(1)
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true; a history always holds its current entry
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Drop the oldest entries beyond `max_size`, keeping the current one
    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistoryHost for MemoryHistory {
    fn push_entry(&mut self, state: StateBlob, title: &str, url: &str) {
        self.entries.truncate(self.current + 1);
        self.entries
            .push(MemoryEntry::new(url.to_string(), title.to_string(), Some(state)));
        self.current = self.entries.len() - 1;
        self.enforce_size_limit();
    }

    fn replace_entry(&mut self, state: StateBlob, title: &str, url: &str) {
        self.entries[self.current] =
            MemoryEntry::new(url.to_string(), title.to_string(), Some(state));
    }

    fn location(&self) -> Location {
        let entry = self.current_entry();
        Location::new(entry.url.clone(), entry.title.clone())
    }
}
