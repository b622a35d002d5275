//! Lifecycle notifications
//!
//! Each [`App`](crate::App) owns one [`Notifier`]. There is no process-wide
//! registry.

use crate::request::Request;
use crate::route::Route;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Notification kinds an application can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Stop,
    LookupRoute,
    RunRoute,
    RouteNotFound,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Stop => "stop",
            EventKind::LookupRoute => "lookupRoute",
            EventKind::RunRoute => "runRoute",
            EventKind::RouteNotFound => "routeNotFound",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification with its payload
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    Start,
    Stop,
    /// About to look the request up
    LookupRoute(&'a Request),
    /// A route matched; its callback runs next
    RunRoute { request: &'a Request, route: &'a Route },
    RouteNotFound(&'a Request),
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Start => EventKind::Start,
            Event::Stop => EventKind::Stop,
            Event::LookupRoute(_) => EventKind::LookupRoute,
            Event::RunRoute { .. } => EventKind::RunRoute,
            Event::RouteNotFound(_) => EventKind::RouteNotFound,
        }
    }

    /// The request carried by this notification, if any
    pub fn request(&self) -> Option<&Request> {
        match self {
            Event::Start | Event::Stop => None,
            Event::LookupRoute(request) | Event::RouteNotFound(request) => Some(*request),
            Event::RunRoute { request, .. } => Some(*request),
        }
    }
}

/// Handle returned by [`Notifier::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type EventHandler = Rc<dyn Fn(&Event<'_>)>;

struct Subscriber {
    id: SubscriptionId,
    kind: EventKind,
    handler: EventHandler,
}

/// Ordered subscriber list
///
/// Handlers for one kind run in subscription order. Handlers may subscribe,
/// unsubscribe or emit from inside a handler; changes take effect from the
/// next emit.
#[derive(Default)]
pub struct Notifier {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one kind of notification
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event<'_>) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            kind,
            handler: Rc::new(handler),
        });
        id
    }

    /// Remove a subscription; `false` if it was already gone
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        subscribers.len() != before
    }

    /// Invoke every handler subscribed to the event's kind
    pub fn emit(&self, event: &Event<'_>) {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|subscriber| subscriber.kind == kind)
            .map(|subscriber| Rc::clone(&subscriber.handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|subscriber| subscriber.kind == kind)
            .count()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(
        notifier: &Notifier,
        kind: EventKind,
        tag: &'static str,
        log: &Rc<RefCell<Vec<String>>>,
    ) -> SubscriptionId {
        let sink = Rc::clone(log);
        notifier.on(kind, move |event| {
            let path = event
                .request()
                .map(|r| r.path().to_string())
                .unwrap_or_default();
            sink.borrow_mut().push(format!("{}:{}{}", tag, event.kind(), path));
        })
    }

    #[test]
    fn test_emit_reaches_only_matching_kind_in_order() {
        let notifier = Notifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        collect(&notifier, EventKind::Start, "a", &log);
        collect(&notifier, EventKind::Stop, "b", &log);
        collect(&notifier, EventKind::Start, "c", &log);

        notifier.emit(&Event::Start);

        assert_eq!(*log.borrow(), vec!["a:start", "c:start"]);
    }

    #[test]
    fn test_event_carries_request() {
        let notifier = Notifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        collect(&notifier, EventKind::RouteNotFound, "n", &log);

        let request = Request::get("/missing");
        notifier.emit(&Event::RouteNotFound(&request));

        assert_eq!(*log.borrow(), vec!["n:routeNotFound/missing"]);
    }

    #[test]
    fn test_off_removes_subscription() {
        let notifier = Notifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = collect(&notifier, EventKind::Stop, "x", &log);

        assert_eq!(notifier.subscriber_count(EventKind::Stop), 1);
        assert!(notifier.off(id));
        assert!(!notifier.off(id));

        notifier.emit(&Event::Stop);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_subscribe_during_emit_applies_next_time() {
        let notifier = Rc::new(Notifier::new());
        let hits = Rc::new(Cell::new(0));

        let inner = Rc::downgrade(&notifier);
        let counter = Rc::clone(&hits);
        notifier.on(EventKind::Start, move |_| {
            if let Some(notifier) = inner.upgrade() {
                let counter = Rc::clone(&counter);
                notifier.on(EventKind::Start, move |_| counter.set(counter.get() + 1));
            }
        });

        notifier.emit(&Event::Start);
        assert_eq!(hits.get(), 0);
        notifier.emit(&Event::Start);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EventKind::LookupRoute.to_string(), "lookupRoute");
        assert_eq!(EventKind::RunRoute.as_str(), "runRoute");
    }
}
