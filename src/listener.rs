//! Link and form interception
//!
//! The [`Listener`] decides whether a delegated click or submit belongs to
//! the application. If it does, the event becomes a [`Request`], is pushed
//! onto the session history, and the host glue is told to prevent the
//! browser's default navigation. Everything else is left to the browser.

use crate::config::AppSettings;
use crate::dom::{Element, FormSubmit, LinkClick, Selector};
use crate::error::RouterError;
use crate::history::Navigate;
use crate::params::{QueryParams, RouteParams};
use crate::request::{split_url, Method, RawEvent, Request};
use crate::trace_log;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Form field that overrides the method of a POST form
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

/// Why an event was left to the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Interception is switched off
    NotListening,
    /// The element does not match the configured selector
    SelectorMismatch,
    /// Another handler already prevented the default action
    DefaultPrevented,
    /// Non-primary button or a modifier key (open in new tab etc.)
    ModifiedClick,
    /// `target` names another browsing context
    OtherTarget,
    /// The link has a `download` attribute
    Download,
    /// `rel="external"`, another origin, or a non-http scheme
    External,
    /// The link has no `href`
    MissingHref,
    /// The href only changes the fragment
    HashOnly,
    /// A `method="dialog"` form closes a dialog; it does not navigate
    DialogForm,
}

/// Verdict for a single DOM event
#[derive(Debug, Clone, PartialEq)]
pub enum Interception {
    /// The router took over; the glue must call `preventDefault`
    Intercepted(Request),
    /// The browser should handle the event
    Ignored(IgnoreReason),
}

impl Interception {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Interception::Intercepted(_))
    }

    pub fn request(&self) -> Option<&Request> {
        match self {
            Interception::Intercepted(request) => Some(request),
            Interception::Ignored(_) => None,
        }
    }

    pub fn ignore_reason(&self) -> Option<IgnoreReason> {
        match self {
            Interception::Ignored(reason) => Some(*reason),
            Interception::Intercepted(_) => None,
        }
    }
}

/// Delegated click/submit interception
pub struct Listener {
    link_selector: Selector,
    form_selector: Selector,
    origin: Option<String>,
    listening: Cell<bool>,
    navigator: Rc<dyn Navigate>,
}

impl Listener {
    /// Build a listener that pushes through `navigator`
    ///
    /// Starts switched off.
    pub fn new(settings: &AppSettings, navigator: Rc<dyn Navigate>) -> Result<Self, RouterError> {
        settings.validate()?;
        Ok(Self {
            link_selector: Selector::parse(&settings.link_selector)?,
            form_selector: Selector::parse(&settings.form_selector)?,
            origin: settings.origin.clone(),
            listening: Cell::new(false),
            navigator,
        })
    }

    pub fn listen(&self) {
        self.listening.set(true);
    }

    pub fn unlisten(&self) {
        self.listening.set(false);
    }

    pub fn is_listening(&self) -> bool {
        self.listening.get()
    }

    /// Handle a delegated click
    pub fn handle_click(&self, click: &LinkClick) -> Interception {
        let verdict = self.check_click(click).and_then(|()| {
            let href = click
                .element
                .get_attr("href")
                .ok_or(IgnoreReason::MissingHref)?;
            self.resolve(href)
        });

        let url = match verdict {
            Ok(url) => url,
            Err(reason) => {
                trace_log!("Ignoring click: {:?}", reason);
                return Interception::Ignored(reason);
            }
        };

        let title = click
            .element
            .get_attr("title")
            .map(str::to_string)
            .unwrap_or_else(|| self.navigator.location().title);
        let request = Request::get(&url)
            .with_title(title)
            .with_raw(RawEvent::Click(click.clone()));

        self.navigator.push_state(&request);
        Interception::Intercepted(request)
    }

    /// Handle a delegated form submission
    ///
    /// GET forms put their fields into the query string; other methods carry
    /// them as params. A missing or unrecognized `method` attribute means
    /// GET. A POST form with a `_method` field is submitted with that method
    /// instead.
    pub fn handle_submit(&self, submit: &FormSubmit) -> Interception {
        let verdict = self
            .check_common(&submit.element, &self.form_selector, submit.default_prevented)
            .and_then(|()| form_method(&submit.element))
            .and_then(|method| {
                let action = submit
                    .element
                    .get_attr("action")
                    .filter(|action| !action.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| self.navigator.location().url);
                Ok((method, self.resolve(&action)?))
            });

        let (mut method, action) = match verdict {
            Ok(verdict) => verdict,
            Err(reason) => {
                trace_log!("Ignoring submit: {:?}", reason);
                return Interception::Ignored(reason);
            }
        };

        if method == Method::Post {
            if let Some((_, verb)) = submit
                .fields
                .iter()
                .find(|(name, _)| name == METHOD_OVERRIDE_FIELD)
            {
                method = Method::from(verb.as_str());
            }
        }

        let fields = submit
            .fields
            .iter()
            .filter(|(name, _)| name != METHOD_OVERRIDE_FIELD);

        let request = if method == Method::Get {
            let mut query = QueryParams::new();
            for (name, value) in fields {
                query.insert(name.clone(), value.clone());
            }
            let (path, _) = split_url(&action);
            let url = if query.is_empty() {
                path.to_string()
            } else {
                format!("{}?{}", path, query.to_query_string())
            };
            Request::get(&url)
        } else {
            let params: RouteParams = fields.cloned().collect();
            Request::new(method, &action).with_params(params)
        };

        let request = request
            .with_title(self.navigator.location().title)
            .with_raw(RawEvent::Submit(submit.clone()));

        self.navigator.push_state(&request);
        Interception::Intercepted(request)
    }

    fn check_click(&self, click: &LinkClick) -> Result<(), IgnoreReason> {
        self.check_common(&click.element, &self.link_selector, click.default_prevented)?;
        if click.button != 0 || click.modifiers.any() {
            return Err(IgnoreReason::ModifiedClick);
        }
        if click.element.has_attr("download") {
            return Err(IgnoreReason::Download);
        }
        let external_rel = click
            .element
            .get_attr("rel")
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("external")));
        if external_rel {
            return Err(IgnoreReason::External);
        }
        Ok(())
    }

    fn check_common(
        &self,
        element: &Element,
        selector: &Selector,
        default_prevented: bool,
    ) -> Result<(), IgnoreReason> {
        if !self.is_listening() {
            return Err(IgnoreReason::NotListening);
        }
        if default_prevented {
            return Err(IgnoreReason::DefaultPrevented);
        }
        if !selector.matches(element) {
            return Err(IgnoreReason::SelectorMismatch);
        }
        match element.get_attr("target") {
            Some(target) if !target.is_empty() && !target.eq_ignore_ascii_case("_self") => {
                Err(IgnoreReason::OtherTarget)
            }
            _ => Ok(()),
        }
    }

    /// Turn an href into an in-app path (with query), or say why not
    fn resolve(&self, href: &str) -> Result<String, IgnoreReason> {
        let href = href.trim();
        if href.is_empty() {
            return Err(IgnoreReason::MissingHref);
        }
        if href.starts_with('#') {
            return Err(IgnoreReason::HashOnly);
        }

        if let Some(origin) = &self.origin {
            if let Some(rest) = href.strip_prefix(origin.as_str()) {
                return match rest.chars().next() {
                    None => Ok("/".to_string()),
                    Some('/') => Ok(rest.to_string()),
                    Some('?' | '#') => Ok(format!("/{}", rest)),
                    // https://example.com.evil.org
                    Some(_) => Err(IgnoreReason::External),
                };
            }
        }

        if href.starts_with("//") || has_scheme(href) {
            return Err(IgnoreReason::External);
        }
        if href.starts_with('/') {
            return Ok(href.to_string());
        }

        let current = self.navigator.location();
        Ok(resolve_relative(current.path(), href))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("link_selector", &self.link_selector.as_str())
            .field("form_selector", &self.form_selector.as_str())
            .field("origin", &self.origin)
            .field("listening", &self.listening.get())
            .finish_non_exhaustive()
    }
}

/// Submission method of a form, as browsers read the `method` attribute
fn form_method(form: &Element) -> Result<Method, IgnoreReason> {
    let attr = form.get_attr("method").unwrap_or("").trim();
    if attr.eq_ignore_ascii_case("post") {
        Ok(Method::Post)
    } else if attr.eq_ignore_ascii_case("dialog") {
        Err(IgnoreReason::DialogForm)
    } else {
        Ok(Method::Get)
    }
}

/// `scheme:` prefix per RFC 3986
fn has_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Resolve a relative reference against the directory of `base_path`
fn resolve_relative(base_path: &str, href: &str) -> String {
    if href.starts_with('?') {
        return format!("{}{}", base_path, href);
    }

    let (href_path, suffix) = match href.find(['?', '#']) {
        Some(pos) => href.split_at(pos),
        None => (href, ""),
    };

    let mut segments: Vec<&str> = base_path.split('/').filter(|s| !s.is_empty()).collect();
    if !base_path.ends_with('/') {
        segments.pop();
    }

    for part in href_path.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    let directory = href_path.ends_with('/') || href_path.ends_with("/.") || href_path == ".";
    if directory && !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(suffix);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Location;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeNavigator {
        location: RefCell<Location>,
        pushed: RefCell<Vec<Request>>,
    }

    impl Navigate for FakeNavigator {
        fn push_state(&self, request: &Request) {
            *self.location.borrow_mut() = Location::new(request.url(), request.title());
            self.pushed.borrow_mut().push(request.clone());
        }

        fn replace_state(&self, request: &Request) {
            self.push_state(request);
        }

        fn location(&self) -> Location {
            self.location.borrow().clone()
        }
    }

    fn listener_with(settings: AppSettings, url: &str) -> (Listener, Rc<FakeNavigator>) {
        let navigator = Rc::new(FakeNavigator::default());
        *navigator.location.borrow_mut() = Location::new(url, "Page");
        let listener = Listener::new(&settings, navigator.clone()).unwrap();
        listener.listen();
        (listener, navigator)
    }

    fn listener() -> (Listener, Rc<FakeNavigator>) {
        listener_with(AppSettings::default(), "/docs/intro")
    }

    #[test]
    fn test_click_is_intercepted_and_pushed() {
        let (listener, navigator) = listener();
        let click = LinkClick::new(Element::anchor("/welcome/bob?x=1").attr("title", "Bob"));

        let verdict = listener.handle_click(&click);

        let request = verdict.request().unwrap();
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.path(), "/welcome/bob");
        assert_eq!(request.query().get("x"), Some("1"));
        assert_eq!(request.title(), "Bob");
        assert_eq!(request.raw(), Some(&RawEvent::Click(click.clone())));
        assert_eq!(navigator.pushed.borrow().len(), 1);
    }

    #[test]
    fn test_not_listening_ignores_everything() {
        let (listener, navigator) = listener();
        listener.unlisten();

        let verdict = listener.handle_click(&LinkClick::new(Element::anchor("/a")));
        assert_eq!(verdict.ignore_reason(), Some(IgnoreReason::NotListening));

        let verdict = listener.handle_submit(&FormSubmit::new(Element::form("get", "/s")));
        assert_eq!(verdict.ignore_reason(), Some(IgnoreReason::NotListening));
        assert!(navigator.pushed.borrow().is_empty());
    }

    #[test]
    fn test_click_ignore_reasons() {
        let (listener, navigator) = listener();
        let cases = [
            (
                LinkClick::new(Element::new("span").attr("href", "/a")),
                IgnoreReason::SelectorMismatch,
            ),
            (
                LinkClick::new(Element::anchor("/a")).prevented(),
                IgnoreReason::DefaultPrevented,
            ),
            (
                LinkClick::new(Element::anchor("/a")).with_button(1),
                IgnoreReason::ModifiedClick,
            ),
            (
                LinkClick::new(Element::anchor("/a")).with_modifiers(crate::dom::Modifiers {
                    meta: true,
                    ..Default::default()
                }),
                IgnoreReason::ModifiedClick,
            ),
            (
                LinkClick::new(Element::anchor("/a").attr("target", "_blank")),
                IgnoreReason::OtherTarget,
            ),
            (
                LinkClick::new(Element::anchor("/a.pdf").attr("download", "")),
                IgnoreReason::Download,
            ),
            (
                LinkClick::new(Element::anchor("/a").attr("rel", "nofollow external")),
                IgnoreReason::External,
            ),
            (
                LinkClick::new(Element::anchor("https://other.org/a")),
                IgnoreReason::External,
            ),
            (
                LinkClick::new(Element::anchor("//cdn.example.com/a")),
                IgnoreReason::External,
            ),
            (
                LinkClick::new(Element::anchor("mailto:me@example.com")),
                IgnoreReason::External,
            ),
            (LinkClick::new(Element::new("a")), IgnoreReason::MissingHref),
            (
                LinkClick::new(Element::anchor("#section")),
                IgnoreReason::HashOnly,
            ),
        ];

        for (click, reason) in cases {
            assert_eq!(
                listener.handle_click(&click).ignore_reason(),
                Some(reason),
                "{:?}",
                click.element
            );
        }
        assert!(navigator.pushed.borrow().is_empty());
    }

    #[test]
    fn test_target_self_is_intercepted() {
        let (listener, _) = listener();
        let click = LinkClick::new(Element::anchor("/a").attr("target", "_self"));
        assert!(listener.handle_click(&click).is_intercepted());
    }

    #[test]
    fn test_same_origin_absolute_href() {
        let settings = AppSettings::new().origin("https://example.com");
        let (listener, _) = listener_with(settings, "/");

        let verdict = listener.handle_click(&LinkClick::new(Element::anchor(
            "https://example.com/users/7",
        )));
        assert_eq!(verdict.request().unwrap().path(), "/users/7");

        let verdict = listener.handle_click(&LinkClick::new(Element::anchor("https://example.com")));
        assert_eq!(verdict.request().unwrap().path(), "/");

        let verdict = listener.handle_click(&LinkClick::new(Element::anchor(
            "https://example.com.evil.org/",
        )));
        assert_eq!(verdict.ignore_reason(), Some(IgnoreReason::External));
    }

    #[test]
    fn test_custom_link_selector() {
        let settings = AppSettings::new().link_selector("a[data-route]");
        let (listener, _) = listener_with(settings, "/");

        let plain = LinkClick::new(Element::anchor("/a"));
        let marked = LinkClick::new(Element::anchor("/a").attr("data-route", ""));

        assert_eq!(
            listener.handle_click(&plain).ignore_reason(),
            Some(IgnoreReason::SelectorMismatch)
        );
        assert!(listener.handle_click(&marked).is_intercepted());
    }

    #[test]
    fn test_relative_hrefs() {
        assert_eq!(resolve_relative("/docs/intro", "setup"), "/docs/setup");
        assert_eq!(resolve_relative("/docs/intro", "../about"), "/about");
        assert_eq!(resolve_relative("/docs/", "./a/b?x=1"), "/docs/a/b?x=1");
        assert_eq!(resolve_relative("/docs/intro", "?page=2"), "/docs/intro?page=2");
        assert_eq!(resolve_relative("/", "../../x"), "/x");
        assert_eq!(resolve_relative("/docs/intro", "sub/"), "/docs/sub/");

        let (listener, _) = listener();
        let verdict = listener.handle_click(&LinkClick::new(Element::anchor("setup")));
        assert_eq!(verdict.request().unwrap().path(), "/docs/setup");
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://a"));
        assert!(has_scheme("tel:123"));
        assert!(!has_scheme("/a:b"));
        assert!(!has_scheme("a/b"));
        assert!(!has_scheme("1http:x"));
    }

    #[test]
    fn test_get_form_fields_go_to_query() {
        let (listener, navigator) = listener();
        let submit = FormSubmit::new(Element::form("get", "/search?stale=1"))
            .field("q", "rust lang")
            .field("tag", "a")
            .field("tag", "b");

        let verdict = listener.handle_submit(&submit);
        let request = verdict.request().unwrap();

        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query().get("q"), Some("rust lang"));
        assert_eq!(request.query().get_all("tag"), vec!["a", "b"]);
        assert!(!request.query().contains("stale"));
        assert!(request.params().is_empty());
        assert_eq!(navigator.location().url, "/search?q=rust%20lang&tag=a&tag=b");
    }

    #[test]
    fn test_post_form_fields_go_to_params() {
        let (listener, _) = listener();
        let submit = FormSubmit::new(Element::form("post", "/signup"))
            .field("email", "a@b.c")
            .field("name", "Bob");

        let request = listener.handle_submit(&submit).request().cloned().unwrap();

        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.path(), "/signup");
        assert_eq!(request.param("email"), Some("a@b.c"));
        assert_eq!(request.param("name"), Some("Bob"));
        assert!(matches!(request.raw(), Some(RawEvent::Submit(_))));
    }

    #[test]
    fn test_method_override() {
        let (listener, _) = listener();
        let submit = FormSubmit::new(Element::form("post", "/users/7"))
            .field("_method", "delete")
            .field("confirm", "yes");

        let request = listener.handle_submit(&submit).request().cloned().unwrap();

        assert_eq!(request.method(), &Method::Delete);
        assert_eq!(request.param("confirm"), Some("yes"));
        assert!(!request.params().contains("_method"));
    }

    #[test]
    fn test_form_defaults() {
        let (listener, _) = listener();
        let submit = FormSubmit::new(Element::new("form")).field("a", "1");

        let request = listener.handle_submit(&submit).request().cloned().unwrap();

        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.path(), "/docs/intro");
        assert_eq!(request.url(), "/docs/intro?a=1");
    }

    #[test]
    fn test_empty_or_unknown_form_method_submits_as_get() {
        let (listener, _) = listener();

        for method in ["", "  ", "PUT", "bogus"] {
            let submit = FormSubmit::new(Element::form(method, "/search")).field("q", "x");
            let request = listener.handle_submit(&submit).request().cloned().unwrap();

            assert_eq!(request.method(), &Method::Get, "method={:?}", method);
            assert_eq!(request.query().get("q"), Some("x"));
            assert!(request.params().is_empty());
        }
    }

    #[test]
    fn test_dialog_form_is_ignored() {
        let (listener, navigator) = listener();
        let submit = FormSubmit::new(Element::form("DIALOG", "/search"));

        assert_eq!(
            listener.handle_submit(&submit).ignore_reason(),
            Some(IgnoreReason::DialogForm)
        );
        assert_eq!(navigator.location().url, "/docs/intro");
    }

    #[test]
    fn test_form_to_other_origin_is_ignored() {
        let (listener, _) = listener();
        let submit = FormSubmit::new(Element::form("post", "https://pay.example.org/checkout"));
        assert_eq!(
            listener.handle_submit(&submit).ignore_reason(),
            Some(IgnoreReason::External)
        );
    }
}
