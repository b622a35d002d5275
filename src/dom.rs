//! DOM event descriptors
//!
//! The router never touches a real DOM. Host glue describes the element an
//! event was delegated from as an [`Element`] and hands over a [`LinkClick`]
//! or [`FormSubmit`]. Which elements the router cares about is decided by a
//! [`Selector`].

use crate::error::RouterError;
use std::collections::BTreeMap;
use std::str::FromStr;

/// The element an event was delegated from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
}

impl Element {
    /// Create an element; the tag name is lower-cased
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    /// An `<a href=...>` element
    pub fn anchor(href: impl Into<String>) -> Self {
        Self::new("a").attr("href", href)
    }

    /// A `<form>` element with `method` and `action`
    pub fn form(method: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new("form").attr("method", method).attr("action", action)
    }

    /// Set an attribute; names are lower-cased
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Whitespace-separated entries of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attr("class").unwrap_or("").split_whitespace()
    }
}

/// Keyboard modifiers held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn any(self) -> bool {
        self.ctrl || self.meta || self.shift || self.alt
    }
}

/// A click on a link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkClick {
    pub element: Element,
    /// Mouse button, `0` is the primary button
    pub button: u16,
    pub modifiers: Modifiers,
    /// Whether another handler already called `preventDefault`
    pub default_prevented: bool,
}

impl LinkClick {
    /// Plain primary-button click on `element`
    pub fn new(element: Element) -> Self {
        Self {
            element,
            button: 0,
            modifiers: Modifiers::default(),
            default_prevented: false,
        }
    }

    pub fn with_button(mut self, button: u16) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn prevented(mut self) -> Self {
        self.default_prevented = true;
        self
    }
}

/// A form submission
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmit {
    pub element: Element,
    /// Successful controls, in document order
    pub fields: Vec<(String, String)>,
    pub default_prevented: bool,
}

impl FormSubmit {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            fields: Vec::new(),
            default_prevented: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn prevented(mut self) -> Self {
        self.default_prevented = true;
        self
    }
}

// ============================================================================
// Selector
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Present(String),
    Equals(String, String),
}

/// A compound selector: `tag`, `.class`, `[attr]` and `[attr=value]`
///
/// Only the simple-selector subset needed to pick out links and forms is
/// supported; no combinators and no pseudo-classes.
///
/// # Example
///
/// ```
/// use history_router::{Element, Selector};
///
/// let selector: Selector = "a.internal[data-route]".parse().unwrap();
/// let link = Element::anchor("/about")
///     .attr("class", "nav internal")
///     .attr("data-route", "");
///
/// assert!(selector.matches(&link));
/// assert!(!selector.matches(&Element::anchor("/about")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, RouterError> {
        let invalid = |reason: &str| RouterError::InvalidSelector {
            selector: source.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(invalid("selector is empty"));
        }
        if trimmed.contains(char::is_whitespace) && !trimmed.contains('[') {
            return Err(invalid("combinators are not supported"));
        }

        let tag_end = trimmed.find(['.', '[']).unwrap_or(trimmed.len());
        let tag = match &trimmed[..tag_end] {
            "" | "*" => None,
            name if is_ident(name) => Some(name.to_ascii_lowercase()),
            _ => return Err(invalid("invalid tag name")),
        };

        let mut classes = Vec::new();
        let mut attrs = Vec::new();
        let mut rest = &trimmed[tag_end..];

        while !rest.is_empty() {
            if let Some(after_dot) = rest.strip_prefix('.') {
                let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
                let class = &after_dot[..end];
                if !is_ident(class) {
                    return Err(invalid("invalid class name"));
                }
                classes.push(class.to_string());
                rest = &after_dot[end..];
            } else if let Some(after_bracket) = rest.strip_prefix('[') {
                let end = after_bracket
                    .find(']')
                    .ok_or_else(|| invalid("unclosed attribute selector"))?;
                attrs.push(parse_attr_test(&after_bracket[..end]).ok_or_else(|| {
                    invalid("invalid attribute selector")
                })?);
                rest = &after_bracket[end + 1..];
            } else {
                return Err(invalid("unexpected character"));
            }
        }

        Ok(Self {
            source: trimmed.to_string(),
            tag,
            classes,
            attrs,
        })
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if tag != element.tag() {
                return false;
            }
        }

        let classes_ok = self
            .classes
            .iter()
            .all(|class| element.classes().any(|c| c == class));

        classes_ok
            && self.attrs.iter().all(|test| match test {
                AttrTest::Present(name) => element.has_attr(name),
                AttrTest::Equals(name, value) => element.get_attr(name) == Some(value.as_str()),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn parse_attr_test(body: &str) -> Option<AttrTest> {
    match body.split_once('=') {
        None => {
            let name = body.trim();
            is_ident(name).then(|| AttrTest::Present(name.to_ascii_lowercase()))
        }
        Some((name, value)) => {
            let name = name.trim();
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            is_ident(name).then(|| AttrTest::Equals(name.to_ascii_lowercase(), value.to_string()))
        }
    }
}
