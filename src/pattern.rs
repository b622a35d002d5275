//! Path patterns
//!
//! A [`PathPattern`] is compiled once from a template such as
//! `/welcome/:name` and then matched against request paths.
//!
//! Supported segments:
//! - `users` - static text, must match exactly
//! - `:id` - named parameter, captures one segment
//! - `:id<\d+>` / `:id<uuid>` - parameter with a constraint
//! - `:tab?` - optional parameter, only in trailing position
//! - `*` - wildcard, swallows the rest of the path (last segment only)
//!
//! Captured values are percent-decoded. A trailing slash on the path is
//! ignored.

use crate::error::RouterError;
use crate::params::{decode_uri_component, RouteParams};
use std::collections::HashSet;
use std::fmt;

/// A single segment in a route pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Static text that must match exactly
    Static(String),
    /// Parameter that captures a value
    Param {
        name: String,
        constraint: Option<Constraint>,
        optional: bool,
    },
    /// Wildcard that matches everything after it
    Wildcard,
}

impl Segment {
    /// Parse a segment from string
    ///
    /// Examples:
    /// - "users" -> Static("users")
    /// - ":id" -> Param { name: "id", .. }
    /// - ":id<\\d+>" -> Param { constraint: Some(Numeric), .. }
    /// - ":tab?" -> Param { optional: true, .. }
    /// - "*" -> Wildcard
    fn parse(s: &str) -> Result<Self, String> {
        if s == "*" {
            return Ok(Segment::Wildcard);
        }

        let Some(rest) = s.strip_prefix(':') else {
            return Ok(Segment::Static(s.to_string()));
        };

        let (rest, optional) = match rest.strip_suffix('?') {
            Some(rest) => (rest, true),
            None => (rest, false),
        };

        let (name, constraint) = match rest.find('<') {
            Some(pos) => {
                let body = rest[pos + 1..]
                    .strip_suffix('>')
                    .ok_or_else(|| format!("unclosed constraint in '{}'", s))?;
                (&rest[..pos], Some(Constraint::parse(body)?))
            }
            None => (rest, None),
        };

        if name.is_empty() {
            return Err("parameter name cannot be empty".to_string());
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(format!(
                "parameter '{}' must contain only alphanumeric characters and underscores",
                name
            ));
        }

        Ok(Segment::Param {
            name: name.to_string(),
            constraint,
            optional,
        })
    }
}

/// Constraint for validating parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// ASCII digits only
    Numeric,
    /// 8-4-4-4-12 hex groups
    Uuid,
}

impl Constraint {
    fn parse(s: &str) -> Result<Self, String> {
        match s {
            "\\d+" | "int" => Ok(Constraint::Numeric),
            "uuid" => Ok(Constraint::Uuid),
            other => Err(format!("unknown constraint '{}'", other)),
        }
    }

    /// Validate a value against this constraint
    pub fn validate(self, value: &str) -> bool {
        match self {
            Constraint::Numeric => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            Constraint::Uuid => {
                let parts: Vec<&str> = value.split('-').collect();
                parts.len() == 5
                    && parts
                        .iter()
                        .zip([8, 4, 4, 4, 12])
                        .all(|(part, len)| part.len() == len)
                    && parts
                        .iter()
                        .all(|p| p.bytes().all(|b| b.is_ascii_hexdigit()))
            }
        }
    }
}

/// A compiled path template
///
/// # Example
///
/// ```
/// use history_router::PathPattern;
///
/// let pattern = PathPattern::parse("/welcome/:name").unwrap();
/// let params = pattern.matches("/welcome/bob").unwrap();
///
/// assert_eq!(params.get("name"), Some("bob"));
/// assert!(pattern.matches("/welcome").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern, validating it
    ///
    /// Rejected: missing leading `/`, `//`, empty or duplicate parameter
    /// names, unknown constraints, a wildcard or an optional parameter that
    /// is not in trailing position.
    pub fn parse(source: &str) -> Result<Self, RouterError> {
        let invalid = |reason: String| RouterError::InvalidPattern {
            pattern: source.to_string(),
            reason,
        };

        if !source.starts_with('/') {
            return Err(invalid("pattern must start with '/'".to_string()));
        }
        if source.contains("//") {
            return Err(invalid(
                "pattern cannot contain consecutive slashes".to_string(),
            ));
        }

        let segments = source
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let mut names = HashSet::new();
        let mut seen_optional = false;
        for (idx, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Wildcard if idx + 1 != segments.len() => {
                    return Err(invalid("wildcard must be the last segment".to_string()));
                }
                Segment::Param { name, optional, .. } => {
                    if !names.insert(name.as_str()) {
                        return Err(invalid(format!("duplicate parameter '{}'", name)));
                    }
                    if seen_optional && !optional {
                        return Err(invalid(
                            "required parameter after an optional one".to_string(),
                        ));
                    }
                    seen_optional |= *optional;
                }
                Segment::Static(_) if seen_optional => {
                    return Err(invalid(
                        "static segment after an optional parameter".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Match this pattern against a path
    ///
    /// Returns extracted parameters on success. The path must not carry a
    /// query string.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = RouteParams::new();
        let mut path_idx = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if path_segments.get(path_idx) != Some(&expected.as_str()) {
                        return None;
                    }
                    path_idx += 1;
                }
                Segment::Param {
                    name,
                    constraint,
                    optional,
                } => {
                    let Some(raw) = path_segments.get(path_idx) else {
                        if *optional {
                            continue;
                        }
                        return None;
                    };

                    let value = decode_uri_component(raw);
                    if let Some(constraint) = constraint {
                        if !constraint.validate(&value) {
                            return None;
                        }
                    }

                    params.insert(name.clone(), value);
                    path_idx += 1;
                }
                Segment::Wildcard => return Some(params),
            }
        }

        (path_idx == path_segments.len()).then_some(params)
    }

    /// The template this pattern was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Fill the pattern's parameters from `params`
    ///
    /// Returns `None` when a required parameter is missing. Missing optional
    /// parameters are dropped; a wildcard is dropped.
    pub fn url_for(&self, params: &RouteParams) -> Option<String> {
        let mut url = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Static(text) => {
                    url.push('/');
                    url.push_str(text);
                }
                Segment::Param { name, optional, .. } => match params.get(name) {
                    Some(value) => {
                        url.push('/');
                        url.push_str(&crate::params::encode_uri_component(value));
                    }
                    None if *optional => {}
                    None => return None,
                },
                Segment::Wildcard => {}
            }
        }

        if url.is_empty() {
            url.push('/');
        }
        Some(url)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_parsing() {
        assert_eq!(
            Segment::parse("users"),
            Ok(Segment::Static("users".to_string()))
        );
        assert_eq!(
            Segment::parse(":id"),
            Ok(Segment::Param {
                name: "id".to_string(),
                constraint: None,
                optional: false,
            })
        );
        assert_eq!(
            Segment::parse(":id<\\d+>?"),
            Ok(Segment::Param {
                name: "id".to_string(),
                constraint: Some(Constraint::Numeric),
                optional: true,
            })
        );
        assert_eq!(Segment::parse("*"), Ok(Segment::Wildcard));
    }

    #[test]
    fn test_static_route_matching() {
        let pattern = PathPattern::parse("/users").unwrap();

        assert!(pattern.matches("/users").is_some());
        assert!(pattern.matches("/users/").is_some());
        assert!(pattern.matches("/posts").is_none());
        assert!(pattern.matches("/users/123").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/a").is_none());
    }

    #[test]
    fn test_dynamic_route_matching() {
        let pattern = PathPattern::parse("/welcome/:name").unwrap();

        let params = pattern.matches("/welcome/bob").unwrap();
        assert_eq!(params.get("name"), Some("bob"));
        assert_eq!(params.len(), 1);

        assert!(pattern.matches("/welcome").is_none());
        assert!(pattern.matches("/welcome/bob/extra").is_none());
    }

    #[test]
    fn test_param_values_are_decoded() {
        let pattern = PathPattern::parse("/tags/:tag").unwrap();
        let params = pattern.matches("/tags/rust%20lang").unwrap();
        assert_eq!(params.get("tag"), Some("rust lang"));

        let params = pattern.matches("/tags/c++").unwrap();
        assert_eq!(params.get("tag"), Some("c++"));
    }

    #[test]
    fn test_optional_param() {
        let pattern = PathPattern::parse("/settings/:tab?").unwrap();

        assert!(pattern.matches("/settings").unwrap().is_empty());
        assert_eq!(
            pattern.matches("/settings/profile").unwrap().get("tab"),
            Some("profile")
        );
        assert!(pattern.matches("/settings/a/b").is_none());
    }

    #[test]
    fn test_wildcard_matching() {
        let pattern = PathPattern::parse("/files/*").unwrap();

        assert!(pattern.matches("/files/docs").is_some());
        assert!(pattern.matches("/files/docs/report.pdf").is_some());
        assert!(pattern.matches("/other").is_none());
    }

    #[test]
    fn test_constraints() {
        let numeric = PathPattern::parse("/users/:id<\\d+>").unwrap();
        assert!(numeric.matches("/users/123").is_some());
        assert!(numeric.matches("/users/abc").is_none());

        let uuid = PathPattern::parse("/orders/:id<uuid>").unwrap();
        assert!(uuid
            .matches("/orders/550e8400-e29b-41d4-a716-446655440000")
            .is_some());
        assert!(uuid.matches("/orders/550e8400-e29b-41d4-a716").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        for source in [
            "users",
            "/a//b",
            "/users/:",
            "/users/:id/:id",
            "/files/*/more",
            "/a/:b?/:c",
            "/a/:b?/c",
            "/a/:id<regex>",
            "/a/:id<\\d+",
            "/a/:bad-name",
        ] {
            assert!(
                matches!(
                    PathPattern::parse(source),
                    Err(RouterError::InvalidPattern { .. })
                ),
                "expected '{}' to be rejected",
                source
            );
        }
    }

    #[test]
    fn test_url_for() {
        let pattern = PathPattern::parse("/users/:id/posts/:post?").unwrap();
        let params: RouteParams = [("id", "42")].into_iter().collect();

        assert_eq!(pattern.url_for(&params), Some("/users/42/posts".to_string()));
        assert_eq!(pattern.url_for(&RouteParams::new()), None);
        assert_eq!(
            PathPattern::parse("/").unwrap().url_for(&params),
            Some("/".to_string())
        );
    }
}
