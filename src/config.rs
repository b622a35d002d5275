//! Application settings

use crate::dom::Selector;
use crate::error::RouterError;
use serde::{Deserialize, Serialize};

/// Settings for an [`App`](crate::App)
///
/// Every field has a default, so a settings document only needs the keys it
/// changes.
///
/// # Example
///
/// ```
/// use history_router::AppSettings;
///
/// let settings = AppSettings::from_json(r#"{ "link_selector": "a[data-route]" }"#).unwrap();
/// assert_eq!(settings.link_selector, "a[data-route]");
/// assert_eq!(settings.form_selector, "form");
/// assert!(settings.log_events);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Which clicked elements are treated as in-app links
    pub link_selector: String,
    /// Which submitted forms are routed
    pub form_selector: String,
    /// Scheme and host of the page (e.g. `https://example.com`); absolute
    /// hrefs with this prefix are treated as in-app
    pub origin: Option<String>,
    /// Log `start`, `runRoute` and `routeNotFound` through the logging facade
    pub log_events: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            link_selector: "a".to_string(),
            form_selector: "form".to_string(),
            origin: None,
            log_events: true,
        }
    }
}

impl AppSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, RouterError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn link_selector(mut self, selector: impl Into<String>) -> Self {
        self.link_selector = selector.into();
        self
    }

    pub fn form_selector(mut self, selector: impl Into<String>) -> Self {
        self.form_selector = selector.into();
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    /// Check that both selectors parse and the origin has a scheme
    pub fn validate(&self) -> Result<(), RouterError> {
        Selector::parse(&self.link_selector)?;
        Selector::parse(&self.form_selector)?;
        if let Some(origin) = &self.origin {
            if !origin.contains("://") || origin.ends_with('/') {
                return Err(RouterError::InvalidSettings {
                    message: format!(
                        "origin '{}' must look like scheme://host without a trailing slash",
                        origin
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.link_selector, "a");
        assert_eq!(settings.form_selector, "form");
        assert_eq!(settings.origin, None);
        assert!(settings.log_events);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let settings = AppSettings::new()
            .link_selector("a.internal")
            .origin("https://example.com")
            .log_events(false);

        assert_eq!(settings.link_selector, "a.internal");
        assert_eq!(settings.origin.as_deref(), Some("https://example.com"));
        assert!(!settings.log_events);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_json_rejects_bad_selector() {
        let result = AppSettings::from_json(r#"{ "form_selector": "form:first" }"#);
        assert!(matches!(result, Err(RouterError::InvalidSelector { .. })));
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        let result = AppSettings::from_json("{ not json");
        assert!(matches!(result, Err(RouterError::InvalidSettings { .. })));
    }

    #[test]
    fn test_origin_validation() {
        let settings = AppSettings::new().origin("example.com");
        assert!(matches!(
            settings.validate(),
            Err(RouterError::InvalidSettings { .. })
        ));
        let settings = AppSettings::new().origin("https://example.com/");
        assert!(settings.validate().is_err());
    }
}
