use std::collections::BTreeMap;
use std::sync::LazyLock;

use handlebars::{Handlebars, TemplateError};
use serde::Serialize;
use thiserror::Error;

use crate::validate::ErrorCode;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid message template for '{code}': {source}")]
    Template {
        code: ErrorCode,
        #[source]
        source: Box<TemplateError>,
    },
}

/// Values a message template may reference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageParams<'a> {
    pub field: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

impl<'a> MessageParams<'a> {
    pub fn for_field(field: &'a str) -> Self {
        Self {
            field,
            ..Default::default()
        }
    }
}

/// Validation message templates keyed by [`ErrorCode`], rendered with
/// handlebars (`{{field}}`, `{{min}}`, `{{max}}`). Output is not HTML-escaped.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    registry: Handlebars<'static>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        for code in ErrorCode::ALL {
            if let Err(err) = registry.register_template_string(code.as_str(), code.default_template())
            {
                tracing::error!(code = code.as_str(), "default message template rejected: {}", err);
            }
        }
        Self { registry }
    }
}

static DEFAULT_CATALOG: LazyLock<MessageCatalog> = LazyLock::new(MessageCatalog::default);

impl MessageCatalog {
    /// Process-wide default catalog, built once.
    pub fn shared() -> &'static MessageCatalog {
        &DEFAULT_CATALOG
    }

    /// Default catalog with some templates replaced, e.g. from a locale pack.
    pub fn with_overrides(overrides: &BTreeMap<ErrorCode, String>) -> Result<Self, MessageError> {
        let mut catalog = Self::shared().clone();
        for (code, template) in overrides {
            catalog
                .registry
                .register_template_string(code.as_str(), template)
                .map_err(|source| MessageError::Template {
                    code: *code,
                    source: Box::new(source),
                })?;
        }
        Ok(catalog)
    }

    pub fn render(&self, code: ErrorCode, params: &MessageParams<'_>) -> String {
        match self.registry.render(code.as_str(), params) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(code = code.as_str(), "message template failed: {}", err);
                code.default_template()
                    .replace("{{field}}", params.field)
                    .replace("{{min}}", params.min.as_deref().unwrap_or_default())
                    .replace("{{max}}", params.max.as_deref().unwrap_or_default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_required_message_names_the_field() {
        let catalog = MessageCatalog::default();
        let message = catalog.render(ErrorCode::Required, &MessageParams::for_field("Full name"));
        assert_eq!(message, "Full name is required");
    }

    #[test]
    fn shared_catalog_is_built_once() {
        assert!(std::ptr::eq(MessageCatalog::shared(), MessageCatalog::shared()));
        let message = MessageCatalog::shared()
            .render(ErrorCode::InvalidEmail, &MessageParams::for_field("Email"));
        assert_eq!(message, "Please enter a valid email address");
    }

    #[test]
    fn labels_are_not_html_escaped() {
        let catalog = MessageCatalog::default();
        let message = catalog.render(ErrorCode::Required, &MessageParams::for_field("Name & title"));
        assert_eq!(message, "Name & title is required");
    }

    #[test]
    fn overrides_replace_templates() {
        let overrides = BTreeMap::from([(ErrorCode::MinLength, "Minimal {{min}} karakter".to_string())]);
        let catalog = MessageCatalog::with_overrides(&overrides).expect("catalog");
        let params = MessageParams {
            field: "Kode",
            min: Some("3".into()),
            max: None,
        };
        assert_eq!(catalog.render(ErrorCode::MinLength, &params), "Minimal 3 karakter");
        assert_eq!(
            catalog.render(ErrorCode::InvalidEmail, &params),
            "Please enter a valid email address"
        );
    }

    #[test]
    fn broken_override_is_rejected() {
        let overrides = BTreeMap::from([(ErrorCode::Required, "{{#if field}}unclosed".to_string())]);
        assert!(MessageCatalog::with_overrides(&overrides).is_err());
    }
}
