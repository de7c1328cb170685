use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::field::{FieldType, FormField};

/// Top-level form definition served by the service catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Catalog key of the public service this form belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Endpoint the portal forwards accepted submissions to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_endpoint: Option<String>,
    /// Ordered; the order is the display order.
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_button_text: Option<String>,
}

/// Schema defects that make a form unusable.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse form schema: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("field #{index} has an empty name")]
    EmptyFieldName { index: usize },
    #[error("field name '{0}' is declared more than once")]
    DuplicateField(String),
    #[error("field '{field}' has an invalid pattern: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("field '{field}' default value does not fit type {kind}")]
    DefaultMismatch { field: String, kind: FieldType },
}

/// Schema oddities that are tolerated but worth surfacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaWarning {
    /// The field depends on a name missing from the schema and can never show.
    DanglingDependency { field: String, depends_on: String },
    SelfDependency { field: String },
    MissingOptions { field: String },
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaWarning::DanglingDependency { field, depends_on } => write!(
                f,
                "field '{}' depends on unknown field '{}' and will stay hidden",
                field, depends_on
            ),
            SchemaWarning::SelfDependency { field } => {
                write!(f, "field '{}' depends on itself", field)
            }
            SchemaWarning::MissingOptions { field } => {
                write!(f, "field '{}' offers no options", field)
            }
        }
    }
}

/// Outcome of a successful [`FormSchema::check`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaReport {
    pub warnings: Vec<SchemaWarning>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl FormSchema {
    /// Parses a schema and rejects it if [`FormSchema::check`] fails.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_json::from_str(json)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_json::from_value(value)?;
        schema.check()?;
        Ok(schema)
    }

    /// Rejects duplicate or empty names, uncompilable patterns, and defaults
    /// of the wrong type. Dangling dependencies are only reported.
    pub fn check(&self) -> Result<SchemaReport, SchemaError> {
        let mut names = BTreeSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName { index });
            }
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if let Some(pattern) = field
                .validation
                .as_ref()
                .and_then(|rule| rule.pattern.as_deref())
            {
                Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                    field: field.name.clone(),
                    source,
                })?;
            }
            if let Some(default) = &field.default_value
                && !field.kind.accepts(default)
            {
                return Err(SchemaError::DefaultMismatch {
                    field: field.name.clone(),
                    kind: field.kind,
                });
            }
        }

        let mut report = SchemaReport::default();
        for field in &self.fields {
            if let Some(conditional) = &field.conditional {
                if conditional.depends_on == field.name {
                    report.warnings.push(SchemaWarning::SelfDependency {
                        field: field.name.clone(),
                    });
                } else if !names.contains(conditional.depends_on.as_str()) {
                    report.warnings.push(SchemaWarning::DanglingDependency {
                        field: field.name.clone(),
                        depends_on: conditional.depends_on.clone(),
                    });
                }
            }
            if field.kind.uses_options()
                && field.options.as_ref().is_none_or(|options| options.is_empty())
            {
                report.warnings.push(SchemaWarning::MissingOptions {
                    field: field.name.clone(),
                });
            }
        }
        for warning in &report.warnings {
            tracing::warn!(form = %self.title, "{}", warning);
        }
        Ok(report)
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn submit_label(&self) -> &str {
        self.submit_button_text.as_deref().unwrap_or("Submit")
    }

    pub fn cancel_label(&self) -> &str {
        self.cancel_button_text.as_deref().unwrap_or("Cancel")
    }
}

/// JSON Schema describing the [`FormSchema`] document format.
pub fn form_schema_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(FormSchema)).unwrap_or_default()
}
