use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::FieldValue;

/// Supported field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Email,
    Phone,
    Number,
    Integer,
    Boolean,
    Date,
    Datetime,
    Select,
    Multiselect,
    Textarea,
    File,
    Password,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Textarea => "textarea",
            FieldType::File => "file",
            FieldType::Password => "password",
        }
    }

    /// Whether a value variant can be stored for this field type. Every type
    /// accepts [`FieldValue::Empty`]; numeric fields also take the raw text
    /// typed into the input.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Empty) => true,
            (
                FieldType::String
                | FieldType::Email
                | FieldType::Phone
                | FieldType::Date
                | FieldType::Datetime
                | FieldType::Select
                | FieldType::Textarea
                | FieldType::Password,
                FieldValue::Text(_),
            ) => true,
            (FieldType::Number | FieldType::Integer, FieldValue::Text(_) | FieldValue::Number(_)) => {
                true
            }
            (FieldType::Boolean, FieldValue::Bool(_)) => true,
            (FieldType::Multiselect, FieldValue::List(_)) => true,
            (FieldType::File, FieldValue::File(_)) => true,
            _ => false,
        }
    }

    pub fn uses_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Multiselect)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choice offered by `select` and `multiselect` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

/// Extra constraints on a field. `min`/`max` bound the value's length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Searched anywhere in the value's string form (not anchored).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Shows a field only while another field holds a specific value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalRule {
    #[serde(rename = "dependsOn", alias = "depends_on")]
    pub depends_on: String,
    pub value: Value,
}

/// Definition of a single field inside a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalRule>,
}

impl FormField {
    /// Minimal field with every optional attribute unset.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
            help_text: None,
            default_value: None,
            options: None,
            validation: None,
            conditional: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validation(mut self, validation: ValidationRule) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_conditional(mut self, depends_on: impl Into<String>, value: Value) -> Self {
        self.conditional = Some(ConditionalRule {
            depends_on: depends_on.into(),
            value,
        });
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_options<I, V, L>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        self.options = Some(
            options
                .into_iter()
                .map(|(value, label)| FieldOption {
                    value: value.into(),
                    label: label.into(),
                })
                .collect(),
        );
        self
    }
}
