use std::collections::{BTreeMap, HashMap};
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::messages::{MessageCatalog, MessageParams};
use crate::spec::{FieldType, FormField, FormSchema, ValidationRule};
use crate::value::{FieldValue, FormValues, coerce_number, number_to_string};
use crate::visibility::is_visible;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-\(\)]+$").expect("phone pattern is valid"));
static PATTERNS: LazyLock<Mutex<HashMap<String, Regex>>> = LazyLock::new(Default::default);

/// Compiles a custom rule pattern, reusing earlier compilations.
fn compiled_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern)?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// Machine-readable reason a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    InvalidEmail,
    InvalidPhone,
    InvalidNumber,
    MinLength,
    MaxLength,
    InvalidPattern,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 7] = [
        ErrorCode::Required,
        ErrorCode::InvalidEmail,
        ErrorCode::InvalidPhone,
        ErrorCode::InvalidNumber,
        ErrorCode::MinLength,
        ErrorCode::MaxLength,
        ErrorCode::InvalidPattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::InvalidPhone => "invalid_phone",
            ErrorCode::InvalidNumber => "invalid_number",
            ErrorCode::MinLength => "min_length",
            ErrorCode::MaxLength => "max_length",
            ErrorCode::InvalidPattern => "invalid_pattern",
        }
    }

    pub fn default_template(&self) -> &'static str {
        match self {
            ErrorCode::Required => "{{field}} is required",
            ErrorCode::InvalidEmail => "Please enter a valid email address",
            ErrorCode::InvalidPhone => "Please enter a valid phone number",
            ErrorCode::InvalidNumber => "Please enter a valid number",
            ErrorCode::MinLength => "Must be at least {{min}} characters",
            ErrorCode::MaxLength => "Must be no more than {{max}} characters",
            ErrorCode::InvalidPattern => "Invalid format",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error shown next to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub code: ErrorCode,
    pub message: String,
}

/// Errors of one validation pass, keyed by field name.
pub type FieldErrors = BTreeMap<String, FieldError>;

/// Transport shape of a whole-form validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
}

impl From<FieldErrors> for ValidationReport {
    fn from(errors: FieldErrors) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

pub fn validate_field(field: &FormField, value: Option<&FieldValue>) -> Option<FieldError> {
    validate_field_with(field, value, MessageCatalog::shared())
}

/// Checks one field. Rules run in order and the first failure wins:
/// required, then the type check, then the custom rule. Type and custom
/// checks only look at truthy values. Never fails for any value.
pub fn validate_field_with(
    field: &FormField,
    value: Option<&FieldValue>,
    messages: &MessageCatalog,
) -> Option<FieldError> {
    let truthy = value.is_some_and(FieldValue::is_truthy);
    let blank_text = value
        .and_then(FieldValue::as_text)
        .is_some_and(|text| text.trim().is_empty());

    if field.required && (!truthy || blank_text) {
        return Some(error(messages, ErrorCode::Required, MessageParams::for_field(&field.label)));
    }

    let value = value.filter(|value| value.is_truthy())?;

    if let Some(code) = type_violation(field.kind, value) {
        return Some(error(messages, code, MessageParams::for_field(&field.label)));
    }

    let rule = field.validation.as_ref()?;
    rule_violation(field, rule, value, messages)
}

fn type_violation(kind: FieldType, value: &FieldValue) -> Option<ErrorCode> {
    match kind {
        FieldType::Email => {
            (!EMAIL.is_match(&value.display_string())).then_some(ErrorCode::InvalidEmail)
        }
        FieldType::Phone => {
            (!PHONE.is_match(&value.display_string())).then_some(ErrorCode::InvalidPhone)
        }
        FieldType::Number | FieldType::Integer => {
            let numeric = match value {
                FieldValue::Number(number) => !number.is_nan(),
                other => coerce_number(&other.display_string()).is_some(),
            };
            (!numeric).then_some(ErrorCode::InvalidNumber)
        }
        FieldType::String
        | FieldType::Boolean
        | FieldType::Date
        | FieldType::Datetime
        | FieldType::Select
        | FieldType::Multiselect
        | FieldType::Textarea
        | FieldType::File
        | FieldType::Password => None,
    }
}

fn rule_violation(
    field: &FormField,
    rule: &ValidationRule,
    value: &FieldValue,
    messages: &MessageCatalog,
) -> Option<FieldError> {
    let length = value.length();

    if let Some(min) = rule.min
        && let Some(length) = length
        && (length as f64) < min
    {
        let params = MessageParams {
            field: &field.label,
            min: Some(number_to_string(min)),
            max: None,
        };
        return Some(error(messages, ErrorCode::MinLength, params));
    }

    if let Some(max) = rule.max
        && let Some(length) = length
        && (length as f64) > max
    {
        let params = MessageParams {
            field: &field.label,
            min: None,
            max: Some(number_to_string(max)),
        };
        return Some(error(messages, ErrorCode::MaxLength, params));
    }

    if let Some(pattern) = &rule.pattern {
        match compiled_pattern(pattern) {
            Ok(regex) if !regex.is_match(&value.display_string()) => {
                return Some(error(
                    messages,
                    ErrorCode::InvalidPattern,
                    MessageParams::for_field(&field.label),
                ));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(field = %field.name, "skipping uncompilable pattern: {}", err);
            }
        }
    }

    None
}

fn error(messages: &MessageCatalog, code: ErrorCode, params: MessageParams<'_>) -> FieldError {
    FieldError {
        code,
        message: messages.render(code, &params),
    }
}

pub fn validate_form(schema: &FormSchema, values: &FormValues) -> FieldErrors {
    validate_form_with(schema, values, MessageCatalog::shared())
}

/// Validates every visible field in schema order. Hidden fields are skipped
/// whatever they hold.
pub fn validate_form_with(
    schema: &FormSchema,
    values: &FormValues,
    messages: &MessageCatalog,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in &schema.fields {
        if !is_visible(field, values) {
            continue;
        }
        if let Some(error) = validate_field_with(field, values.get(&field.name), messages) {
            errors.insert(field.name.clone(), error);
        }
    }
    errors
}
