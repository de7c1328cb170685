use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Current values of a form, keyed by field name.
///
/// A name missing from the map is "undefined", which is distinct from an
/// explicit [`FieldValue::Empty`].
pub type FormValues = BTreeMap<String, FieldValue>;

/// Reference to a file picked for a `file` field. Uploading is left to the
/// caller after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileHandle {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    File(FileHandle),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Empty => serializer.serialize_unit(),
            FieldValue::Bool(flag) => serializer.serialize_bool(*flag),
            FieldValue::Number(number) => match whole_number(*number) {
                Some(whole) => serializer.serialize_i64(whole),
                None => serializer.serialize_f64(*number),
            },
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::File(handle) => handle.serialize(serializer),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(value: FileHandle) -> Self {
        FieldValue::File(value)
    }
}

impl FieldValue {
    /// Truthiness as the browser form layer sees it. Lists and files are
    /// always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Empty => false,
            FieldValue::Bool(flag) => *flag,
            FieldValue::Number(number) => *number != 0.0 && !number.is_nan(),
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::List(_) | FieldValue::File(_) => true,
        }
    }

    /// String form used by pattern checks.
    pub fn display_string(&self) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::Number(number) => number_to_string(*number),
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items.join(","),
            FieldValue::File(handle) => handle.name.clone(),
        }
    }

    /// The `length` used by `min`/`max` rules: UTF-16 units for text and
    /// numbers (via their display string), item count for lists. Other
    /// variants have no length.
    pub fn length(&self) -> Option<usize> {
        match self {
            FieldValue::Text(text) => Some(text.encode_utf16().count()),
            FieldValue::Number(number) => Some(number_to_string(*number).encode_utf16().count()),
            FieldValue::List(items) => Some(items.len()),
            FieldValue::Empty | FieldValue::Bool(_) | FieldValue::File(_) => None,
        }
    }

    /// Strict equality against a JSON literal. Lists and files compare by
    /// identity in the browser, so they never match a literal.
    pub fn strict_eq(&self, expected: &Value) -> bool {
        match (self, expected) {
            (FieldValue::Empty, Value::Null) => true,
            (FieldValue::Bool(left), Value::Bool(right)) => left == right,
            (FieldValue::Number(left), Value::Number(right)) => {
                right.as_f64().is_some_and(|right| *left == right)
            }
            (FieldValue::Text(left), Value::String(right)) => left == right,
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Numeric coercion with browser `Number(text)` semantics. Returns `None`
/// where the browser would produce `NaN`.
pub fn coerce_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    for (prefix, radix) in [
        ("0x", 16),
        ("0X", 16),
        ("0o", 8),
        ("0O", 8),
        ("0b", 2),
        ("0B", 2),
    ] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            if digits.is_empty() {
                return None;
            }
            return digits.chars().try_fold(0.0_f64, |acc, ch| {
                ch.to_digit(radix)
                    .map(|digit| acc * f64::from(radix) + f64::from(digit))
            });
        }
    }
    if !trimmed
        .bytes()
        .all(|byte| byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Display string for a number, matching the browser's formatting for the
/// common cases (no trailing `.0`, `NaN`, `Infinity`).
pub fn number_to_string(number: f64) -> String {
    if number.is_nan() {
        return "NaN".into();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    match whole_number(number) {
        Some(whole) => whole.to_string(),
        None => number.to_string(),
    }
}

fn whole_number(number: f64) -> Option<i64> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if number.is_finite() && number.fract() == 0.0 && number.abs() <= MAX_SAFE {
        Some(number as i64)
    } else {
        None
    }
}
