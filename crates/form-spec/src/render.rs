use serde_json::{Map, Value, json};

use crate::{
    controller::FormController,
    spec::{FieldOption, FieldType},
    validate::FieldError,
    value::FieldValue,
};

/// Input control a field is presented with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Tel,
    Number,
    Checkbox,
    Date,
    DatetimeLocal,
    Select,
    Multiselect,
    Textarea,
    File,
    Password,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Email => "email",
            InputKind::Tel => "tel",
            InputKind::Number => "number",
            InputKind::Checkbox => "checkbox",
            InputKind::Date => "date",
            InputKind::DatetimeLocal => "datetime-local",
            InputKind::Select => "select",
            InputKind::Multiselect => "multiselect",
            InputKind::Textarea => "textarea",
            InputKind::File => "file",
            InputKind::Password => "password",
        }
    }
}

/// Picks the control for a field type. A revealed password renders as text.
pub fn input_kind(kind: FieldType, password_revealed: bool) -> InputKind {
    match kind {
        FieldType::String => InputKind::Text,
        FieldType::Email => InputKind::Email,
        FieldType::Phone => InputKind::Tel,
        FieldType::Number | FieldType::Integer => InputKind::Number,
        FieldType::Boolean => InputKind::Checkbox,
        FieldType::Date => InputKind::Date,
        FieldType::Datetime => InputKind::DatetimeLocal,
        FieldType::Select => InputKind::Select,
        FieldType::Multiselect => InputKind::Multiselect,
        FieldType::Textarea => InputKind::Textarea,
        FieldType::File => InputKind::File,
        FieldType::Password if password_revealed => InputKind::Text,
        FieldType::Password => InputKind::Password,
    }
}

/// Step hint of numeric inputs. Integers are only discouraged from taking
/// decimals here; validation accepts them.
fn step_hint(kind: FieldType) -> Option<&'static str> {
    match kind {
        FieldType::Integer => Some("1"),
        FieldType::Number => Some("any"),
        _ => None,
    }
}

/// Describes a single field for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub name: String,
    pub label: String,
    pub kind: FieldType,
    pub input: InputKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub options: Vec<FieldOption>,
    pub step: Option<&'static str>,
    pub visible: bool,
    pub current_value: Option<FieldValue>,
    pub error: Option<FieldError>,
    pub password_revealed: bool,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub title: String,
    pub description: Option<String>,
    pub service_id: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
    pub submit_label: String,
    pub cancel_label: Option<String>,
    pub fields: Vec<RenderField>,
}

impl RenderPayload {
    pub fn visible_fields(&self) -> impl Iterator<Item = &RenderField> {
        self.fields.iter().filter(|field| field.visible)
    }
}

/// Build the render payload from the controller's current state.
pub fn build_render_payload(controller: &FormController) -> RenderPayload {
    let schema = controller.schema();
    let visibility = controller.visibility();
    let values = controller.values();
    let errors = controller.errors();

    let fields = schema
        .fields
        .iter()
        .map(|field| {
            let revealed = controller.is_password_revealed(&field.name);
            RenderField {
                name: field.name.clone(),
                label: field.label.clone(),
                kind: field.kind,
                input: input_kind(field.kind, revealed),
                required: field.required,
                placeholder: field.placeholder.clone(),
                help_text: field.help_text.clone(),
                options: field.options.clone().unwrap_or_default(),
                step: step_hint(field.kind),
                visible: visibility.get(&field.name).copied().unwrap_or(true),
                current_value: values.get(&field.name).cloned(),
                error: errors.get(&field.name).cloned(),
                password_revealed: revealed,
            }
        })
        .collect();

    RenderPayload {
        title: schema.title.clone(),
        description: schema.description.clone(),
        service_id: schema.service_id.clone(),
        error: controller.error().map(str::to_string),
        loading: controller.is_loading(),
        submit_label: schema.submit_label().to_string(),
        cancel_label: controller
            .is_cancellable()
            .then(|| schema.cancel_label().to_string()),
        fields,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("name".into(), Value::String(field.name.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.as_str().to_string()));
            map.insert("input".into(), Value::String(field.input.as_str().to_string()));
            map.insert("required".into(), Value::Bool(field.required));
            map.insert("visible".into(), Value::Bool(field.visible));
            if let Some(placeholder) = &field.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            if let Some(help_text) = &field.help_text {
                map.insert("help_text".into(), Value::String(help_text.clone()));
            }
            if !field.options.is_empty() {
                map.insert(
                    "options".into(),
                    Value::Array(
                        field
                            .options
                            .iter()
                            .map(|option| json!({ "value": option.value, "label": option.label }))
                            .collect(),
                    ),
                );
            }
            if let Some(step) = field.step {
                map.insert("step".into(), Value::String(step.to_string()));
            }
            if let Some(value) = &field.current_value {
                map.insert("value".into(), json!(value));
            }
            if let Some(error) = &field.error {
                map.insert("error".into(), Value::String(error.message.clone()));
            }
            if field.kind == FieldType::Password {
                map.insert("password_revealed".into(), Value::Bool(field.password_revealed));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "title": payload.title,
        "description": payload.description,
        "service_id": payload.service_id,
        "error": payload.error,
        "loading": payload.loading,
        "actions": {
            "submit": { "label": payload.submit_label, "disabled": payload.loading },
            "cancel": payload.cancel_label.as_ref().map(|label| json!({ "label": label })),
        },
        "fields": fields,
    })
}

/// Render the payload as human-friendly text. Hidden fields are omitted.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {}", payload.title));
    if let Some(description) = &payload.description {
        lines.push(description.clone());
    }
    if let Some(error) = &payload.error {
        lines.push(format!("Error: {}", error));
    }

    lines.push("Fields:".to_string());
    for field in payload.visible_fields() {
        let mut entry = format!(" - {} ({}, {})", field.label, field.name, field.kind);
        if field.required {
            entry.push_str(" [required]");
        }
        if let Some(value) = &field.current_value {
            entry.push_str(&format!(" = {}", value_to_display(field, value)));
        }
        lines.push(entry);
        if let Some(help) = &field.help_text {
            lines.push(format!("     {}", help));
        }
        if !field.options.is_empty() {
            let options = field
                .options
                .iter()
                .map(|option| format!("{}={}", option.value, option.label))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("     Options: {}", options));
        }
        if let Some(error) = &field.error {
            lines.push(format!("     ! {}", error.message));
        }
    }

    let mut actions = format!("[{}]", payload.submit_label);
    if payload.loading {
        actions.push_str(" (disabled)");
    }
    if let Some(cancel) = &payload.cancel_label {
        actions.push_str(&format!(" [{}]", cancel));
    }
    lines.push(actions);

    lines.join("\n")
}

fn value_to_display(field: &RenderField, value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) if field.input == InputKind::Password => "*".repeat(text.chars().count()),
        FieldValue::Empty => "(empty)".to_string(),
        other => other.display_string(),
    }
}
