use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use form_spec::{
    ErrorCode, FieldValue, FormController, FormError, FormSchema, FormState, FormValues,
    MessageCatalog, MessageError, SchemaError, SubmitDecision, ValidationReport,
    build_render_payload, render_json_ui as form_render_json_ui,
    render_text as form_render_text, resolve_visibility,
};

const DEFAULT_SCHEMA: &str = include_str!("../../form-spec/tests/fixtures/service_request.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse values: {0}")]
    ValuesParse(#[source] serde_json::Error),
    #[error("invalid form schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("invalid messages: {0}")]
    Messages(#[from] MessageError),
    #[error("{0}")]
    Form(#[from] FormError),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_schema_json: Option<String>,
    #[serde(default)]
    messages: BTreeMap<ErrorCode, String>,
}

/// Passive presentation props supplied by the embedding page.
#[derive(Debug, Deserialize, Default)]
struct RenderContext {
    #[serde(default)]
    loading: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    cancellable: bool,
}

struct LoadedForm {
    schema: FormSchema,
    messages: MessageCatalog,
}

fn load_config(config_json: &str) -> Result<ComponentConfig, ComponentError> {
    if config_json.trim().is_empty() {
        Ok(ComponentConfig::default())
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)
    }
}

fn load_form(config_json: &str) -> Result<LoadedForm, ComponentError> {
    let config = load_config(config_json)?;
    let schema_json = config.form_schema_json.as_deref().unwrap_or(DEFAULT_SCHEMA);
    let schema = FormSchema::from_json(schema_json)?;
    let messages = MessageCatalog::with_overrides(&config.messages)?;
    Ok(LoadedForm { schema, messages })
}

fn parse_values(values_json: &str) -> Result<FormValues, ComponentError> {
    if values_json.trim().is_empty() {
        return Ok(FormValues::new());
    }
    serde_json::from_str(values_json).map_err(ComponentError::ValuesParse)
}

fn parse_context(ctx_json: &str) -> RenderContext {
    serde_json::from_str(ctx_json).unwrap_or_default()
}

fn controller(form: LoadedForm, values: FormValues) -> Result<FormController, ComponentError> {
    Ok(FormController::new(form.schema, values)?.with_messages(form.messages))
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => {
            tracing::debug!("component call failed: {}", err);
            json!({ "error": err.to_string() }).to_string()
        }
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

/// Returns the configured form schema.
pub fn describe(config_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| encode(&form.schema)))
}

/// Loads the schema and lists tolerated oddities such as dangling dependencies.
pub fn check_schema(config_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let report = form.schema.check()?;
        Ok(json!({
            "valid": true,
            "warnings": report
                .warnings
                .iter()
                .map(|warning| json!({ "detail": warning.to_string(), "warning": warning }))
                .collect::<Vec<_>>(),
        }))
    }))
}

pub fn visibility(config_json: &str, values_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let values = parse_values(values_json)?;
        encode(&resolve_visibility(&form.schema, &values))
    }))
}

pub fn validate_values(config_json: &str, values_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let values = parse_values(values_json)?;
        let errors = form_spec::validate_form_with(&form.schema, &values, &form.messages);
        encode(&ValidationReport::from(errors))
    }))
}

fn controller_with_context(
    config_json: &str,
    ctx_json: &str,
    values_json: &str,
) -> Result<FormController, ComponentError> {
    let form = load_form(config_json)?;
    let ctx = parse_context(ctx_json);
    let values = parse_values(values_json)?;
    let mut controller = controller(form, values)?;
    if ctx.cancellable {
        controller = controller.with_cancel();
    }
    controller.set_loading(ctx.loading);
    controller.set_error(ctx.error);
    Ok(controller)
}

pub fn render_text(config_json: &str, ctx_json: &str, values_json: &str) -> String {
    respond_string(
        controller_with_context(config_json, ctx_json, values_json)
            .map(|controller| form_render_text(&build_render_payload(&controller))),
    )
}

pub fn render_json_ui(config_json: &str, ctx_json: &str, values_json: &str) -> String {
    respond(
        controller_with_context(config_json, ctx_json, values_json)
            .map(|controller| form_render_json_ui(&build_render_payload(&controller))),
    )
}

/// Applies one field change to a captured `{values, errors}` state and
/// returns the new state with the field's stale error removed.
pub fn patch(config_json: &str, state_json: &str, field: &str, value_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let state: FormState = if state_json.trim().is_empty() {
            FormState::default()
        } else {
            serde_json::from_str(state_json).map_err(ComponentError::ValuesParse)?
        };
        let value: FieldValue =
            serde_json::from_str(value_json).map_err(ComponentError::ValuesParse)?;
        let mut controller = FormController::restore(form.schema, state)?;
        controller.set_value(field, value)?;
        Ok(json!({
            "values": encode(controller.values())?,
            "errors": encode(controller.errors())?,
            "visibility": encode(&controller.visibility())?,
        }))
    }))
}

/// Runs the submit gate under the page context (`loading` blocks it).
/// Accepted values are returned together with the schema's submit endpoint
/// for the caller to forward.
pub fn submit(config_json: &str, ctx_json: &str, values_json: &str) -> String {
    respond(controller_with_context(config_json, ctx_json, values_json).and_then(|mut controller| {
        let endpoint = controller.schema().submit_endpoint.clone();
        let mut response = Map::new();
        match controller.request_submit() {
            SubmitDecision::Proceed(values) => {
                controller.complete_submission();
                response.insert("status".into(), Value::String("accepted".into()));
                response.insert("values".into(), encode(&values)?);
                if let Some(endpoint) = endpoint {
                    response.insert("submit_endpoint".into(), Value::String(endpoint));
                }
            }
            SubmitDecision::Rejected(errors) => {
                response.insert("status".into(), Value::String("invalid".into()));
                response.insert("values".into(), encode(controller.values())?);
                response.insert("errors".into(), encode(&errors)?);
            }
            SubmitDecision::Blocked => {
                response.insert("status".into(), Value::String("blocked".into()));
            }
        }
        Ok(Value::Object(response))
    }))
}
