#![allow(missing_docs)]

pub mod controller;
pub mod messages;
pub mod render;
pub mod spec;
pub mod validate;
pub mod value;
pub mod visibility;

pub use controller::{
    FormController, FormError, FormHandler, FormState, Phase, SubmitDecision, SubmitOutcome,
};
pub use messages::{MessageCatalog, MessageError, MessageParams};
pub use render::{
    InputKind, RenderField, RenderPayload, build_render_payload, render_json_ui, render_text,
};
pub use spec::{
    ConditionalRule, FieldOption, FieldType, FormField, FormSchema, SchemaError, SchemaReport,
    SchemaWarning, ValidationRule, form_schema_json_schema,
};
pub use validate::{
    ErrorCode, FieldError, FieldErrors, ValidationReport, validate_field, validate_field_with,
    validate_form, validate_form_with,
};
pub use value::{FieldValue, FileHandle, FormValues};
pub use visibility::{VisibilityMap, is_visible, resolve_visibility};
