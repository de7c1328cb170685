pub mod field;
pub mod form;

pub use field::{ConditionalRule, FieldOption, FieldType, FormField, ValidationRule};
pub use form::{
    FormSchema, SchemaError, SchemaReport, SchemaWarning, form_schema_json_schema,
};
