use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::MessageCatalog;
use crate::spec::{FieldType, FormSchema};
use crate::validate::{FieldErrors, validate_form_with};
use crate::value::{FieldValue, FormValues};
use crate::visibility::{VisibilityMap, resolve_visibility};

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("field '{0}' is not part of this form")]
    UnknownField(String),
    #[error("value for field '{field}' does not fit type {expected}")]
    ValueMismatch { field: String, expected: FieldType },
    #[error("field '{0}' is not a password field")]
    NotPassword(String),
}

/// Values and errors of one form instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub values: FormValues,
    #[serde(default)]
    pub errors: FieldErrors,
}

impl FormState {
    /// Starts from `initial` and fills each field's default where its name
    /// is absent. Deterministic for the same inputs.
    pub fn seed(schema: &FormSchema, initial: FormValues) -> Self {
        let mut values = initial;
        for field in &schema.fields {
            if let Some(default) = &field.default_value
                && !values.contains_key(&field.name)
            {
                values.insert(field.name.clone(), default.clone());
            }
        }
        Self {
            values,
            errors: FieldErrors::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
}

/// Result of [`FormController::request_submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
    /// Validation passed; hand these values to the submit handler, then call
    /// [`FormController::complete_submission`].
    Proceed(FormValues),
    /// Validation failed; the errors are now in the form state.
    Rejected(FieldErrors),
    /// Loading or a submission is already in flight.
    Blocked,
}

/// Result of [`FormController::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted,
    Rejected(FieldErrors),
    Blocked,
}

/// Callbacks supplied by whoever embeds the form.
pub trait FormHandler {
    type Error;

    fn on_submit(&mut self, values: &FormValues) -> Result<(), Self::Error>;

    fn on_cancel(&mut self) {}
}

/// Owns the state of one form and applies field, submit, and cancel events.
#[derive(Debug, Clone)]
pub struct FormController {
    schema: FormSchema,
    state: FormState,
    phase: Phase,
    revealed: BTreeSet<String>,
    loading: bool,
    error: Option<String>,
    cancellable: bool,
    messages: MessageCatalog,
}

impl FormController {
    pub fn new(schema: FormSchema, initial_values: FormValues) -> Result<Self, FormError> {
        check_values(&schema, &initial_values)?;
        let state = FormState::seed(&schema, initial_values);
        Ok(Self::from_parts(schema, state))
    }

    /// Resumes a form from a previously captured state without re-seeding
    /// defaults.
    pub fn restore(schema: FormSchema, state: FormState) -> Result<Self, FormError> {
        check_values(&schema, &state.values)?;
        Ok(Self::from_parts(schema, state))
    }

    fn from_parts(schema: FormSchema, state: FormState) -> Self {
        Self {
            schema,
            state,
            phase: Phase::Idle,
            revealed: BTreeSet::new(),
            loading: false,
            error: None,
            cancellable: false,
            messages: MessageCatalog::shared().clone(),
        }
    }

    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = messages;
        self
    }

    /// Enables the cancel action; without it cancel requests are ignored.
    pub fn with_cancel(mut self) -> Self {
        self.cancellable = true;
        self
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn values(&self) -> &FormValues {
        &self.state.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.state.errors
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Visibility derived from the current values.
    pub fn visibility(&self) -> VisibilityMap {
        resolve_visibility(&self.schema, &self.state.values)
    }

    /// While loading, submission is disabled.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Form-level banner supplied by the caller, typically a failed submission.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Stores the new value and drops any error recorded for the field. The
    /// field is not re-validated until the next submit.
    pub fn set_value(&mut self, name: &str, value: FieldValue) -> Result<(), FormError> {
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        if !field.kind.accepts(&value) {
            return Err(FormError::ValueMismatch {
                field: name.to_string(),
                expected: field.kind,
            });
        }
        tracing::debug!(field = name, "field changed");
        self.state.values.insert(name.to_string(), value);
        self.state.errors.remove(name);
        Ok(())
    }

    /// Flips the reveal toggle of a password field and returns the new state.
    pub fn toggle_password(&mut self, name: &str) -> Result<bool, FormError> {
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        if field.kind != FieldType::Password {
            return Err(FormError::NotPassword(name.to_string()));
        }
        if self.revealed.remove(name) {
            Ok(false)
        } else {
            self.revealed.insert(name.to_string());
            Ok(true)
        }
    }

    pub fn is_password_revealed(&self, name: &str) -> bool {
        self.revealed.contains(name)
    }

    /// Validates the visible fields. On success the form enters
    /// [`Phase::Submitting`] and the full value map is returned, including
    /// values of fields that have since been hidden.
    pub fn request_submit(&mut self) -> SubmitDecision {
        if self.loading || self.phase == Phase::Submitting {
            tracing::debug!(form = %self.schema.title, "submit blocked");
            return SubmitDecision::Blocked;
        }
        let errors = validate_form_with(&self.schema, &self.state.values, &self.messages);
        if !errors.is_empty() {
            tracing::debug!(form = %self.schema.title, errors = errors.len(), "submit rejected");
            self.state.errors = errors.clone();
            return SubmitDecision::Rejected(errors);
        }
        self.state.errors.clear();
        self.phase = Phase::Submitting;
        tracing::debug!(form = %self.schema.title, "submitting");
        SubmitDecision::Proceed(self.state.values.clone())
    }

    /// Returns to [`Phase::Idle`] once the caller's submission has finished,
    /// whether it succeeded or not.
    pub fn complete_submission(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn submit<H: FormHandler>(&mut self, handler: &mut H) -> Result<SubmitOutcome, H::Error> {
        match self.request_submit() {
            SubmitDecision::Blocked => Ok(SubmitOutcome::Blocked),
            SubmitDecision::Rejected(errors) => Ok(SubmitOutcome::Rejected(errors)),
            SubmitDecision::Proceed(values) => {
                let result = handler.on_submit(&values);
                self.complete_submission();
                result.map(|()| SubmitOutcome::Submitted)
            }
        }
    }

    /// Invokes the cancel callback when cancelling is enabled. Form state is
    /// left untouched.
    pub fn cancel<H: FormHandler>(&self, handler: &mut H) -> bool {
        if !self.cancellable {
            return false;
        }
        handler.on_cancel();
        true
    }
}

fn check_values(schema: &FormSchema, values: &FormValues) -> Result<(), FormError> {
    for (name, value) in values {
        if let Some(field) = schema.field(name)
            && !field.kind.accepts(value)
        {
            return Err(FormError::ValueMismatch {
                field: name.clone(),
                expected: field.kind,
            });
        }
    }
    Ok(())
}
