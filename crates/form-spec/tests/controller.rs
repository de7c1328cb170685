use std::collections::BTreeMap;

use serde_json::json;

use form_spec::{
    ErrorCode, FieldType, FieldValue, FileHandle, FormController, FormError, FormField,
    FormHandler, FormSchema, FormValues, MessageCatalog, Phase, SubmitDecision, SubmitOutcome,
};

#[derive(Default)]
struct Recorder {
    submitted: Vec<FormValues>,
    cancelled: usize,
    fail_with: Option<String>,
}

impl FormHandler for Recorder {
    type Error = String;

    fn on_submit(&mut self, values: &FormValues) -> Result<(), Self::Error> {
        self.submitted.push(values.clone());
        match &self.fail_with {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn on_cancel(&mut self) {
        self.cancelled += 1;
    }
}

fn email_schema() -> FormSchema {
    FormSchema {
        title: "Contact".into(),
        description: None,
        service_id: None,
        submit_endpoint: None,
        fields: vec![FormField::new("email", "Email", FieldType::Email).required()],
        submit_button_text: None,
        cancel_button_text: None,
    }
}

fn pet_schema() -> FormSchema {
    FormSchema::from_json(include_str!("fixtures/pet_form.json")).expect("schema")
}

fn service_schema() -> FormSchema {
    FormSchema::from_json(include_str!("fixtures/service_request.json")).expect("schema")
}

#[test]
fn email_flow_submits_only_valid_values() {
    let mut form = FormController::new(email_schema(), FormValues::new()).expect("form");
    let mut handler = Recorder::default();

    let outcome = form.submit(&mut handler).expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Rejected(ref errors) if errors["email"].code == ErrorCode::Required));

    form.set_value("email", "a@b".into()).expect("set");
    let outcome = form.submit(&mut handler).expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Rejected(ref errors) if errors["email"].code == ErrorCode::InvalidEmail));
    assert!(handler.submitted.is_empty());

    form.set_value("email", "a@b.com".into()).expect("set");
    assert_eq!(form.submit(&mut handler), Ok(SubmitOutcome::Submitted));
    assert_eq!(handler.submitted.len(), 1);
    assert_eq!(
        serde_json::to_value(&handler.submitted[0]).expect("json"),
        json!({ "email": "a@b.com" })
    );
    assert!(form.errors().is_empty());
    assert_eq!(form.phase(), Phase::Idle);
}

#[test]
fn changing_a_field_clears_its_stale_error_only() {
    let schema = FormSchema {
        fields: vec![
            FormField::new("email", "Email", FieldType::Email).required(),
            FormField::new("name", "Name", FieldType::String).required(),
        ],
        ..email_schema()
    };
    let mut form = FormController::new(schema, FormValues::new()).expect("form");
    assert!(matches!(form.request_submit(), SubmitDecision::Rejected(_)));
    assert_eq!(form.errors().len(), 2);

    form.set_value("email", "still wrong".into()).expect("set");
    assert!(!form.errors().contains_key("email"));
    assert!(form.errors().contains_key("name"));
}

#[test]
fn hidden_invalid_fields_never_block_submission() {
    let initial = FormValues::from([("hasPet".to_string(), FieldValue::Bool(false))]);
    let mut form = FormController::new(pet_schema(), initial).expect("form");
    let mut handler = Recorder::default();
    assert_eq!(form.submit(&mut handler), Ok(SubmitOutcome::Submitted));

    form.set_value("hasPet", FieldValue::Bool(true)).expect("set");
    form.set_value("petName", "".into()).expect("set");
    let outcome = form.submit(&mut handler).expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Rejected(ref errors) if errors.contains_key("petName")));
    assert_eq!(handler.submitted.len(), 1);
}

#[test]
fn submitted_values_keep_hidden_fields() {
    let mut form = FormController::new(pet_schema(), FormValues::new()).expect("form");
    form.set_value("hasPet", FieldValue::Bool(true)).expect("set");
    form.set_value("petName", "Milo".into()).expect("set");
    form.set_value("hasPet", FieldValue::Bool(false)).expect("set");
    assert_eq!(form.visibility()["petName"], false);

    match form.request_submit() {
        SubmitDecision::Proceed(values) => {
            assert_eq!(values["petName"], FieldValue::Text("Milo".into()));
        }
        other => panic!("unexpected decision {:?}", other),
    }
}

#[test]
fn defaults_fill_only_absent_names() {
    let initial = FormValues::from([("full_name".to_string(), FieldValue::Text("Sari".into()))]);
    let first = FormController::new(service_schema(), initial.clone()).expect("form");
    let second = FormController::new(service_schema(), initial).expect("form");
    assert_eq!(first.values(), second.values());
    assert_eq!(first.values()["has_business"], FieldValue::Bool(false));
    assert!(!first.values().contains_key("email"));

    let explicit = FormValues::from([("has_business".to_string(), FieldValue::Bool(true))]);
    let form = FormController::new(service_schema(), explicit).expect("form");
    assert_eq!(form.values()["has_business"], FieldValue::Bool(true));
}

#[test]
fn builder_defaults_seed_and_are_type_checked() {
    let schema = FormSchema {
        fields: vec![
            FormField::new("agree", "Agree", FieldType::Boolean).with_default(true),
            FormField::new("city", "City", FieldType::String).with_default("Bandung"),
        ],
        ..email_schema()
    };
    assert!(schema.check().expect("check").is_clean());
    let form = FormController::new(schema, FormValues::new()).expect("form");
    assert_eq!(form.values()["agree"], FieldValue::Bool(true));
    assert_eq!(form.values()["city"], FieldValue::Text("Bandung".into()));

    let mismatched = FormSchema {
        fields: vec![FormField::new("agree", "Agree", FieldType::Boolean).with_default("yes")],
        ..email_schema()
    };
    assert!(matches!(
        mismatched.check(),
        Err(form_spec::SchemaError::DefaultMismatch { .. })
    ));
}

#[test]
fn unknown_fields_and_mismatched_values_are_rejected() {
    let mut form = FormController::new(service_schema(), FormValues::new()).expect("form");
    assert_eq!(
        form.set_value("nope", "x".into()),
        Err(FormError::UnknownField("nope".into()))
    );
    assert!(matches!(
        form.set_value("has_business", "yes".into()),
        Err(FormError::ValueMismatch { .. })
    ));
    form.set_value(
        "documents",
        FieldValue::File(FileHandle {
            name: "ktp.pdf".into(),
            size: Some(1024),
            content_type: Some("application/pdf".into()),
        }),
    )
    .expect("file");
    form.set_value("employees", FieldValue::Number(4.0)).expect("number");

    let initial = FormValues::from([("email".to_string(), FieldValue::Bool(true))]);
    assert!(FormController::new(service_schema(), initial).is_err());
}

#[test]
fn extra_initial_values_are_kept() {
    let initial = FormValues::from([("tracking".to_string(), FieldValue::Text("abc".into()))]);
    let form = FormController::new(email_schema(), initial).expect("form");
    assert_eq!(form.values()["tracking"], FieldValue::Text("abc".into()));
}

#[test]
fn loading_and_in_flight_submissions_block() {
    let mut form = FormController::new(
        email_schema(),
        FormValues::from([("email".to_string(), FieldValue::Text("a@b.com".into()))]),
    )
    .expect("form");

    form.set_loading(true);
    assert_eq!(form.request_submit(), SubmitDecision::Blocked);
    form.set_loading(false);

    assert!(matches!(form.request_submit(), SubmitDecision::Proceed(_)));
    assert_eq!(form.phase(), Phase::Submitting);
    assert_eq!(form.request_submit(), SubmitDecision::Blocked);
    form.complete_submission();
    assert_eq!(form.phase(), Phase::Idle);
}

#[test]
fn failed_submission_returns_to_idle_and_reports_error() {
    let mut form = FormController::new(
        email_schema(),
        FormValues::from([("email".to_string(), FieldValue::Text("a@b.com".into()))]),
    )
    .expect("form");
    let mut handler = Recorder {
        fail_with: Some("service unavailable".into()),
        ..Default::default()
    };
    assert_eq!(form.submit(&mut handler), Err("service unavailable".to_string()));
    assert_eq!(form.phase(), Phase::Idle);
    assert!(form.error().is_none());

    form.set_error(Some("service unavailable".into()));
    assert_eq!(form.error(), Some("service unavailable"));
}

#[test]
fn cancel_fires_only_when_enabled() {
    let mut handler = Recorder::default();
    let form = FormController::new(email_schema(), FormValues::new()).expect("form");
    assert!(!form.cancel(&mut handler));
    assert_eq!(handler.cancelled, 0);

    let form = form.with_cancel();
    assert!(form.cancel(&mut handler));
    assert_eq!(handler.cancelled, 1);
    assert!(form.values().is_empty());
}

#[test]
fn password_toggle_is_per_field() {
    let schema = FormSchema {
        fields: vec![
            FormField::new("password", "Password", FieldType::Password),
            FormField::new("confirm", "Confirm", FieldType::Password),
            FormField::new("name", "Name", FieldType::String),
        ],
        ..email_schema()
    };
    let mut form = FormController::new(schema, FormValues::new()).expect("form");
    assert_eq!(form.toggle_password("password"), Ok(true));
    assert!(form.is_password_revealed("password"));
    assert!(!form.is_password_revealed("confirm"));
    assert_eq!(form.toggle_password("password"), Ok(false));
    assert_eq!(
        form.toggle_password("name"),
        Err(FormError::NotPassword("name".into()))
    );
}

#[test]
fn custom_messages_flow_into_errors() {
    let overrides = BTreeMap::from([(ErrorCode::Required, "{{field}} wajib diisi".to_string())]);
    let messages = MessageCatalog::with_overrides(&overrides).expect("messages");
    let mut form = FormController::new(email_schema(), FormValues::new())
        .expect("form")
        .with_messages(messages);
    form.request_submit();
    assert_eq!(form.errors()["email"].message, "Email wajib diisi");
}
