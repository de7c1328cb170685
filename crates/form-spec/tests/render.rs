use form_spec::{
    FieldValue, FormController, FormSchema, FormValues, InputKind,
    render::{build_render_payload, render_json_ui, render_text},
};

fn fixture(name: &str) -> &'static str {
    match name {
        "service_request" => include_str!("../tests/fixtures/service_request.json"),
        "pet_form" => include_str!("../tests/fixtures/pet_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn controller(name: &str, values: FormValues) -> FormController {
    let schema = FormSchema::from_json(fixture(name)).expect("deserialize");
    FormController::new(schema, values).expect("controller")
}

#[test]
fn render_text_lists_visible_fields_only() {
    let form = controller("pet_form", FormValues::new());
    let text = render_text(&build_render_payload(&form));
    assert!(text.contains("Form: Pet Registration"));
    assert!(text.contains("Do you own a pet?"));
    assert!(!text.contains("Pet name"));
    assert!(text.contains("[Submit]"));
}

#[test]
fn render_text_shows_errors_and_banner() {
    let mut form = controller("pet_form", FormValues::new());
    form.set_value("hasPet", FieldValue::Bool(true)).expect("set");
    form.request_submit();
    form.set_error(Some("Server rejected the request".into()));
    let text = render_text(&build_render_payload(&form));
    assert!(text.contains("Error: Server rejected the request"));
    assert!(text.contains("! Pet name is required"));
}

#[test]
fn render_json_ui_exposes_structure() {
    let form = controller("service_request", FormValues::new()).with_cancel();
    let ui = render_json_ui(&build_render_payload(&form));
    assert_eq!(ui["title"], "Business Permit Request");
    assert_eq!(ui["service_id"], "business-permit");
    assert_eq!(ui["actions"]["submit"]["label"], "Send request");
    assert_eq!(ui["actions"]["cancel"]["label"], "Back to catalog");

    let fields = ui["fields"].as_array().expect("fields array");
    assert_eq!(fields.len(), 10);
    assert_eq!(fields[0]["name"], "full_name");
    let district = fields.iter().find(|f| f["name"] == "district").expect("district");
    assert_eq!(district["input"], "select");
    assert_eq!(district["options"].as_array().map(Vec::len), Some(3));
    let employees = fields.iter().find(|f| f["name"] == "employees").expect("employees");
    assert_eq!(employees["step"], "1");
    assert_eq!(employees["visible"], false);
    let has_business = fields.iter().find(|f| f["name"] == "has_business").expect("flag");
    assert_eq!(has_business["value"], false);
    assert_eq!(has_business["input"], "checkbox");
}

#[test]
fn cancel_action_absent_without_handler() {
    let form = controller("service_request", FormValues::new());
    let payload = build_render_payload(&form);
    assert!(payload.cancel_label.is_none());
    assert!(render_json_ui(&payload)["actions"]["cancel"].is_null());
}

#[test]
fn loading_disables_submit() {
    let mut form = controller("service_request", FormValues::new());
    form.set_loading(true);
    let ui = render_json_ui(&build_render_payload(&form));
    assert_eq!(ui["actions"]["submit"]["disabled"], true);
}

#[test]
fn revealed_password_renders_as_text() {
    let schema: FormSchema = serde_json::from_value(serde_json::json!({
        "title": "Account",
        "fields": [{ "name": "pin", "label": "PIN", "type": "password" }]
    }))
    .expect("deserialize");
    let mut form = FormController::new(schema, FormValues::new()).expect("controller");
    form.set_value("pin", "1234".into()).expect("set");
    let payload = build_render_payload(&form);
    assert_eq!(payload.fields[0].input, InputKind::Password);
    assert!(render_text(&payload).contains("= ****"));

    form.toggle_password("pin").expect("toggle");
    let payload = build_render_payload(&form);
    assert_eq!(payload.fields[0].input, InputKind::Text);
    assert!(render_text(&payload).contains("= 1234"));
}
