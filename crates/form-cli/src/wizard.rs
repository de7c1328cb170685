use std::fs;
use std::path::Path;

use form_spec::{
    FieldErrors, FieldOption, FieldType, FieldValue, FileHandle, FormField, FormHandler,
    FormSchema, FormValues, RenderPayload,
};

/// Controls which bits of state the fill prompt prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: visible fields and help text.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and results for `sila-forms fill`.
pub struct FillPresenter {
    verbosity: Verbosity,
    header_printed: bool,
}

impl FillPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", payload.title);
        if let Some(description) = &payload.description {
            println!("{}", description);
        }
        if self.verbosity.is_verbose() {
            println!("Visible fields:");
            for field in payload.visible_fields() {
                let mut entry = format!(" - {} ({})", field.name, field.label);
                if field.required {
                    entry.push_str(" [required]");
                }
                println!("{}", entry);
            }
        }
        self.header_printed = true;
    }

    pub fn show_prompt(&self, field: &FormField, current: Option<&FieldValue>) {
        let mut line = field.label.clone();
        if field.required {
            line.push_str(" *");
        }
        if let Some(hint) = hint(field) {
            line.push(' ');
            line.push_str(&hint);
        }
        if let Some(value) = current.filter(|value| **value != FieldValue::Empty) {
            if field.kind == FieldType::Password {
                line.push_str(" [keep current]");
            } else {
                line.push_str(&format!(" [{}]", value.display_string()));
            }
        }
        println!("{}", line);
        if let Some(placeholder) = &field.placeholder {
            println!("  e.g. {}", placeholder);
        }
        if self.verbosity.is_verbose()
            && let Some(help) = &field.help_text
        {
            println!("  {}", help);
        }
    }

    pub fn show_parse_error(&self, error: &InputParseError) {
        eprintln!("Invalid input: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_errors(&self, schema: &FormSchema, errors: &FieldErrors) {
        println!("Please fix the following:");
        for field in &schema.fields {
            if let Some(error) = errors.get(&field.name) {
                println!("  {}: {}", field.label, error.message);
            }
        }
    }
}

/// Submit handler that prints the accepted values as JSON.
pub struct PrintHandler {
    pub pretty: bool,
}

impl FormHandler for PrintHandler {
    type Error = serde_json::Error;

    fn on_submit(&mut self, values: &FormValues) -> Result<(), Self::Error> {
        println!("Done ✅");
        let rendered = if self.pretty {
            serde_json::to_string_pretty(values)?
        } else {
            serde_json::to_string(values)?
        };
        println!("{}", rendered);
        Ok(())
    }
}

/// Error produced when parsing a typed line into a field value.
#[derive(Debug)]
pub struct InputParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl InputParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Parses one line of input for `field`. A blank line keeps the current
/// value (`Ok(None)`); a single `-` clears it.
pub fn parse_input(field: &FormField, raw: &str) -> Result<Option<FieldValue>, InputParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed == "-" {
        return Ok(Some(FieldValue::Empty));
    }

    let options = field.options.as_deref().unwrap_or_default();
    let value = match field.kind {
        FieldType::Boolean => parse_boolean(trimmed)?,
        FieldType::Select => FieldValue::Text(resolve_option(options, trimmed)?),
        FieldType::Multiselect => FieldValue::List(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| resolve_option(options, token))
                .collect::<Result<_, _>>()?,
        ),
        FieldType::File => FieldValue::File(file_handle(Path::new(trimmed))?),
        FieldType::Password | FieldType::Textarea => {
            FieldValue::Text(raw.trim_end_matches(['\r', '\n']).to_string())
        }
        FieldType::String
        | FieldType::Email
        | FieldType::Phone
        | FieldType::Number
        | FieldType::Integer
        | FieldType::Date
        | FieldType::Datetime => FieldValue::Text(trimmed.to_string()),
    };
    Ok(Some(value))
}

fn parse_boolean(raw: &str) -> Result<FieldValue, InputParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "ya" | "1" => Ok(FieldValue::Bool(true)),
        "false" | "f" | "no" | "n" | "tidak" | "0" => Ok(FieldValue::Bool(false)),
        _ => Err(InputParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

/// Accepts an option value, its label (case-insensitive), or its 1-based
/// position. Fields without options take the input verbatim.
fn resolve_option(options: &[FieldOption], raw: &str) -> Result<String, InputParseError> {
    if options.is_empty() {
        return Ok(raw.to_string());
    }
    if let Some(option) = options
        .iter()
        .find(|option| option.value == raw || option.label.eq_ignore_ascii_case(raw))
    {
        return Ok(option.value.clone());
    }
    if let Ok(index) = raw.parse::<usize>()
        && let Some(option) = index.checked_sub(1).and_then(|index| options.get(index))
    {
        return Ok(option.value.clone());
    }
    Err(InputParseError::new(
        format!("'{}' is not one of the choices.", raw),
        Some(
            options
                .iter()
                .map(|option| option.value.as_str())
                .collect::<Vec<_>>()
                .join("/"),
        ),
    ))
}

fn file_handle(path: &Path) -> Result<FileHandle, InputParseError> {
    let metadata = fs::metadata(path).map_err(|err| {
        InputParseError::new(
            format!("Cannot read {}.", path.display()),
            Some(err.to_string()),
        )
    })?;
    if !metadata.is_file() {
        return Err(InputParseError::new(
            format!("{} is not a file.", path.display()),
            None,
        ));
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileHandle {
        content_type: content_type_for(path).map(str::to_string),
        name,
        size: Some(metadata.len()),
    })
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

fn hint(field: &FormField) -> Option<String> {
    match field.kind {
        FieldType::Boolean => Some("(yes/no)".to_string()),
        FieldType::Integer => Some("(whole number)".to_string()),
        FieldType::Number => Some("(number)".to_string()),
        FieldType::Email => Some("(email)".to_string()),
        FieldType::Phone => Some("(phone)".to_string()),
        FieldType::Date => Some("(YYYY-MM-DD)".to_string()),
        FieldType::Datetime => Some("(YYYY-MM-DDTHH:MM)".to_string()),
        FieldType::File => Some("(path to file)".to_string()),
        FieldType::Select | FieldType::Multiselect => {
            let options = field.options.as_deref().unwrap_or_default();
            if options.is_empty() {
                return None;
            }
            let choices = options
                .iter()
                .enumerate()
                .map(|(index, option)| format!("{}={}", index + 1, option.label))
                .collect::<Vec<_>>()
                .join(", ");
            if field.kind == FieldType::Multiselect {
                Some(format!("(comma-separated: {})", choices))
            } else {
                Some(format!("({})", choices))
            }
        }
        FieldType::String | FieldType::Textarea | FieldType::Password => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn district() -> FormField {
        FormField::new("district", "District", FieldType::Select)
            .with_options([("north", "North"), ("south", "South")])
    }

    #[test]
    fn boolean_accepts_yes() {
        let field = FormField::new("agree", "Agree", FieldType::Boolean);
        assert_eq!(parse_input(&field, "yes").unwrap(), Some(FieldValue::Bool(true)));
        assert!(parse_input(&field, "maybe").is_err());
    }

    #[test]
    fn select_resolves_value_label_or_position() {
        let field = district();
        assert_eq!(parse_input(&field, "north").unwrap(), Some("north".into()));
        assert_eq!(parse_input(&field, "SOUTH").unwrap(), Some("south".into()));
        assert_eq!(parse_input(&field, "2").unwrap(), Some("south".into()));
        assert!(parse_input(&field, "3").is_err());
    }

    #[test]
    fn multiselect_splits_on_commas() {
        let field = FormField::new("areas", "Areas", FieldType::Multiselect)
            .with_options([("north", "North"), ("south", "South")]);
        assert_eq!(
            parse_input(&field, "1, south").unwrap(),
            Some(FieldValue::List(vec!["north".into(), "south".into()]))
        );
    }

    #[test]
    fn blank_keeps_and_dash_clears() {
        let field = FormField::new("name", "Name", FieldType::String);
        assert_eq!(parse_input(&field, "   ").unwrap(), None);
        assert_eq!(parse_input(&field, "-").unwrap(), Some(FieldValue::Empty));
    }

    #[test]
    fn numbers_stay_raw_for_validation() {
        let field = FormField::new("count", "Count", FieldType::Integer);
        assert_eq!(parse_input(&field, " 12 ").unwrap(), Some("12".into()));
        assert_eq!(parse_input(&field, "abc").unwrap(), Some("abc".into()));
    }

    #[test]
    fn missing_file_is_rejected() {
        let field = FormField::new("doc", "Document", FieldType::File);
        assert!(parse_input(&field, "/definitely/not/here.pdf").is_err());
    }
}
