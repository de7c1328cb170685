mod catalog;
mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_form::{render_json_ui, render_text};
use form_spec::{
    ErrorCode, FieldErrors, FormController, FormSchema, FormValues, MessageCatalog,
    SubmitDecision, SubmitOutcome, build_render_payload, form_schema_json_schema,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wizard::{FillPresenter, PrintHandler, Verbosity, parse_input};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "SILA_FORMS_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "SILA service form tooling",
    long_about = "Checks form schema catalogs, validates and renders service forms, and fills them in from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check form schema files or catalog directories.
    Check {
        /// Schema files or directories to scan.
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
        /// Glob applied to file names inside directories (repeatable, defaults to *.json).
        #[arg(long, value_name = "GLOB")]
        include: Vec<String>,
    },
    /// Validate a values file against a form schema.
    Validate {
        /// Path to the FormSchema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Path to the values JSON file.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        /// JSON file overriding validation message templates.
        #[arg(long, value_name = "MESSAGES")]
        messages: Option<PathBuf>,
    },
    /// Render a form with optional values.
    Render {
        /// Path to the FormSchema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing current values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// Form-level error banner to display.
        #[arg(long)]
        error: Option<String>,
        /// Render as if a submission were in flight.
        #[arg(long)]
        loading: bool,
    },
    /// Fill in a form interactively and print the submitted values.
    Fill {
        /// Path to the FormSchema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing initial values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// JSON file overriding validation message templates.
        #[arg(long, value_name = "MESSAGES")]
        messages: Option<PathBuf>,
        /// Show visible fields and help text.
        #[arg(long)]
        verbose: bool,
        /// Pretty-print the submitted values.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the JSON Schema of the form schema format.
    JsonSchema,
}

fn main() -> CliResult<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Check { paths, include } => run_check(paths, include),
        Command::Validate {
            schema,
            values,
            messages,
        } => run_validate(schema, values, messages),
        Command::Render {
            schema,
            values,
            format,
            error,
            loading,
        } => run_render(schema, values, format, error, loading),
        Command::Fill {
            schema,
            values,
            messages,
            verbose,
            pretty,
        } => run_fill(schema, values, messages, verbose, pretty),
        Command::JsonSchema => {
            println!("{}", serde_json::to_string_pretty(&form_schema_json_schema())?);
            Ok(())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_schema(path: &PathBuf) -> CliResult<(String, FormSchema)> {
    let contents = fs::read_to_string(path)?;
    let schema = FormSchema::from_json(&contents)?;
    Ok((contents, schema))
}

fn load_values(path: Option<&PathBuf>) -> CliResult<FormValues> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        }
        None => Ok(FormValues::new()),
    }
}

fn load_message_overrides(path: Option<&PathBuf>) -> CliResult<BTreeMap<ErrorCode, String>> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        }
        None => Ok(BTreeMap::new()),
    }
}

fn load_messages(path: Option<&PathBuf>) -> CliResult<MessageCatalog> {
    let overrides = load_message_overrides(path)?;
    Ok(MessageCatalog::with_overrides(&overrides)?)
}

fn run_check(paths: Vec<PathBuf>, include: Vec<String>) -> CliResult<()> {
    let include = catalog::build_globset(&include)?;
    let entries = catalog::scan(&paths, &include)?;
    if entries.is_empty() {
        return Err("no form schemas found".into());
    }

    let mut failures = 0;
    for entry in &entries {
        match &entry.outcome {
            Ok((schema, report)) => {
                println!(
                    "ok    {} ({}, {} fields)",
                    entry.path.display(),
                    schema.title,
                    schema.fields.len()
                );
                for warning in &report.warnings {
                    println!("  warning: {}", warning);
                }
            }
            Err(err) => {
                failures += 1;
                println!("error {}: {}", entry.path.display(), err);
            }
        }
    }

    for (service_id, owners) in catalog::duplicate_service_ids(&entries) {
        failures += 1;
        let owners = owners
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("error service id '{}' is used by {}", service_id, owners);
    }

    println!("Checked {} schema(s), {} problem(s)", entries.len(), failures);
    if failures == 0 {
        Ok(())
    } else {
        Err("catalog check failed".into())
    }
}

fn run_validate(
    schema_path: PathBuf,
    values_path: PathBuf,
    messages_path: Option<PathBuf>,
) -> CliResult<()> {
    let (_, schema) = load_schema(&schema_path)?;
    let values = load_values(Some(&values_path))?;
    let messages = load_messages(messages_path.as_ref())?;
    let mut controller = FormController::new(schema, values)?.with_messages(messages);

    match controller.request_submit() {
        SubmitDecision::Proceed(_) => {
            controller.complete_submission();
            println!("Validation result: valid");
            Ok(())
        }
        SubmitDecision::Rejected(errors) => {
            println!("Validation result: invalid");
            describe_errors(controller.schema(), &errors);
            Err("validation failed".into())
        }
        SubmitDecision::Blocked => Err("form is busy".into()),
    }
}

fn describe_errors(schema: &FormSchema, errors: &FieldErrors) {
    println!("Errors:");
    for field in &schema.fields {
        if let Some(error) = errors.get(&field.name) {
            println!("  {} - {} ({})", field.name, error.message, error.code);
        }
    }
}

fn run_render(
    schema_path: PathBuf,
    values_path: Option<PathBuf>,
    format: RenderMode,
    error: Option<String>,
    loading: bool,
) -> CliResult<()> {
    let (schema_json, _) = load_schema(&schema_path)?;
    let values = load_values(values_path.as_ref())?;
    let config_json = json!({ "form_schema_json": schema_json }).to_string();
    let ctx_json = json!({ "error": error, "loading": loading }).to_string();
    let values_json = serde_json::to_string(&values)?;

    match format {
        RenderMode::Text => {
            let output = render_text(&config_json, &ctx_json, &values_json);
            check_component_error(&output)?;
            println!("{}", output);
        }
        RenderMode::Json => {
            let output = render_json_ui(&config_json, &ctx_json, &values_json);
            check_component_error(&output)?;
            let value: Value = serde_json::from_str(&output)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn check_component_error(response: &str) -> CliResult<()> {
    if let Ok(value) = serde_json::from_str::<Value>(response)
        && let Some(error) = value.get("error").and_then(Value::as_str)
    {
        return Err(error.into());
    }
    Ok(())
}

fn run_fill(
    schema_path: PathBuf,
    values_path: Option<PathBuf>,
    messages_path: Option<PathBuf>,
    verbose: bool,
    pretty: bool,
) -> CliResult<()> {
    let (_, schema) = load_schema(&schema_path)?;
    let values = load_values(values_path.as_ref())?;
    let messages = load_messages(messages_path.as_ref())?;
    let mut controller = FormController::new(schema, values)?.with_messages(messages);
    let mut presenter = FillPresenter::new(Verbosity::from_verbose(verbose));
    let mut handler = PrintHandler { pretty };

    presenter.show_header(&build_render_payload(&controller));
    let mut pending: Vec<String> = controller
        .schema()
        .field_names()
        .map(str::to_string)
        .collect();

    loop {
        for name in &pending {
            if !controller.visibility().get(name).copied().unwrap_or(false) {
                continue;
            }
            prompt_field(&mut controller, name, &presenter)?;
        }

        match controller.submit(&mut handler)? {
            SubmitOutcome::Submitted => return Ok(()),
            SubmitOutcome::Rejected(errors) => {
                presenter.show_errors(controller.schema(), &errors);
                pending = controller
                    .schema()
                    .field_names()
                    .filter(|name| errors.contains_key(*name))
                    .map(str::to_string)
                    .collect();
            }
            SubmitOutcome::Blocked => return Err("form is busy".into()),
        }
    }
}

fn prompt_field(
    controller: &mut FormController,
    name: &str,
    presenter: &FillPresenter,
) -> CliResult<()> {
    let field = controller
        .schema()
        .field(name)
        .cloned()
        .ok_or_else(|| format!("field '{}' not found", name))?;
    loop {
        presenter.show_prompt(&field, controller.values().get(name));
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input closed before the form was complete".into());
        }
        if input.trim().eq_ignore_ascii_case("exit") {
            return Err("fill aborted by user".into());
        }

        match parse_input(&field, &input) {
            Ok(Some(value)) => {
                controller.set_value(name, value)?;
                return Ok(());
            }
            Ok(None) => return Ok(()),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}
