//! Command implementations for the CLI interface.
//!
//! Each subcommand loads a task record from a JSON file, seeds a form session
//! with it, drives the session the way an interactive form would, and prints
//! what a form would show.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use taskform::config::Config;
use taskform::error::TransportError;
use taskform::fields::{FieldKind, FieldName, FieldValue};
use taskform::session::{FormEvent, FormSession, SubmitOutcome, Transport};
use taskform::task::{TaskRecord, TaskUpdatePayload};

use crate::cli::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Load a task, apply edits and print the validation report.
    Check {
        /// Task record JSON file.
        record: PathBuf,
        /// Edit a field: FIELD=VALUE. May be repeated.
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,
        /// Show every error, as after a submit attempt.
        #[arg(long)]
        all: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load a task, apply edits and print the update payload if valid.
    Submit {
        /// Task record JSON file.
        record: PathBuf,
        /// Edit a field: FIELD=VALUE. May be repeated.
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,
        /// Write the payload to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Replay a JSON list of form events against a task.
    Replay {
        /// Task record JSON file.
        record: PathBuf,
        /// Events JSON file, e.g. [{"type": "change", "field": "title", "value": "Deploy"}].
        events: PathBuf,
    },

    /// List available task templates.
    Templates,

    /// List the validation rules in evaluation order.
    Rules,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Writes payloads as pretty JSON to stdout or a file.
pub struct JsonTransport {
    output: Option<PathBuf>,
}

impl JsonTransport {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }
}

impl Transport for JsonTransport {
    fn send(&mut self, payload: &TaskUpdatePayload) -> Result<(), TransportError> {
        let data = serde_json::to_string_pretty(payload).map_err(|e| TransportError(e.to_string()))?;
        let result = match &self.output {
            Some(path) => File::create(path).and_then(|mut f| {
                f.write_all(data.as_bytes())?;
                f.write_all(b"\n")
            }),
            None => writeln!(io::stdout(), "{data}"),
        };
        result.map_err(|e| TransportError(e.to_string()))
    }
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

/// Read a task record, failing the process as a load failure.
pub fn load_record(path: &Path) -> TaskRecord {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => fail(format!("Failed to read task record {}: {e}", path.display())),
    };
    match serde_json::from_str(&text) {
        Ok(record) => record,
        Err(e) => fail(format!("Failed to parse task record {}: {e}", path.display())),
    }
}

/// Create a session and feed it the record.
fn open_session(config: &Config, record_path: &Path) -> FormSession {
    let record = load_record(record_path);
    let mut session = FormSession::new(config.schema.clone(), config.templates.clone());
    if let Err(e) = session.receive_record(&record) {
        fail(format!("Failed to load task {}: {e}", record.id));
    }
    session
}

/// Parse a `FIELD=VALUE` edit.
pub fn parse_set(raw: &str) -> Result<(FieldName, FieldValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected FIELD=VALUE, got '{raw}'"))?;
    let field: FieldName = name.trim().parse().map_err(|e| format!("{e}"))?;
    let value = if field.kind() == FieldKind::Text {
        FieldValue::Text(value.to_string())
    } else {
        FieldValue::parse(field, value).map_err(|e| e.to_string())?
    };
    Ok((field, value))
}

fn apply_sets(session: &mut FormSession, sets: &[String]) {
    for raw in sets {
        let (field, value) = parse_set(raw).unwrap_or_else(|e| fail(e));
        if let Err(e) = session.set_value(field, value) {
            fail(format!("Cannot set {field}: {e}"));
        }
        if let Err(e) = session.blur(field) {
            fail(format!("Cannot leave {field}: {e}"));
        }
    }
}

/// Render a field's value the way a form would display it.
fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) if s.is_empty() => "-".into(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Choice(v) => v.clone().unwrap_or_else(|| "-".into()),
        FieldValue::Choices(v) if v.is_empty() => "-".into(),
        FieldValue::Choices(v) => v.join(","),
        FieldValue::Date(d) => d.map(|d| d.format("%Y/%m/%d").to_string()).unwrap_or_else(|| "-".into()),
    }
}

/// Print one row per field with its value and any visible error.
pub fn print_form(session: &FormSession, show_all: bool) {
    println!("{:<16} {:<3} {:<24} {}", "Field", "Req", "Value", "Error");
    let values = session.values();
    for field in FieldName::ALL {
        let required = if session.schema().is_required(field, values) { "*" } else { "" };
        let error = if show_all {
            session.report().joined(field)
        } else {
            session.visible_error(field)
        };
        println!(
            "{:<16} {:<3} {:<24} {}",
            field.label(),
            required,
            display_value(&values.get(field)),
            error.unwrap_or_default()
        );
    }
}

/// Handle `check`.
pub fn cmd_check(config: &Config, record: PathBuf, sets: Vec<String>, all: bool, json: bool) {
    let mut session = open_session(config, &record);
    apply_sets(&mut session, &sets);
    if json {
        match serde_json::to_string_pretty(session.report()) {
            Ok(data) => println!("{data}"),
            Err(e) => fail(format!("Failed to encode report: {e}")),
        }
    } else {
        print_form(&session, all);
    }
    if !session.report().is_valid() {
        std::process::exit(2);
    }
}

/// Handle `submit`.
pub fn cmd_submit(config: &Config, record: PathBuf, sets: Vec<String>, output: Option<PathBuf>) {
    let mut session = open_session(config, &record);
    apply_sets(&mut session, &sets);
    let mut transport = JsonTransport::new(output.clone());
    match session.submit(&mut transport) {
        Ok(SubmitOutcome::Sent(_)) => {
            if let Some(path) = output {
                eprintln!("Payload written to {}", path.display());
            }
        }
        Ok(SubmitOutcome::Rejected(_)) => {
            eprintln!("Submit rejected:");
            print_form(&session, false);
            std::process::exit(2);
        }
        Ok(SubmitOutcome::Failed(e)) => fail(e),
        Err(e) => fail(format!("Submit failed: {e}")),
    }
}

/// Handle `replay`.
pub fn cmd_replay(config: &Config, record: PathBuf, events: PathBuf) {
    let mut session = open_session(config, &record);
    let text = fs::read_to_string(&events)
        .unwrap_or_else(|e| fail(format!("Failed to read events {}: {e}", events.display())));
    let events: Vec<FormEvent> = serde_json::from_str(&text)
        .unwrap_or_else(|e| fail(format!("Failed to parse events: {e}")));

    let mut transport = JsonTransport::new(None);
    for (i, event) in events.into_iter().enumerate() {
        match session.dispatch(event, &mut transport) {
            Ok(Some(SubmitOutcome::Rejected(report))) => {
                let fields: Vec<&str> = report.invalid_fields().map(FieldName::as_str).collect();
                println!("#{i}: submit rejected ({})", fields.join(", "));
            }
            Ok(Some(SubmitOutcome::Failed(e))) => println!("#{i}: {e}"),
            Ok(Some(SubmitOutcome::Sent(_))) => println!("#{i}: submitted"),
            Ok(None) => {}
            Err(e) => fail(format!("Event #{i}: {e}")),
        }
    }

    println!();
    println!("Phase: {:?}", session.phase());
    if let Some(id) = session.selected_template() {
        println!("Template: {id}");
    }
    let changed: Vec<&str> = session.touch().changed_fields().map(FieldName::as_str).collect();
    println!("Changed: {}", if changed.is_empty() { "-".to_string() } else { changed.join(", ") });
    println!("Confirm before leaving: {}", if session.needs_unload_confirmation() { "yes" } else { "no" });
    println!();
    print_form(&session, false);
}

/// Handle `templates`.
pub fn cmd_templates(config: &Config) {
    println!("{:<5} {:<16} {}", "ID", "Title", "Description");
    for t in &config.templates {
        println!("{:<5} {:<16} {}", t.id, t.title, t.description);
    }
}

/// Handle `rules`.
pub fn cmd_rules(config: &Config) {
    println!("{:<32} {:<16} {}", "Rule", "Attached to", "Reads");
    for rule in config.schema.rules() {
        let reads: Vec<&str> = rule.reads.iter().map(|f| f.as_str()).collect();
        println!("{:<32} {:<16} {}", rule.name, rule.attach.as_str(), reads.join(", "));
    }
}

/// Handle `completions`.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "taskform", &mut io::stdout());
}
