//! Structured output types for machine-readable CLI responses.
//!
//! When `--format json` is specified, commands emit these types as JSON
//! instead of human-readable text.

use copybook_core::{Diagnostic, LayoutEntry, Severity};
use serde::Serialize;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse a format name; anything other than `json` is text.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }

    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A single diagnostic message.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub severity: DiagnosticSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl From<&Diagnostic> for DiagnosticEntry {
    fn from(d: &Diagnostic) -> Self {
        Self {
            severity: match d.severity {
                Severity::Error => DiagnosticSeverity::Error,
                Severity::Warning => DiagnosticSeverity::Warning,
            },
            code: Some(d.code.clone()),
            message: d.message.clone(),
            field: d.field.clone(),
            line: d.line,
        }
    }
}

/// Record-level summary shared by every command.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub records: usize,
    pub fields: usize,
    pub record_size: u64,
    pub fixed_size: bool,
}

/// Output from the layout command.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutOutput {
    pub status: String,
    pub file: String,
    pub summary: RecordSummary,
    pub entries: Vec<LayoutEntry>,
    pub diagnostics: Vec<DiagnosticEntry>,
}

/// Output from the check command.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    pub status: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RecordSummary>,
    pub diagnostics: Vec<DiagnosticEntry>,
}

/// Print a value as pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize JSON: {}", e),
    }
}
