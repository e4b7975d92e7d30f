//! Check command - compile a copybook and report errors and warnings.

use std::path::PathBuf;

use copybook_core::{CompilerOptions, Diagnostic};
use miette::Result;

use super::{compile, read_source, summarize};
use crate::output::{print_json, CheckOutput, DiagnosticEntry, OutputFormat};

/// Run the check command.
pub fn run(input: PathBuf, options: CompilerOptions, format: OutputFormat) -> Result<()> {
    let source = read_source(&input)?;
    let file = input.display().to_string();

    tracing::info!("Checking {}", file);

    let mut diagnostics = Vec::new();
    let result = compile(&source, options, &mut diagnostics);
    let mut entries: Vec<DiagnosticEntry> = diagnostics.iter().map(DiagnosticEntry::from).collect();

    match result {
        Ok(copybook) => {
            let summary = summarize(&copybook);
            if format.is_json() {
                print_json(&CheckOutput {
                    status: "ok".to_string(),
                    file,
                    summary: Some(summary),
                    diagnostics: entries,
                });
            } else {
                for diagnostic in &diagnostics {
                    println!("{diagnostic}");
                }
                println!(
                    "OK {}: {} record(s), {} field(s), record size {} bytes ({})",
                    file,
                    summary.records,
                    summary.fields,
                    summary.record_size,
                    if summary.fixed_size { "fixed" } else { "variable" }
                );
            }
            Ok(())
        }
        Err(err) => {
            tracing::debug!(category = ?err.category(), "compilation failed");
            if format.is_json() {
                entries.push(DiagnosticEntry::from(&Diagnostic::from(&err)));
                print_json(&CheckOutput {
                    status: "error".to_string(),
                    file: file.clone(),
                    summary: None,
                    diagnostics: entries,
                });
                return Err(miette::miette!("Check failed for {}", file));
            }
            Err(miette::Report::new(err).wrap_err(format!("Check failed for {}", file)))
        }
    }
}
