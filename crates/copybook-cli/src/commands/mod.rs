//! CLI command implementations.

pub mod check;
pub mod layout;

use std::path::Path;

use copybook_core::{Compiler, CompilerOptions, Copybook, CopybookError, Diagnostic};
use miette::{IntoDiagnostic, Result, WrapErr};

use crate::output::RecordSummary;

/// Read a copybook source file.
fn read_source(input: &Path) -> Result<String> {
    std::fs::read_to_string(input)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read copybook: {}", input.display()))
}

/// Compile `source`, collecting warnings instead of logging them.
fn compile(
    source: &str,
    options: CompilerOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> std::result::Result<Copybook, CopybookError> {
    Compiler::new(options).with_sink(diagnostics).compile(source)
}

fn summarize(copybook: &Copybook) -> RecordSummary {
    RecordSummary {
        records: copybook.roots().len(),
        fields: copybook.layout_entries().len(),
        record_size: copybook.record_size_bytes(),
        fixed_size: copybook.is_record_fixed_size(),
    }
}
