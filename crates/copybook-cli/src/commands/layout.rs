//! Layout command - print field offsets and sizes.

use std::path::PathBuf;

use copybook_core::CompilerOptions;
use miette::{Result, WrapErr};

use super::{compile, read_source, summarize};
use crate::output::{print_json, DiagnosticEntry, LayoutOutput, OutputFormat};

/// Run the layout command.
pub fn run(input: PathBuf, options: CompilerOptions, format: OutputFormat) -> Result<()> {
    let source = read_source(&input)?;

    tracing::info!("Compiling {}", input.display());
    tracing::debug!(
        encoding = %options.encoding,
        format = ?options.source_format,
        "compiler options"
    );

    let mut diagnostics = Vec::new();
    let copybook = compile(&source, options, &mut diagnostics)
        .map_err(miette::Report::new)
        .wrap_err_with(|| format!("Failed to compile {}", input.display()))?;

    if format.is_json() {
        print_json(&LayoutOutput {
            status: "ok".to_string(),
            file: input.display().to_string(),
            summary: summarize(&copybook),
            entries: copybook.layout_entries(),
            diagnostics: diagnostics.iter().map(DiagnosticEntry::from).collect(),
        });
        return Ok(());
    }

    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }
    print!("{}", copybook.layout_report());
    Ok(())
}
