//! Non-fatal diagnostics and the sinks that receive them.
//!
//! Compilation never logs through a global facility on its own: warnings are
//! handed to a [`DiagnosticSink`] supplied by the caller. [`TracingSink`] is
//! the default and forwards everything to `tracing`.

use std::fmt;

use crate::error::CopybookError;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error; compilation cannot succeed.
    Error,
    /// Warning; compilation continues but the copybook looks suspicious.
    Warning,
}

/// A diagnostic message produced while compiling a copybook.
///
/// # Example
///
/// ```
/// use copybook_core::{Diagnostic, Severity};
///
/// let d = Diagnostic::warning("W001", "DEPENDING ON 'CNT' matches 2 fields")
///     .with_field("CNT")
///     .with_suggestion("the first match is used");
///
/// assert_eq!(d.severity, Severity::Warning);
/// assert_eq!(d.field.as_deref(), Some("CNT"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Diagnostic code (e.g. "W001").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Field the diagnostic is about, if any.
    pub field: Option<String>,
    /// 1-based source line, if known.
    pub line: Option<usize>,
    /// Optional suggestion for how to fix the issue.
    pub suggestion: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            field: None,
            line: None,
            suggestion: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Attach the field name this diagnostic refers to.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach the source line.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add a suggestion to this diagnostic.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Returns `true` if this diagnostic is a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

impl From<&CopybookError> for Diagnostic {
    fn from(err: &CopybookError) -> Self {
        let code = miette::Diagnostic::code(err)
            .map(|c| c.to_string())
            .unwrap_or_default();
        let mut diagnostic = Diagnostic::error(code, err.to_string());
        if let Some(field) = err.field() {
            diagnostic = diagnostic.with_field(field);
        }
        if let Some(line) = err.line() {
            diagnostic = diagnostic.with_line(line);
        }
        diagnostic
    }
}

/// Receiver for diagnostics emitted during compilation.
pub trait DiagnosticSink {
    /// Accept one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Sink that forwards diagnostics to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let field = diagnostic.field.as_deref().unwrap_or("");
        match diagnostic.severity {
            Severity::Error => tracing::error!(code = %diagnostic.code, field, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(code = %diagnostic.code, field, "{}", diagnostic.message),
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<F> DiagnosticSink for F
where
    F: FnMut(Diagnostic),
{
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::warning("W001", "duplicate match");
        assert_eq!(format!("{}", d), "warning[W001]: duplicate match");
    }

    #[test]
    fn test_diagnostic_display_with_suggestion() {
        let d = Diagnostic::warning("W001", "duplicate match")
            .with_suggestion("using REC.CNT");
        assert_eq!(
            format!("{}", d),
            "warning[W001]: duplicate match (using REC.CNT)"
        );
    }

    #[test]
    fn test_from_compile_error() {
        let err = CopybookError::MissingOn {
            field: "ITEMS".to_string(),
            line: 12,
        };
        let d = Diagnostic::from(&err);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.code, "copybook::lexical::missing_on");
        assert_eq!(d.field.as_deref(), Some("ITEMS"));
        assert_eq!(d.line, Some(12));
        assert!(d.message.starts_with("line 12:"));
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(Diagnostic::warning("W001", "a").with_line(4));
        sink.report(Diagnostic::error("E001", "b"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].line, Some(4));
        assert!(sink[0].is_warning());
        assert!(!sink[1].is_warning());
    }

    #[test]
    fn test_closure_sink() {
        let mut count = 0;
        {
            let mut sink = |_d: Diagnostic| count += 1;
            sink.report(Diagnostic::warning("W001", "x"));
            sink.report(Diagnostic::warning("W001", "y"));
        }
        assert_eq!(count, 2);
    }
}
