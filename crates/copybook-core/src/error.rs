//! Copybook compiler error types.
//!
//! Every failure is a compile-time error over the copybook text itself.
//! There is no recovery mode: the first error aborts compilation.

use miette::Diagnostic;
use thiserror::Error;

/// Broad classification of a [`CopybookError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed clause syntax inside a single statement.
    Lexical,
    /// Statements that cannot be arranged into a valid field tree or layout.
    Structural,
    /// Cross-field references that do not resolve to a usable field.
    Semantic,
}

/// Errors produced while compiling a copybook.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CopybookError {
    /// The first token of a statement is not a level number.
    #[error("line {line}: '{token}' is not a valid level number")]
    #[diagnostic(
        code(copybook::lexical::invalid_level),
        help("every statement must start with a numeric level such as 01 or 05")
    )]
    InvalidLevel { token: String, line: usize },

    /// A clause keyword that requires a parameter ended the statement.
    #[error("line {line}: {keyword} clause of field '{field}' is missing its parameter")]
    #[diagnostic(code(copybook::lexical::missing_parameter))]
    MissingParameter {
        keyword: String,
        field: String,
        line: usize,
    },

    /// `DEPENDING` was not followed by `ON`.
    #[error("line {line}: DEPENDING in field '{field}' must be followed by ON")]
    #[diagnostic(
        code(copybook::lexical::missing_on),
        help("write OCCURS n TO m TIMES DEPENDING ON counter-field")
    )]
    MissingOn { field: String, line: usize },

    /// A PIC repetition count is outside `[1, max]`.
    #[error(
        "line {line}: repetition count {count} in PIC '{picture}' of field '{field}' \
         is outside 1..={max}"
    )]
    #[diagnostic(code(copybook::lexical::repetition_out_of_range))]
    RepetitionOutOfRange {
        picture: String,
        count: u64,
        max: usize,
        field: String,
        line: usize,
    },

    /// A PIC string with unbalanced or non-numeric repetition.
    #[error("line {line}: malformed PIC '{picture}' in field '{field}'")]
    #[diagnostic(code(copybook::lexical::malformed_picture))]
    MalformedPicture {
        picture: String,
        field: String,
        line: usize,
    },

    /// A clause parameter that must be a number is not one.
    #[error("line {line}: {keyword} value '{value}' of field '{field}' is not a number")]
    #[diagnostic(code(copybook::lexical::invalid_number))]
    InvalidNumber {
        keyword: String,
        value: String,
        field: String,
        line: usize,
    },

    /// No ancestor with a lower level number exists for this statement.
    #[error("line {line}: level {level} of field '{field}' cannot be attached to any record")]
    #[diagnostic(
        code(copybook::structural::unattachable_level),
        help("level numbers must nest under a lower-numbered record such as 01")
    )]
    UnattachableLevel {
        level: u32,
        field: String,
        line: usize,
    },

    /// A record-level statement that carries a PIC clause.
    #[error("line {line}: record '{field}' must be a group, not an elementary item")]
    #[diagnostic(code(copybook::structural::elementary_root))]
    ElementaryRoot { field: String, line: usize },

    /// A statement nested under an elementary item.
    #[error("line {line}: field '{field}' cannot be nested under elementary item '{parent}'")]
    #[diagnostic(code(copybook::structural::child_of_elementary))]
    ChildOfElementary {
        field: String,
        parent: String,
        line: usize,
    },

    /// The first field of a group carries `REDEFINES`.
    #[error("field '{field}' is the first field of group '{group}' and cannot redefine '{target}'")]
    #[diagnostic(code(copybook::structural::redefines_first_field))]
    RedefinesFirstField {
        field: String,
        target: String,
        group: String,
    },

    /// A `REDEFINES` target outside the current redefinition block.
    #[error("field '{field}' redefines '{target}', which is not part of the preceding redefinition block")]
    #[diagnostic(
        code(copybook::structural::redefines_outside_block),
        help("a REDEFINES target must be an earlier sibling with no intervening non-redefining field")
    )]
    RedefinesOutsideBlock { field: String, target: String },

    /// A PIC string that matches no supported data type.
    #[error("line {line}: unrecognized PIC '{picture}' in field '{field}'")]
    #[diagnostic(
        code(copybook::structural::unrecognized_picture),
        help("supported pictures are X/A strings, S9(n), S9(n)V9(m) and 9(n).9(m)")
    )]
    UnrecognizedPicture {
        picture: String,
        field: String,
        line: usize,
    },

    /// `OCCURS min TO max` with `min > max`.
    #[error("line {line}: OCCURS {min} TO {max} of field '{field}' has min greater than max")]
    #[diagnostic(code(copybook::structural::invalid_occurs_range))]
    InvalidOccursRange {
        field: String,
        min: u32,
        max: u32,
        line: usize,
    },

    /// A field whose size in bits does not fit in 64 bits.
    #[error("the size of field '{field}' overflows the addressable record size")]
    #[diagnostic(
        code(copybook::structural::layout_overflow),
        help("reduce the OCCURS counts or PIC lengths of this field and its children")
    )]
    LayoutOverflow { field: String },

    /// A `DEPENDING ON` name that matches no elementary field.
    #[error("field '{field}' depends on '{name}', which is not an elementary field of the copybook")]
    #[diagnostic(code(copybook::semantic::dependee_not_found))]
    DependeeNotFound { name: String, field: String },

    /// A `DEPENDING ON` name that resolves to a non-integer field.
    #[error("'{name}' is used in DEPENDING ON but its type is {data_type}, not an integer")]
    #[diagnostic(
        code(copybook::semantic::dependee_not_integer),
        help("an OCCURS DEPENDING ON counter must be declared with an integral PIC such as 9(4)")
    )]
    DependeeNotInteger { name: String, data_type: String },
}

impl CopybookError {
    /// The category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CopybookError::InvalidLevel { .. }
            | CopybookError::MissingParameter { .. }
            | CopybookError::MissingOn { .. }
            | CopybookError::RepetitionOutOfRange { .. }
            | CopybookError::MalformedPicture { .. }
            | CopybookError::InvalidNumber { .. } => ErrorCategory::Lexical,
            CopybookError::UnattachableLevel { .. }
            | CopybookError::ElementaryRoot { .. }
            | CopybookError::ChildOfElementary { .. }
            | CopybookError::RedefinesFirstField { .. }
            | CopybookError::RedefinesOutsideBlock { .. }
            | CopybookError::UnrecognizedPicture { .. }
            | CopybookError::InvalidOccursRange { .. }
            | CopybookError::LayoutOverflow { .. } => ErrorCategory::Structural,
            CopybookError::DependeeNotFound { .. } | CopybookError::DependeeNotInteger { .. } => {
                ErrorCategory::Semantic
            }
        }
    }

    /// The field the error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            CopybookError::InvalidLevel { .. } => None,
            CopybookError::DependeeNotInteger { name, .. } => Some(name),
            CopybookError::MissingParameter { field, .. }
            | CopybookError::MissingOn { field, .. }
            | CopybookError::RepetitionOutOfRange { field, .. }
            | CopybookError::MalformedPicture { field, .. }
            | CopybookError::InvalidNumber { field, .. }
            | CopybookError::UnattachableLevel { field, .. }
            | CopybookError::ElementaryRoot { field, .. }
            | CopybookError::ChildOfElementary { field, .. }
            | CopybookError::RedefinesFirstField { field, .. }
            | CopybookError::RedefinesOutsideBlock { field, .. }
            | CopybookError::UnrecognizedPicture { field, .. }
            | CopybookError::InvalidOccursRange { field, .. }
            | CopybookError::LayoutOverflow { field }
            | CopybookError::DependeeNotFound { field, .. } => Some(field),
        }
    }

    /// 1-based source line of the offending statement, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            CopybookError::InvalidLevel { line, .. }
            | CopybookError::MissingParameter { line, .. }
            | CopybookError::MissingOn { line, .. }
            | CopybookError::RepetitionOutOfRange { line, .. }
            | CopybookError::MalformedPicture { line, .. }
            | CopybookError::InvalidNumber { line, .. }
            | CopybookError::UnattachableLevel { line, .. }
            | CopybookError::ElementaryRoot { line, .. }
            | CopybookError::ChildOfElementary { line, .. }
            | CopybookError::UnrecognizedPicture { line, .. }
            | CopybookError::InvalidOccursRange { line, .. } => Some(*line),
            CopybookError::RedefinesFirstField { .. }
            | CopybookError::RedefinesOutsideBlock { .. }
            | CopybookError::LayoutOverflow { .. }
            | CopybookError::DependeeNotFound { .. }
            | CopybookError::DependeeNotInteger { .. } => None,
        }
    }
}
