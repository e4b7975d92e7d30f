//! COBOL copybook compiler.
//!
//! This crate turns COBOL copybook text into an immutable record schema:
//! a tree of groups and elementary fields where every node carries its
//! decoded data type and its bit-exact offset and size inside the record.
//! The schema is what a record decoder needs to pull typed values out of
//! a raw mainframe record buffer.
//!
//! # Pipeline
//!
//! - Tokenizer: fixed/free column handling, comments, `.`-terminated statements
//! - Lexer: level, name and clause keywords, PIC repetition expansion
//! - Tree builder: level numbers into nested groups
//! - PIC decoder: alphanumeric, decimal and integer types with COMP usages
//! - Layout: sizes, REDEFINES overlays and offsets
//! - Dependee marker: OCCURS DEPENDING ON counters
//! - Filler normalizer: unique FILLER names, empty groups removed
//!
//! # Example
//!
//! ```
//! use copybook_core::{CompilerOptions, Copybook, SourceFormat};
//!
//! let options = CompilerOptions::new().with_source_format(SourceFormat::Free);
//! let copybook = Copybook::parse_with_options(
//!     "01 REC. 05 A PIC 9(3). 05 B PIC X(2).",
//!     options,
//! )?;
//!
//! let b = copybook.field("REC.B").unwrap();
//! assert_eq!(b.binary().offset, 24);
//! assert_eq!(b.binary().actual_size, 16);
//! # Ok::<(), copybook_core::CopybookError>(())
//! ```

pub mod ast;
mod copybook;
pub mod diagnostic;
mod error;
pub mod lexer;
mod options;
pub mod parser;
pub mod semantic;

pub use ast::{
    Alignment, BinaryProperties, CobolType, Comp, Field, Group, Occurs, SignPosition, Statement,
};
pub use copybook::{Compiler, Copybook, LayoutEntry};
pub use diagnostic::{Diagnostic, DiagnosticSink, Severity, TracingSink};
pub use error::{CopybookError, ErrorCategory};
pub use lexer::expand_picture;
pub use options::{CompilerOptions, Encoding, SourceFormat, DEFAULT_MAX_FIELD_LENGTH};
pub use parser::decimal_length;

/// Result type for copybook compilation.
pub type Result<T> = std::result::Result<T, CopybookError>;
