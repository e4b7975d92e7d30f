//! Copybook lexer.
//!
//! Source text goes through three steps here:
//! 1. [`source`] applies the fixed/free column conventions and drops comments
//! 2. [`tokenizer`] splits the code into `.`-terminated statements
//! 3. [`clauses`] turns each statement into a [`CopybookLine`]

pub mod clauses;
pub mod source;
pub mod tokenizer;

pub use clauses::{expand_picture, lex_statement, CopybookLine, Keyword, PictureError};
pub use source::{parse_lines, Indicator, SourceLine};
pub use tokenizer::{tokenize, RawStatement, FILLER};

use crate::options::CompilerOptions;
use crate::Result;

/// Tokenize and lex a whole copybook.
pub fn lex(text: &str, options: &CompilerOptions) -> Result<Vec<CopybookLine>> {
    let statements = tokenize(text, options.source_format);
    tracing::debug!(statements = statements.len(), "tokenized copybook");
    statements
        .iter()
        .map(|stmt| lex_statement(stmt, options.max_field_length))
        .collect()
}
