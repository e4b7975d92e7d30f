//! Compiler options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Largest accepted PIC repetition count, e.g. `X(100000)`.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 100_000;

/// Character encoding family of the record data.
///
/// The compiler does not transcode anything; the tag is attached to every
/// decoded field so that readers know how to interpret the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// ASCII-family data.
    Ascii,
    /// EBCDIC-family data (the mainframe default).
    #[default]
    Ebcdic,
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(Encoding::Ascii),
            "ebcdic" => Ok(Encoding::Ebcdic),
            other => Err(format!("unknown encoding '{other}' (expected ascii or ebcdic)")),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Ascii => write!(f, "ascii"),
            Encoding::Ebcdic => write!(f, "ebcdic"),
        }
    }
}

/// Copybook source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Traditional fixed format (columns 1-6: sequence, 7: indicator, 8-72: code, 73-80: ignored).
    #[default]
    Fixed,
    /// Free format (no column restrictions).
    Free,
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(SourceFormat::Fixed),
            "free" => Ok(SourceFormat::Free),
            other => Err(format!("unknown source format '{other}' (expected fixed or free)")),
        }
    }
}

/// Options controlling a compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Encoding tag applied to every elementary field.
    pub encoding: Encoding,
    /// Layout of the source text.
    pub source_format: SourceFormat,
    /// Upper bound for a PIC repetition count.
    pub max_field_length: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            source_format: SourceFormat::default(),
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
        }
    }
}

impl CompilerOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encoding tag.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the source format.
    pub fn with_source_format(mut self, format: SourceFormat) -> Self {
        self.source_format = format;
        self
    }

    /// Set the maximum PIC repetition count.
    pub fn with_max_field_length(mut self, max: usize) -> Self {
        self.max_field_length = max;
        self
    }
}
