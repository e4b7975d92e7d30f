//! Copybook source lines and the fixed/free column conventions.

use crate::options::SourceFormat;

/// Column indicator values in fixed format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Normal code line (space or no indicator).
    Normal,
    /// Comment line ('*' or '/').
    Comment,
    /// Continuation line ('-').
    Continuation,
    /// Debug line ('D' or 'd').
    Debug,
}

impl Indicator {
    /// Parse an indicator character.
    pub fn from_char(ch: char) -> Self {
        match ch {
            '*' | '/' => Indicator::Comment,
            '-' => Indicator::Continuation,
            'D' | 'd' => Indicator::Debug,
            _ => Indicator::Normal,
        }
    }
}

/// A processed line of copybook source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// The original line number (1-indexed).
    pub line_number: usize,
    /// The indicator character.
    pub indicator: Indicator,
    /// The code content with sequence and identification areas removed.
    pub content: String,
}

impl SourceLine {
    /// Check if this line carries no code.
    pub fn is_comment(&self) -> bool {
        self.indicator == Indicator::Comment
    }
}

/// Split source text into processed lines.
pub fn parse_lines(text: &str, format: SourceFormat) -> Vec<SourceLine> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let (indicator, content) = match format {
                SourceFormat::Fixed => parse_fixed_line(line),
                SourceFormat::Free => parse_free_line(line),
            };
            SourceLine {
                line_number: idx + 1,
                indicator,
                content,
            }
        })
        .collect()
}

/// Parse a fixed-format line.
///
/// - Columns 1-6: sequence number area (ignored)
/// - Column 7: indicator area
/// - Columns 8-72: code
/// - Columns 73-80: identification area (ignored)
fn parse_fixed_line(line: &str) -> (Indicator, String) {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() < 7 {
        return (Indicator::Normal, String::new());
    }

    let indicator = Indicator::from_char(chars[6]);
    let code_end = chars.len().min(72);
    let content: String = if code_end > 7 {
        chars[7..code_end].iter().collect()
    } else {
        String::new()
    };

    (indicator, content)
}

/// Parse a free-format line: `*` or `*>` at the start comments out the
/// whole line, a later `*>` starts an inline comment.
fn parse_free_line(line: &str) -> (Indicator, String) {
    let trimmed = line.trim_start();
    if trimmed.starts_with('*') {
        return (Indicator::Comment, String::new());
    }

    let content = match find_inline_comment(line) {
        Some(pos) => &line[..pos],
        None => line,
    };
    (Indicator::Normal, content.to_string())
}

/// Byte position of a `*>` that is not inside a quoted literal.
fn find_inline_comment(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let bytes = line.as_bytes();
    for (i, ch) in line.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '*' && bytes.get(i + 1) == Some(&b'>') => return Some(i),
            None => {}
        }
    }
    None
}
