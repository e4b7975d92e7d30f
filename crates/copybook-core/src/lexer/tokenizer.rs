//! Statement tokenizer.
//!
//! Turns copybook text into one token array per `.`-terminated statement.
//! Comment lines and the sequence/identification columns are dropped,
//! quoted literals stay in one token, and separator commas/semicolons are
//! treated as whitespace.

use crate::lexer::clauses::Keyword;
use crate::lexer::source::{parse_lines, Indicator};
use crate::options::SourceFormat;

/// Name used for anonymous fields.
pub const FILLER: &str = "FILLER";

/// Level numbers that never take part in the record layout:
/// 66 (RENAMES alias), 77 (independent working storage item) and 88
/// (condition names).
const SKIPPED_LEVELS: [u32; 3] = [66, 77, 88];

/// One copybook statement as a token array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    /// 1-based line on which the statement starts.
    pub line: usize,
    /// Tokens; the first two are always the level and the name.
    pub tokens: Vec<String>,
}

/// Split copybook text into statements.
pub fn tokenize(text: &str, format: SourceFormat) -> Vec<RawStatement> {
    let mut scanner = Scanner::default();

    for line in parse_lines(text, format) {
        if line.is_comment() {
            continue;
        }
        let chars: Vec<char> = line.content.chars().collect();
        let mut start = 0;
        if line.indicator == Indicator::Continuation {
            if let Some(q) = scanner.quote {
                // A continued literal resumes after its opening quote.
                start = chars
                    .iter()
                    .position(|&c| c == q)
                    .map(|p| p + 1)
                    .unwrap_or(chars.len());
            }
        } else if scanner.quote.is_some() {
            scanner.quote = None;
            scanner.finish_token();
        }
        scanner.scan_line(&chars[start..], line.line_number);
    }
    scanner.quote = None;
    scanner.finish_statement();

    scanner
        .statements
        .into_iter()
        .filter(|stmt| !is_skipped_level(&stmt.tokens[0]))
        .map(insert_implicit_filler)
        .collect()
}

fn is_skipped_level(token: &str) -> bool {
    token
        .parse::<u32>()
        .map(|level| SKIPPED_LEVELS.contains(&level))
        .unwrap_or(false)
}

/// `05 PIC X(3).` declares an anonymous field; give it the filler name.
fn insert_implicit_filler(mut stmt: RawStatement) -> RawStatement {
    let missing = match stmt.tokens.get(1) {
        None => true,
        Some(token) => Keyword::starts_clause(token),
    };
    if missing {
        stmt.tokens.insert(1, FILLER.to_string());
    }
    stmt
}

#[derive(Debug, Default)]
struct Scanner {
    statements: Vec<RawStatement>,
    tokens: Vec<String>,
    current: String,
    quote: Option<char>,
    start_line: usize,
}

impl Scanner {
    fn scan_line(&mut self, chars: &[char], line_number: usize) {
        for (i, &ch) in chars.iter().enumerate() {
            let next_is_break = chars.get(i + 1).map_or(true, |c| c.is_whitespace());

            if let Some(q) = self.quote {
                self.current.push(ch);
                if ch == q {
                    self.quote = None;
                }
                continue;
            }

            match ch {
                c if c.is_whitespace() => self.finish_token(),
                ',' | ';' if next_is_break => self.finish_token(),
                '.' if next_is_break => {
                    self.finish_token();
                    self.finish_statement();
                }
                '\'' | '"' => {
                    self.begin_token(line_number);
                    self.current.push(ch);
                    self.quote = Some(ch);
                }
                _ => {
                    self.begin_token(line_number);
                    self.current.push(ch);
                }
            }
        }
        if self.quote.is_none() {
            self.finish_token();
        }
    }

    fn begin_token(&mut self, line_number: usize) {
        if self.tokens.is_empty() && self.current.is_empty() {
            self.start_line = line_number;
        }
    }

    fn finish_token(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(std::mem::take(&mut self.current));
        }
    }

    fn finish_statement(&mut self) {
        self.finish_token();
        if !self.tokens.is_empty() {
            self.statements.push(RawStatement {
                line: self.start_line,
                tokens: std::mem::take(&mut self.tokens),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(text: &str) -> Vec<RawStatement> {
        tokenize(text, SourceFormat::Free)
    }

    #[test]
    fn test_split_statements() {
        let stmts = free("01 REC.\n   05 A PIC 9(3).\n   05 B PIC X(2).");
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].tokens, vec!["01", "REC"]);
        assert_eq!(stmts[1].tokens, vec!["05", "A", "PIC", "9(3)"]);
        assert_eq!(stmts[2].line, 3);
    }

    #[test]
    fn test_statement_spans_lines() {
        let stmts = free("01 REC.\n 05 ITEMS\n    OCCURS 1 TO 5\n    DEPENDING ON CNT\n    PIC X.");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1].line, 2);
        assert_eq!(
            stmts[1].tokens,
            vec!["05", "ITEMS", "OCCURS", "1", "TO", "5", "DEPENDING", "ON", "CNT", "PIC", "X"]
        );
    }

    #[test]
    fn test_explicit_decimal_point_is_not_terminator() {
        let stmts = free("05 AMT PIC 9(3).99.");
        assert_eq!(stmts[0].tokens, vec!["05", "AMT", "PIC", "9(3).99"]);
    }

    #[test]
    fn test_quoted_literal_kept_whole() {
        let stmts = free("05 A PIC X(5) VALUE 'A. B'.");
        assert_eq!(stmts[0].tokens.last().map(String::as_str), Some("'A. B'"));
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_separator_commas() {
        let stmts = free("05 T OCCURS 3, INDEXED BY I, J PIC X.");
        assert!(stmts[0].tokens.contains(&"I".to_string()));
        assert!(!stmts[0].tokens.iter().any(|t| t.contains(',')));
    }

    #[test]
    fn test_condition_and_rename_levels_skipped() {
        let stmts = free(
            "01 REC.\n 05 FLAG PIC X.\n 88 IS-ON VALUE 'Y'.\n 66 ALIAS RENAMES FLAG.\n 05 B PIC X.",
        );
        let names: Vec<&str> = stmts.iter().map(|s| s.tokens[1].as_str()).collect();
        assert_eq!(names, vec!["REC", "FLAG", "B"]);
    }

    #[test]
    fn test_independent_items_skipped() {
        let stmts = free("01 R.\n 05 A PIC X.\n 77 W PIC 9.\n 05 B PIC X.");
        let names: Vec<&str> = stmts.iter().map(|s| s.tokens[1].as_str()).collect();
        assert_eq!(names, vec!["R", "A", "B"]);
    }

    #[test]
    fn test_implicit_filler() {
        let stmts = free("05 PIC X(3).\n05 REDEFINES A PIC X.");
        assert_eq!(stmts[0].tokens, vec!["05", "FILLER", "PIC", "X(3)"]);
        assert_eq!(stmts[1].tokens[1], "FILLER");
    }

    #[test]
    fn test_fixed_format_stream() {
        let text = [
            "000100 01  REC.",
            "000200*    A COMMENT WITH A PERIOD. 05 X PIC X.",
            "000300     05  A   PIC X(2).",
        ]
        .join("\n");
        let stmts = tokenize(&text, SourceFormat::Fixed);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1].tokens, vec!["05", "A", "PIC", "X(2)"]);
        assert_eq!(stmts[1].line, 3);
    }

    #[test]
    fn test_continued_literal() {
        let text = [
            format!("{:<72}", "000100     05 A PIC X(20) VALUE 'ABCDEFGH"),
            "000200-    'IJK'.".to_string(),
        ]
        .join("\n");
        let stmts = tokenize(&text, SourceFormat::Fixed);
        assert_eq!(stmts.len(), 1);
        let literal = stmts[0].tokens.last().unwrap();
        assert!(literal.starts_with("'ABCDEFGH"));
        assert!(literal.ends_with("IJK'"));
    }

    #[test]
    fn test_unterminated_last_statement_kept() {
        let stmts = free("01 REC.\n 05 A PIC X");
        assert_eq!(stmts.len(), 2);
    }
}
