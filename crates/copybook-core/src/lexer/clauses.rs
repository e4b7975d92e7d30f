//! Clause lexer.
//!
//! Converts one tokenized statement into a [`CopybookLine`]: a level, a
//! name and a map of recognized clause keywords to their parameters.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CopybookError;
use crate::lexer::tokenizer::RawStatement;
use crate::Result;

/// Clause keywords that affect the record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyword {
    /// PIC / PICTURE.
    Pic,
    /// REDEFINES.
    Redefines,
    /// OCCURS.
    Occurs,
    /// TO (upper bound of a variable OCCURS).
    To,
    /// DEPENDING ON.
    DependingOn,
    /// COMP / COMP-4 / COMP-5 / BINARY.
    Comp,
    /// COMP-1 (single precision float).
    Comp1,
    /// COMP-2 (double precision float).
    Comp2,
    /// COMP-3 / PACKED-DECIMAL.
    Comp3,
    /// SYNC / SYNCHRONIZED.
    Sync,
    /// LEADING or TRAILING sign.
    Sign,
    /// SEPARATE sign character.
    Separate,
}

impl Keyword {
    /// Map a source token to a keyword, if it is one.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "PIC" | "PICTURE" => Some(Keyword::Pic),
            "REDEFINES" => Some(Keyword::Redefines),
            "OCCURS" => Some(Keyword::Occurs),
            "TO" => Some(Keyword::To),
            "DEPENDING" => Some(Keyword::DependingOn),
            "COMP" | "COMPUTATIONAL" | "COMP-4" | "COMPUTATIONAL-4" | "COMP-5"
            | "COMPUTATIONAL-5" | "BINARY" => Some(Keyword::Comp),
            "COMP-1" | "COMPUTATIONAL-1" => Some(Keyword::Comp1),
            "COMP-2" | "COMPUTATIONAL-2" => Some(Keyword::Comp2),
            "COMP-3" | "COMPUTATIONAL-3" | "PACKED-DECIMAL" => Some(Keyword::Comp3),
            "SYNC" | "SYNCHRONIZED" => Some(Keyword::Sync),
            "LEADING" | "TRAILING" => Some(Keyword::Sign),
            "SEPARATE" => Some(Keyword::Separate),
            _ => None,
        }
    }

    /// Whether a token in name position actually begins a clause,
    /// meaning the statement has no explicit name.
    pub fn starts_clause(token: &str) -> bool {
        if Keyword::from_token(token).is_some_and(|kw| kw != Keyword::To) {
            return true;
        }
        matches!(
            token.to_ascii_uppercase().as_str(),
            "USAGE" | "VALUE" | "VALUES" | "SIGN" | "DISPLAY" | "JUST" | "JUSTIFIED" | "BLANK"
        )
    }

    /// Whether the keyword consumes the following token as its parameter.
    fn takes_parameter(self) -> bool {
        matches!(
            self,
            Keyword::Pic | Keyword::Redefines | Keyword::Occurs | Keyword::To | Keyword::DependingOn
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Keyword::Pic => "PIC",
            Keyword::Redefines => "REDEFINES",
            Keyword::Occurs => "OCCURS",
            Keyword::To => "TO",
            Keyword::DependingOn => "DEPENDING ON",
            Keyword::Comp => "COMP",
            Keyword::Comp1 => "COMP-1",
            Keyword::Comp2 => "COMP-2",
            Keyword::Comp3 => "COMP-3",
            Keyword::Sync => "SYNC",
            Keyword::Sign => "SIGN",
            Keyword::Separate => "SEPARATE",
        };
        f.write_str(text)
    }
}

/// One lexed copybook statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopybookLine {
    /// Level number.
    pub level: u32,
    /// Field name as written.
    pub name: String,
    /// 1-based source line of the statement.
    pub line: usize,
    /// Recognized clauses; parameterless keywords map to an empty string.
    pub modifiers: BTreeMap<Keyword, String>,
}

impl CopybookLine {
    /// Parameter of a clause, if present.
    pub fn modifier(&self, keyword: Keyword) -> Option<&str> {
        self.modifiers.get(&keyword).map(String::as_str)
    }

    /// Whether the clause is present.
    pub fn has(&self, keyword: Keyword) -> bool {
        self.modifiers.contains_key(&keyword)
    }
}

/// Lex a single statement.
pub fn lex_statement(stmt: &RawStatement, max_field_length: usize) -> Result<CopybookLine> {
    let level_token = stmt.tokens.first().map(String::as_str).unwrap_or("");
    let level = level_token
        .parse::<u32>()
        .map_err(|_| CopybookError::InvalidLevel {
            token: level_token.to_string(),
            line: stmt.line,
        })?;
    let name = stmt.tokens.get(1).cloned().unwrap_or_default();

    let missing = |keyword: Keyword| CopybookError::MissingParameter {
        keyword: keyword.to_string(),
        field: name.clone(),
        line: stmt.line,
    };

    let tokens = &stmt.tokens;
    let mut modifiers = BTreeMap::new();
    let mut i = 2;
    while i < tokens.len() {
        let Some(keyword) = Keyword::from_token(&tokens[i]) else {
            i += 1;
            continue;
        };

        if !keyword.takes_parameter() {
            let param = if keyword == Keyword::Sign {
                tokens[i].to_ascii_uppercase()
            } else {
                String::new()
            };
            modifiers.insert(keyword, param);
            i += 1;
            continue;
        }

        let mut next = i + 1;
        match keyword {
            Keyword::Pic => {
                if tokens.get(next).is_some_and(|t| t.eq_ignore_ascii_case("IS")) {
                    next += 1;
                }
            }
            Keyword::DependingOn => {
                match tokens.get(next) {
                    Some(t) if t.eq_ignore_ascii_case("ON") => next += 1,
                    Some(_) => {
                        return Err(CopybookError::MissingOn {
                            field: name.clone(),
                            line: stmt.line,
                        })
                    }
                    None => return Err(missing(keyword)),
                }
            }
            _ => {}
        }

        let param = tokens.get(next).ok_or_else(|| missing(keyword))?;
        let value = match keyword {
            Keyword::Pic => expand_picture(param, max_field_length).map_err(|err| {
                err.at(&name, stmt.line)
            })?,
            Keyword::Occurs | Keyword::To => {
                param.parse::<u32>().map_err(|_| CopybookError::InvalidNumber {
                    keyword: keyword.to_string(),
                    value: param.clone(),
                    field: name.clone(),
                    line: stmt.line,
                })?;
                param.clone()
            }
            _ => param.clone(),
        };
        modifiers.insert(keyword, value);
        i = next + 1;
    }

    Ok(CopybookLine {
        level,
        name,
        line: stmt.line,
        modifiers,
    })
}

/// Failure while expanding a picture, before the field context is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureError {
    /// Repetition count outside `[1, max]`.
    OutOfRange { picture: String, count: u64, max: usize },
    /// Unbalanced parentheses or a non-numeric count.
    Malformed { picture: String },
}

impl PictureError {
    fn at(self, field: &str, line: usize) -> CopybookError {
        match self {
            PictureError::OutOfRange {
                picture,
                count,
                max,
            } => CopybookError::RepetitionOutOfRange {
                picture,
                count,
                max,
                field: field.to_string(),
                line,
            },
            PictureError::Malformed { picture } => CopybookError::MalformedPicture {
                picture,
                field: field.to_string(),
                line,
            },
        }
    }
}

/// Expand repetition counts in a picture string and upper-case it.
///
/// ```
/// use copybook_core::lexer::expand_picture;
///
/// assert_eq!(expand_picture("9(5)V9(2)", 100).unwrap(), "99999V99");
/// assert_eq!(expand_picture("s9(3)", 100).unwrap(), "S999");
/// ```
pub fn expand_picture(picture: &str, max: usize) -> std::result::Result<String, PictureError> {
    let upper = picture.to_ascii_uppercase();
    let malformed = || PictureError::Malformed {
        picture: upper.clone(),
    };

    let mut out = String::with_capacity(upper.len());
    let mut chars = upper.chars().peekable();
    let mut last: Option<char> = None;

    while let Some(ch) = chars.next() {
        match ch {
            '(' => {
                let repeated = last.ok_or_else(malformed)?;
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        _ => return Err(malformed()),
                    }
                }
                if digits.is_empty() {
                    return Err(malformed());
                }
                // A count too long for u64 is reported as the largest value.
                let count = digits.parse::<u64>().unwrap_or(u64::MAX);
                if count < 1 || count > max as u64 {
                    return Err(PictureError::OutOfRange {
                        picture: upper.clone(),
                        count,
                        max,
                    });
                }
                // The symbol before '(' has already been emitted once.
                for _ in 1..count {
                    out.push(repeated);
                }
                last = None;
            }
            ')' => return Err(malformed()),
            _ => {
                out.push(ch);
                last = Some(ch);
            }
        }
    }

    Ok(out)
}
