//! PIC clause decoding.
//!
//! Classifies an expanded picture string, together with the usage and
//! sign/sync modifiers of the statement, into a [`CobolType`].

use crate::ast::{Alignment, CobolType, Comp, SignPosition};
use crate::error::CopybookError;
use crate::lexer::{CopybookLine, Keyword};
use crate::options::Encoding;
use crate::Result;

/// Storage representation selected by the statement's usage clauses.
pub fn comp_variant(line: &CopybookLine) -> Option<Comp> {
    if line.has(Keyword::Comp1) {
        Some(Comp::Single)
    } else if line.has(Keyword::Comp2) {
        Some(Comp::Double)
    } else if line.has(Keyword::Comp3) {
        Some(Comp::Packed)
    } else if line.has(Keyword::Comp) {
        Some(Comp::Binary)
    } else {
        None
    }
}

/// Whether a lexed statement describes an elementary item.
pub fn is_elementary(line: &CopybookLine) -> bool {
    line.has(Keyword::Pic)
        || line.has(Keyword::Comp1)
        || line.has(Keyword::Comp2)
        || line.has(Keyword::Comp3)
}

/// Decode the data type of an elementary statement.
pub fn decode_picture(line: &CopybookLine, encoding: Encoding) -> Result<CobolType> {
    let comp = comp_variant(line);
    let sync = line.has(Keyword::Sync);
    let pic = line.modifier(Keyword::Pic).unwrap_or("");

    let unrecognized = || CopybookError::UnrecognizedPicture {
        picture: pic.to_string(),
        field: line.name.clone(),
        line: line.line,
    };

    if pic.is_empty() {
        // COMP-1/COMP-2 items take their width from the usage alone.
        return match comp {
            Some(comp @ (Comp::Single | Comp::Double)) => Ok(CobolType::Decimal {
                scale: 0,
                precision: 0,
                explicit_decimal_point: false,
                sign_position: Some(SignPosition::Left),
                sign_separate: false,
                alignment: sync.then_some(Alignment::Right),
                comp: Some(comp),
                encoding,
            }),
            _ => Err(unrecognized()),
        };
    }

    if pic.contains('X') || pic.contains('A') {
        return Ok(CobolType::AlphaNumeric {
            length: pic.chars().count() as u32,
            alignment: sync.then_some(Alignment::Left),
            encoding,
        });
    }

    let signed = pic.starts_with('S');
    let digits = pic.strip_prefix('S').unwrap_or(pic);
    let (sign_position, sign_separate) = sign_of(line, signed);
    let alignment = sync.then_some(Alignment::Right);

    if pic.contains('V') || pic.contains('.') {
        let (integral, fractional) = decimal_length(digits).ok_or_else(unrecognized)?;
        return Ok(CobolType::Decimal {
            scale: fractional,
            precision: integral + fractional,
            explicit_decimal_point: digits.contains('.'),
            sign_position,
            sign_separate,
            alignment,
            comp,
            encoding,
        });
    }

    if pic.contains('9') {
        if !digits.chars().all(|c| c == '9') {
            return Err(unrecognized());
        }
        return Ok(CobolType::Integer {
            precision: digits.len() as u32,
            sign_position,
            sign_separate,
            alignment,
            comp,
            encoding,
        });
    }

    Err(unrecognized())
}

/// Split a decimal picture on its `V` or `.` marker and count the digits
/// on each side.
///
/// Returns `None` unless the picture is `9*[V.]9*` with at least one digit.
///
/// ```
/// use copybook_core::parser::decimal_length;
///
/// assert_eq!(decimal_length("99999V99"), Some((5, 2)));
/// assert_eq!(decimal_length("999.9"), Some((3, 1)));
/// assert_eq!(decimal_length("9V9V9"), None);
/// ```
pub fn decimal_length(picture: &str) -> Option<(u32, u32)> {
    let mut parts = picture.splitn(2, ['V', '.']);
    let integral = parts.next()?;
    let fractional = parts.next()?;
    let all_nines = |s: &str| s.chars().all(|c| c == '9');
    if !all_nines(integral) || !all_nines(fractional) {
        return None;
    }
    if integral.is_empty() && fractional.is_empty() {
        return None;
    }
    Some((integral.len() as u32, fractional.len() as u32))
}

/// Resolve the sign position from a leading `S` and any SIGN clause.
fn sign_of(line: &CopybookLine, signed: bool) -> (Option<SignPosition>, bool) {
    if !signed {
        return (None, false);
    }
    let position = match line.modifier(Keyword::Sign) {
        Some("TRAILING") => SignPosition::Right,
        _ => SignPosition::Left,
    };
    (Some(position), line.has(Keyword::Separate))
}
