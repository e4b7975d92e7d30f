//! Elementary field data types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::options::Encoding;

/// Storage representation selected by a COMP/BINARY usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comp {
    /// COMP-1 (single precision float).
    Single,
    /// COMP-2 (double precision float).
    Double,
    /// COMP-3 / PACKED-DECIMAL.
    Packed,
    /// COMP / COMP-4 / COMP-5 / BINARY.
    Binary,
}

impl Comp {
    /// The width number used in the source (`COMP-1`, `COMP-2`, `COMP-3`, `COMP-4`).
    pub fn width(self) -> u8 {
        match self {
            Comp::Single => 1,
            Comp::Double => 2,
            Comp::Packed => 3,
            Comp::Binary => 4,
        }
    }

    /// Storage size in bytes for a number of `precision` digits.
    pub fn storage_bytes(self, precision: u32) -> u32 {
        match self {
            Comp::Single => 4,
            Comp::Double => 8,
            // Two digits per byte, the sign takes the last half byte.
            Comp::Packed => precision / 2 + 1,
            Comp::Binary => {
                if precision <= 4 {
                    2 // Halfword
                } else if precision <= 9 {
                    4 // Fullword
                } else {
                    8 // Doubleword
                }
            }
        }
    }
}

/// Where the sign of a numeric field is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignPosition {
    /// Leading sign.
    Left,
    /// Trailing sign.
    Right,
}

/// Word alignment requested by SYNCHRONIZED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// SYNCHRONIZED LEFT.
    Left,
    /// SYNCHRONIZED RIGHT.
    Right,
}

/// Decoded type of an elementary field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CobolType {
    /// PIC X / PIC A.
    AlphaNumeric {
        length: u32,
        alignment: Option<Alignment>,
        encoding: Encoding,
    },
    /// Numeric with an implied (`V`) or explicit (`.`) decimal point.
    Decimal {
        scale: u32,
        precision: u32,
        explicit_decimal_point: bool,
        sign_position: Option<SignPosition>,
        sign_separate: bool,
        alignment: Option<Alignment>,
        comp: Option<Comp>,
        encoding: Encoding,
    },
    /// Integral numeric.
    Integer {
        precision: u32,
        sign_position: Option<SignPosition>,
        sign_separate: bool,
        alignment: Option<Alignment>,
        comp: Option<Comp>,
        encoding: Encoding,
    },
}

impl CobolType {
    /// Size of one occurrence in bytes.
    pub fn storage_bytes(&self) -> u32 {
        match *self {
            CobolType::AlphaNumeric { length, .. } => length,
            CobolType::Decimal {
                precision,
                explicit_decimal_point,
                sign_separate,
                comp,
                ..
            } => match comp {
                Some(comp) => comp.storage_bytes(precision),
                None => precision + u32::from(explicit_decimal_point) + u32::from(sign_separate),
            },
            CobolType::Integer {
                precision,
                sign_separate,
                comp,
                ..
            } => match comp {
                Some(comp) => comp.storage_bytes(precision),
                None => precision + u32::from(sign_separate),
            },
        }
    }

    /// Size of one occurrence in bits.
    pub fn data_size_bits(&self) -> u64 {
        u64::from(self.storage_bytes()) * 8
    }

    /// Whether this is an integral type.
    pub fn is_integer(&self) -> bool {
        matches!(self, CobolType::Integer { .. })
    }

    /// Whether the value carries a sign.
    pub fn is_signed(&self) -> bool {
        match self {
            CobolType::AlphaNumeric { .. } => false,
            CobolType::Decimal { sign_position, .. } | CobolType::Integer { sign_position, .. } => {
                sign_position.is_some()
            }
        }
    }

    /// The encoding tag.
    pub fn encoding(&self) -> Encoding {
        match self {
            CobolType::AlphaNumeric { encoding, .. }
            | CobolType::Decimal { encoding, .. }
            | CobolType::Integer { encoding, .. } => *encoding,
        }
    }

    /// The storage representation, `None` for display.
    pub fn comp(&self) -> Option<Comp> {
        match self {
            CobolType::AlphaNumeric { .. } => None,
            CobolType::Decimal { comp, .. } | CobolType::Integer { comp, .. } => *comp,
        }
    }
}

impl fmt::Display for CobolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CobolType::AlphaNumeric { length, .. } => write!(f, "alphanumeric({length})"),
            CobolType::Decimal {
                precision, scale, ..
            } => write!(f, "decimal({precision},{scale})"),
            CobolType::Integer { precision, .. } => write!(f, "integer({precision})"),
        }?;
        match self.comp() {
            Some(comp) => write!(f, " comp-{}", comp.width()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer(precision: u32, comp: Option<Comp>) -> CobolType {
        CobolType::Integer {
            precision,
            sign_position: None,
            sign_separate: false,
            alignment: None,
            comp,
            encoding: Encoding::Ebcdic,
        }
    }

    fn decimal(precision: u32, scale: u32, explicit: bool, comp: Option<Comp>) -> CobolType {
        CobolType::Decimal {
            scale,
            precision,
            explicit_decimal_point: explicit,
            sign_position: Some(SignPosition::Left),
            sign_separate: false,
            alignment: None,
            comp,
            encoding: Encoding::Ebcdic,
        }
    }

    #[test]
    fn test_display_sizes() {
        assert_eq!(integer(5, None).storage_bytes(), 5);
        assert_eq!(decimal(7, 2, false, None).storage_bytes(), 7);
        // The literal decimal point occupies a byte.
        assert_eq!(decimal(5, 2, true, None).storage_bytes(), 6);
    }

    #[test]
    fn test_packed_sizes() {
        assert_eq!(integer(1, Some(Comp::Packed)).storage_bytes(), 1);
        assert_eq!(integer(5, Some(Comp::Packed)).storage_bytes(), 3);
        assert_eq!(integer(6, Some(Comp::Packed)).storage_bytes(), 4);
        assert_eq!(decimal(7, 2, false, Some(Comp::Packed)).storage_bytes(), 4);
        assert_eq!(integer(18, Some(Comp::Packed)).storage_bytes(), 10);
    }

    #[test]
    fn test_binary_sizes() {
        assert_eq!(integer(1, Some(Comp::Binary)).storage_bytes(), 2);
        assert_eq!(integer(4, Some(Comp::Binary)).storage_bytes(), 2);
        assert_eq!(integer(5, Some(Comp::Binary)).storage_bytes(), 4);
        assert_eq!(integer(9, Some(Comp::Binary)).storage_bytes(), 4);
        assert_eq!(integer(10, Some(Comp::Binary)).storage_bytes(), 8);
        assert_eq!(integer(18, Some(Comp::Binary)).storage_bytes(), 8);
    }

    #[test]
    fn test_float_sizes() {
        assert_eq!(decimal(0, 0, false, Some(Comp::Single)).data_size_bits(), 32);
        assert_eq!(decimal(0, 0, false, Some(Comp::Double)).data_size_bits(), 64);
    }

    #[test]
    fn test_sign_separate_adds_byte() {
        let t = CobolType::Integer {
            precision: 3,
            sign_position: Some(SignPosition::Right),
            sign_separate: true,
            alignment: None,
            comp: None,
            encoding: Encoding::Ascii,
        };
        assert_eq!(t.storage_bytes(), 4);
        assert!(t.is_signed());
        assert_eq!(t.encoding(), Encoding::Ascii);
    }

    #[test]
    fn test_display() {
        assert_eq!(integer(4, Some(Comp::Binary)).to_string(), "integer(4) comp-4");
        assert_eq!(decimal(7, 2, false, None).to_string(), "decimal(7,2)");
    }
}
