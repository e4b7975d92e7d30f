//! The compiled field tree.
//!
//! A copybook compiles to a list of root [`Group`]s. Every node is a
//! [`Field`]: either a [`Group`] owning its children or an elementary
//! [`Statement`] with a decoded [`CobolType`]. Ownership is strictly
//! top-down; there are no parent pointers in the finished tree.

mod types;

pub use types::{Alignment, CobolType, Comp, SignPosition};

use serde::{Deserialize, Serialize};

/// Binary placement of a field, all values in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinaryProperties {
    /// Offset from the start of the record.
    pub offset: u64,
    /// Size of a single occurrence.
    pub data_size: u64,
    /// Size including all occurrences and any redefinition widening.
    pub actual_size: u64,
}

/// OCCURS clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurs {
    /// `OCCURS n TIMES`.
    Fixed(u32),
    /// `OCCURS min TO max TIMES`.
    Range { min: u32, max: u32 },
}

impl Occurs {
    /// The number of occurrences storage is reserved for.
    pub fn max_count(self) -> u32 {
        match self {
            Occurs::Fixed(n) => n,
            Occurs::Range { max, .. } => max,
        }
    }
}

/// A group item: a container of subordinate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub level: u32,
    pub name: String,
    pub redefines: Option<String>,
    pub is_redefined: bool,
    pub occurs: Option<Occurs>,
    pub depending_on: Option<String>,
    pub is_dependee: bool,
    pub binary: BinaryProperties,
    pub children: Vec<Field>,
}

/// An elementary item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub level: u32,
    pub name: String,
    pub redefines: Option<String>,
    pub is_redefined: bool,
    pub occurs: Option<Occurs>,
    pub depending_on: Option<String>,
    pub is_dependee: bool,
    pub binary: BinaryProperties,
    pub data_type: CobolType,
}

/// A node of the field tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Field {
    Group(Group),
    Statement(Statement),
}

impl Group {
    /// Find a direct child by case-insensitive name.
    pub fn child(&self, name: &str) -> Option<&Field> {
        self.children
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

impl Field {
    /// Field name.
    pub fn name(&self) -> &str {
        match self {
            Field::Group(g) => &g.name,
            Field::Statement(s) => &s.name,
        }
    }

    /// Level number.
    pub fn level(&self) -> u32 {
        match self {
            Field::Group(g) => g.level,
            Field::Statement(s) => s.level,
        }
    }

    /// Name of the sibling this field overlays.
    pub fn redefines(&self) -> Option<&str> {
        match self {
            Field::Group(g) => g.redefines.as_deref(),
            Field::Statement(s) => s.redefines.as_deref(),
        }
    }

    /// Whether a later sibling redefines this field.
    pub fn is_redefined(&self) -> bool {
        match self {
            Field::Group(g) => g.is_redefined,
            Field::Statement(s) => s.is_redefined,
        }
    }

    /// OCCURS clause.
    pub fn occurs(&self) -> Option<Occurs> {
        match self {
            Field::Group(g) => g.occurs,
            Field::Statement(s) => s.occurs,
        }
    }

    /// Number of occurrences used for sizing (1 without OCCURS).
    pub fn occurs_count(&self) -> u32 {
        self.occurs().map_or(1, Occurs::max_count)
    }

    /// Counter field named by `DEPENDING ON`.
    pub fn depending_on(&self) -> Option<&str> {
        match self {
            Field::Group(g) => g.depending_on.as_deref(),
            Field::Statement(s) => s.depending_on.as_deref(),
        }
    }

    /// Whether another field's OCCURS depends on this one.
    pub fn is_dependee(&self) -> bool {
        match self {
            Field::Group(g) => g.is_dependee,
            Field::Statement(s) => s.is_dependee,
        }
    }

    /// Binary placement.
    pub fn binary(&self) -> &BinaryProperties {
        match self {
            Field::Group(g) => &g.binary,
            Field::Statement(s) => &s.binary,
        }
    }

    pub(crate) fn binary_mut(&mut self) -> &mut BinaryProperties {
        match self {
            Field::Group(g) => &mut g.binary,
            Field::Statement(s) => &mut s.binary,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            Field::Group(g) => g.name = name,
            Field::Statement(s) => s.name = name,
        }
    }

    pub(crate) fn set_redefined(&mut self, redefined: bool) {
        match self {
            Field::Group(g) => g.is_redefined = redefined,
            Field::Statement(s) => s.is_redefined = redefined,
        }
    }

    pub(crate) fn set_redefines(&mut self, target: Option<String>) {
        match self {
            Field::Group(g) => g.redefines = target,
            Field::Statement(s) => s.redefines = target,
        }
    }

    /// Subordinate fields; empty for elementary items.
    pub fn children(&self) -> &[Field] {
        match self {
            Field::Group(g) => &g.children,
            Field::Statement(_) => &[],
        }
    }

    /// Whether this is a group item.
    pub fn is_group(&self) -> bool {
        matches!(self, Field::Group(_))
    }

    /// The group, if this is one.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Field::Group(g) => Some(g),
            Field::Statement(_) => None,
        }
    }

    /// The elementary item, if this is one.
    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Field::Group(_) => None,
            Field::Statement(s) => Some(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Encoding;

    fn leaf(name: &str) -> Field {
        Field::Statement(Statement {
            level: 5,
            name: name.to_string(),
            redefines: None,
            is_redefined: false,
            occurs: Some(Occurs::Range { min: 1, max: 4 }),
            depending_on: Some("CNT".to_string()),
            is_dependee: false,
            binary: BinaryProperties::default(),
            data_type: CobolType::AlphaNumeric {
                length: 1,
                alignment: None,
                encoding: Encoding::Ebcdic,
            },
        })
    }

    #[test]
    fn test_occurs_counts() {
        assert_eq!(Occurs::Fixed(3).max_count(), 3);
        assert_eq!(Occurs::Range { min: 1, max: 5 }.max_count(), 5);
    }

    #[test]
    fn test_field_accessors() {
        let f = leaf("ITEMS");
        assert_eq!(f.name(), "ITEMS");
        assert_eq!(f.level(), 5);
        assert_eq!(f.occurs_count(), 4);
        assert_eq!(f.depending_on(), Some("CNT"));
        assert!(!f.is_group());
        assert!(f.children().is_empty());
        assert!(f.as_statement().is_some());
    }

    #[test]
    fn test_group_child_lookup() {
        let g = Group {
            level: 1,
            name: "REC".to_string(),
            redefines: None,
            is_redefined: false,
            occurs: None,
            depending_on: None,
            is_dependee: false,
            binary: BinaryProperties::default(),
            children: vec![leaf("Items")],
        };
        assert!(g.child("ITEMS").is_some());
        assert!(g.child("OTHER").is_none());
    }

    #[test]
    fn test_field_serde_tag() {
        let json = serde_json::to_value(leaf("A")).unwrap();
        assert_eq!(json["kind"], "statement");
        assert_eq!(json["data_type"]["type"], "alphanumeric");
    }
}
