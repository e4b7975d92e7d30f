//! Size and offset calculation.
//!
//! Both passes take the tree by value and return a rebuilt tree. The size
//! pass works bottom-up over each sibling list and is where REDEFINES
//! blocks are validated and widened; the offset pass then walks top-down
//! with a running cursor.
//!
//! Root records are independent layouts of the same record area. Each is
//! sized on its own and starts at offset 0, so a REDEFINES clause on a
//! root has no effect on the layout.

use std::collections::HashSet;

use crate::ast::{Field, Group};
use crate::error::CopybookError;
use crate::Result;

/// Run the size pass followed by the offset pass.
pub fn calculate_layout(roots: Vec<Group>) -> Result<Vec<Group>> {
    Ok(calculate_offsets(calculate_sizes(roots)?))
}

/// Compute `data_size` and `actual_size` for every field.
///
/// Fails with [`CopybookError::LayoutOverflow`] when a size does not fit
/// in 64 bits.
pub fn calculate_sizes(roots: Vec<Group>) -> Result<Vec<Group>> {
    let sized = roots
        .into_iter()
        .map(|root| size_field(Field::Group(root)))
        .collect::<Result<Vec<_>>>()?;
    Ok(into_groups(sized))
}

/// Assign bit offsets. Every root record starts at offset 0.
pub fn calculate_offsets(roots: Vec<Group>) -> Vec<Group> {
    into_groups(
        roots
            .into_iter()
            .map(|root| place(Field::Group(root), 0))
            .collect(),
    )
}

fn into_groups(fields: Vec<Field>) -> Vec<Group> {
    fields
        .into_iter()
        .filter_map(|f| match f {
            Field::Group(g) => Some(g),
            Field::Statement(_) => None,
        })
        .collect()
}

/// Size one field, recursing into groups.
fn size_field(field: Field) -> Result<Field> {
    let mut field = match field {
        Field::Group(mut group) => {
            let children = std::mem::take(&mut group.children);
            group.children = size_siblings(&group.name, children)?;
            group.binary.data_size = group
                .children
                .iter()
                .filter(|c| c.redefines().is_none())
                .try_fold(0u64, |total, c| total.checked_add(c.binary().actual_size))
                .ok_or_else(|| overflow(&group.name))?;
            Field::Group(group)
        }
        Field::Statement(mut stmt) => {
            stmt.binary.data_size = stmt.data_type.data_size_bits();
            Field::Statement(stmt)
        }
    };
    let count = u64::from(field.occurs_count());
    let actual_size = field
        .binary()
        .data_size
        .checked_mul(count)
        .ok_or_else(|| overflow(field.name()))?;
    field.binary_mut().actual_size = actual_size;
    Ok(field)
}

fn overflow(field: &str) -> CopybookError {
    CopybookError::LayoutOverflow {
        field: field.to_string(),
    }
}

/// Size a sibling list, validating and widening REDEFINES blocks.
fn size_siblings(parent: &str, children: Vec<Field>) -> Result<Vec<Field>> {
    let mut sized: Vec<Field> = Vec::with_capacity(children.len());
    // Indices into `sized` of the open redefinition block.
    let mut block: Vec<usize> = Vec::new();
    let mut block_names: HashSet<String> = HashSet::new();

    for child in children {
        let child = size_field(child)?;

        match child.redefines() {
            None => {
                block.clear();
                block_names.clear();
            }
            Some(target) => {
                if sized.is_empty() {
                    return Err(CopybookError::RedefinesFirstField {
                        field: child.name().to_string(),
                        target: target.to_string(),
                        group: parent.to_string(),
                    });
                }
                if !block_names.contains(&target.to_ascii_uppercase()) {
                    return Err(CopybookError::RedefinesOutsideBlock {
                        field: child.name().to_string(),
                        target: target.to_string(),
                    });
                }
                if let Some(&idx) = block
                    .iter()
                    .rev()
                    .find(|&&i| sized[i].name().eq_ignore_ascii_case(target))
                {
                    sized[idx].set_redefined(true);
                }
            }
        }

        let redefines = child.redefines().is_some();
        block_names.insert(child.name().to_ascii_uppercase());
        block.push(sized.len());
        sized.push(child);

        if redefines {
            let widest = block
                .iter()
                .map(|&i| sized[i].binary().actual_size)
                .max()
                .unwrap_or(0);
            for &i in &block {
                sized[i].binary_mut().actual_size = widest;
            }
        }
    }

    Ok(sized)
}

/// Place a field at `offset` and lay out its children from there.
fn place(mut field: Field, offset: u64) -> Field {
    field.binary_mut().offset = offset;
    if let Field::Group(group) = &mut field {
        let children = std::mem::take(&mut group.children);
        group.children = place_siblings(children, offset);
    }
    field
}

fn place_siblings(children: Vec<Field>, start: u64) -> Vec<Field> {
    let mut cursor = start;
    let mut placed: Vec<Field> = Vec::with_capacity(children.len());

    for child in children {
        let offset = match child.redefines() {
            Some(target) => placed
                .iter()
                .rev()
                .find(|f| f.name().eq_ignore_ascii_case(target))
                .map_or(cursor, |f| f.binary().offset),
            None => {
                let offset = cursor;
                cursor += child.binary().actual_size;
                offset
            }
        };
        placed.push(place(child, offset));
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::options::{CompilerOptions, SourceFormat};
    use crate::parser::build_trees;

    fn layout(text: &str) -> Result<Vec<Group>> {
        let options = CompilerOptions::new().with_source_format(SourceFormat::Free);
        calculate_layout(build_trees(lex(text, &options)?, options.encoding)?)
    }

    fn offsets(group: &Group) -> Vec<(String, u64, u64)> {
        group
            .children
            .iter()
            .map(|c| (c.name().to_string(), c.binary().offset, c.binary().actual_size))
            .collect()
    }

    #[test]
    fn test_sequential_offsets() {
        let roots = layout("01 REC. 05 A PIC 9(3). 05 B PIC X(2).").unwrap();
        assert_eq!(
            offsets(&roots[0]),
            vec![("A".to_string(), 0, 24), ("B".to_string(), 24, 16)]
        );
        assert_eq!(roots[0].binary.actual_size, 40);
    }

    #[test]
    fn test_redefines_shares_offset() {
        let roots = layout("01 REC. 05 A PIC 9(2). 05 B REDEFINES A PIC X(2). 05 C PIC X.").unwrap();
        let rec = &roots[0];
        assert_eq!(
            offsets(rec),
            vec![
                ("A".to_string(), 0, 16),
                ("B".to_string(), 0, 16),
                ("C".to_string(), 16, 8)
            ]
        );
        assert!(rec.child("A").unwrap().is_redefined());
        assert!(!rec.child("B").unwrap().is_redefined());
        assert_eq!(rec.binary.data_size, 24);
    }

    #[test]
    fn test_redefines_block_widened_to_largest() {
        let roots = layout(
            "01 REC.
               05 A PIC X(2).
               05 B REDEFINES A PIC X(6).
               05 C REDEFINES A PIC X(4).
               05 D PIC X.",
        )
        .unwrap();
        let rec = &roots[0];
        for name in ["A", "B", "C"] {
            let f = rec.child(name).unwrap();
            assert_eq!(f.binary().offset, 0, "{name}");
            assert_eq!(f.binary().actual_size, 48, "{name}");
        }
        assert_eq!(rec.child("B").unwrap().binary().data_size, 48);
        assert_eq!(rec.child("A").unwrap().binary().data_size, 16);
        assert_eq!(rec.child("D").unwrap().binary().offset, 48);
        assert_eq!(rec.binary.actual_size, 56);
    }

    #[test]
    fn test_redefines_chain_within_block() {
        // C redefines B, which itself redefines A: all in one block.
        let roots = layout(
            "01 REC. 05 A PIC X(2). 05 B REDEFINES A PIC X(3). 05 C REDEFINES B PIC X.",
        )
        .unwrap();
        let rec = &roots[0];
        assert!(rec.child("B").unwrap().is_redefined());
        assert_eq!(rec.child("C").unwrap().binary().offset, 0);
        assert_eq!(rec.binary.actual_size, 24);
    }

    #[test]
    fn test_group_redefines() {
        let roots = layout(
            "01 REC.
               05 RAW PIC X(8).
               05 PARTS REDEFINES RAW.
                  10 P1 PIC X(4).
                  10 P2 PIC X(4).
               05 TAIL PIC 9(2).",
        )
        .unwrap();
        let rec = &roots[0];
        let parts = rec.child("PARTS").unwrap();
        assert_eq!(parts.binary().offset, 0);
        assert_eq!(parts.children()[1].binary().offset, 32);
        assert_eq!(rec.child("TAIL").unwrap().binary().offset, 64);
    }

    #[test]
    fn test_occurs_sizing() {
        let roots = layout(
            "01 REC.
               05 T PIC X(4) OCCURS 3 TIMES.
               05 G OCCURS 2.
                  10 X1 PIC 9(2).
                  10 X2 PIC S9(3) COMP-3.
               05 Z PIC X.",
        )
        .unwrap();
        let rec = &roots[0];
        let t = rec.child("T").unwrap();
        assert_eq!(t.binary().data_size, 32);
        assert_eq!(t.binary().actual_size, 96);
        let g = rec.child("G").unwrap();
        assert_eq!(g.binary().data_size, 32);
        assert_eq!(g.binary().actual_size, 64);
        assert_eq!(g.binary().offset, 96);
        assert_eq!(g.children()[1].binary().offset, 112);
        assert_eq!(rec.child("Z").unwrap().binary().offset, 160);
    }

    #[test]
    fn test_nested_offsets_are_absolute() {
        let roots = layout(
            "01 REC.
               05 H PIC X(10).
               05 G.
                  10 A PIC X(3).
                  10 B PIC X(2).",
        )
        .unwrap();
        let g = roots[0].child("G").unwrap();
        assert_eq!(g.binary().offset, 80);
        assert_eq!(g.children()[0].binary().offset, 80);
        assert_eq!(g.children()[1].binary().offset, 104);
    }

    #[test]
    fn test_each_record_starts_at_zero() {
        let roots = layout("01 R1. 05 A PIC X(4). 01 R2. 05 B PIC X(8).").unwrap();
        assert_eq!(roots[0].binary.offset, 0);
        assert_eq!(roots[1].binary.offset, 0);
        assert_eq!(roots[1].children[0].binary().offset, 0);
        assert_eq!(roots[1].binary.actual_size, 64);
    }

    #[test]
    fn test_records_are_sized_independently() {
        let roots = layout("01 R1. 05 A PIC X(10). 01 R2. 05 B PIC X(6).").unwrap();
        assert_eq!(roots[0].binary.actual_size, 80);
        assert_eq!(roots[1].binary.actual_size, 48);
        assert!(!roots[0].is_redefined);
    }

    #[test]
    fn test_record_redefines_clause_has_no_layout_effect() {
        let roots = layout("01 R1. 05 A PIC X(4). 01 R2 REDEFINES R1. 05 B PIC X(8).").unwrap();
        assert!(!roots[0].is_redefined);
        assert_eq!(roots[0].binary.actual_size, 32);
        assert_eq!(roots[1].binary.offset, 0);
        assert_eq!(roots[1].binary.actual_size, 64);
        assert_eq!(roots[1].redefines.as_deref(), Some("R1"));
    }

    #[test]
    fn test_record_redefines_unknown_record_accepted() {
        assert!(layout("01 R1 REDEFINES NOWHERE. 05 A PIC X.").is_ok());
    }

    #[test]
    fn test_nested_occurs_overflow() {
        let err = layout(
            "01 R.
               05 G OCCURS 4000000000.
                  10 H OCCURS 4000000000.
                     15 I OCCURS 4000000000.
                        20 A PIC X(100000).",
        )
        .unwrap_err();
        assert!(matches!(err, CopybookError::LayoutOverflow { .. }));
    }

    #[test]
    fn test_group_sum_overflow() {
        let err = layout(
            "01 R.
               05 G1 OCCURS 4000000000. 10 H1 OCCURS 1000000. 15 A1 PIC X(250).
               05 G2 OCCURS 4000000000. 10 H2 OCCURS 1000000. 15 A2 PIC X(250).
               05 G3 OCCURS 4000000000. 10 H3 OCCURS 1000000. 15 A3 PIC X(250).",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CopybookError::LayoutOverflow { ref field } if field == "R"
        ));
    }

    #[test]
    fn test_redefines_first_field() {
        let err = layout("01 REC. 05 G. 10 A REDEFINES B PIC X.").unwrap_err();
        assert!(matches!(
            err,
            CopybookError::RedefinesFirstField { ref group, .. } if group == "G"
        ));
    }

    #[test]
    fn test_redefines_outside_block() {
        let err = layout("01 REC. 05 A PIC X. 05 B PIC X. 05 C REDEFINES A PIC X.").unwrap_err();
        assert!(matches!(
            err,
            CopybookError::RedefinesOutsideBlock { ref target, .. } if target == "A"
        ));
    }

    #[test]
    fn test_redefines_is_case_insensitive() {
        let roots = layout("01 REC. 05 Amt PIC 9(4). 05 Txt REDEFINES AMT PIC X(4).").unwrap();
        assert!(roots[0].children[0].is_redefined());
    }
}
