//! Field tree construction from lexed statements.
//!
//! Statements are first placed in an arena where each node knows its
//! parent by index. The index links are only used to find the insertion
//! point for the next statement; once a block is complete the arena is
//! folded into an owned [`Group`] tree and the links disappear.

use crate::ast::{BinaryProperties, Field, Group, Occurs, Statement};
use crate::error::CopybookError;
use crate::lexer::{CopybookLine, Keyword};
use crate::options::Encoding;
use crate::parser::picture::{decode_picture, is_elementary};
use crate::Result;

#[derive(Debug)]
struct PendingNode {
    line: CopybookLine,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Build one root group per record block.
pub fn build_trees(lines: Vec<CopybookLine>, encoding: Encoding) -> Result<Vec<Group>> {
    let Some(min_level) = lines.iter().map(|l| l.level).min() else {
        return Ok(Vec::new());
    };

    let roots: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.level == min_level)
        .map(|(i, _)| i)
        .collect();

    if roots[0] > 0 {
        let orphan = &lines[0];
        return Err(CopybookError::UnattachableLevel {
            level: orphan.level,
            field: orphan.name.clone(),
            line: orphan.line,
        });
    }

    let mut blocks: Vec<Vec<CopybookLine>> = Vec::with_capacity(roots.len());
    let mut lines = lines;
    for &start in roots.iter().rev() {
        blocks.push(lines.split_off(start));
    }
    blocks.reverse();

    blocks
        .into_iter()
        .map(|block| build_block(block, encoding))
        .collect()
}

/// Build the tree of a single record block; `block[0]` is the root.
fn build_block(block: Vec<CopybookLine>, encoding: Encoding) -> Result<Group> {
    let root_line = block.first().map_or(0, |l| l.line);
    let mut arena: Vec<PendingNode> = Vec::with_capacity(block.len());
    let mut current = 0usize;

    for line in block {
        if arena.is_empty() {
            if is_elementary(&line) {
                return Err(CopybookError::ElementaryRoot {
                    field: line.name,
                    line: line.line,
                });
            }
            arena.push(PendingNode {
                line,
                parent: None,
                children: Vec::new(),
            });
            continue;
        }

        let mut cursor = Some(current);
        while let Some(idx) = cursor {
            if arena[idx].line.level < line.level {
                break;
            }
            cursor = arena[idx].parent;
        }
        let Some(parent) = cursor else {
            return Err(CopybookError::UnattachableLevel {
                level: line.level,
                field: line.name,
                line: line.line,
            });
        };
        if is_elementary(&arena[parent].line) {
            return Err(CopybookError::ChildOfElementary {
                field: line.name,
                parent: arena[parent].line.name.clone(),
                line: line.line,
            });
        }

        let idx = arena.len();
        arena.push(PendingNode {
            line,
            parent: Some(parent),
            children: Vec::new(),
        });
        arena[parent].children.push(idx);
        current = idx;
    }

    let mut slots: Vec<Option<PendingNode>> = arena.into_iter().map(Some).collect();
    match assemble(&mut slots, 0, encoding)? {
        Field::Group(group) => Ok(group),
        Field::Statement(stmt) => Err(CopybookError::ElementaryRoot {
            field: stmt.name,
            line: root_line,
        }),
    }
}

/// Fold arena node `idx` and its descendants into an owned field.
fn assemble(slots: &mut [Option<PendingNode>], idx: usize, encoding: Encoding) -> Result<Field> {
    let Some(node) = slots[idx].take() else {
        unreachable!("arena node {idx} assembled twice");
    };
    let line = node.line;
    let occurs = occurs_of(&line)?;
    let redefines = line.modifier(Keyword::Redefines).map(str::to_string);
    let depending_on = line.modifier(Keyword::DependingOn).map(str::to_string);

    if is_elementary(&line) {
        let data_type = decode_picture(&line, encoding)?;
        return Ok(Field::Statement(Statement {
            level: line.level,
            name: line.name,
            redefines,
            is_redefined: false,
            occurs,
            depending_on,
            is_dependee: false,
            binary: BinaryProperties::default(),
            data_type,
        }));
    }

    let children = node
        .children
        .into_iter()
        .map(|child| assemble(slots, child, encoding))
        .collect::<Result<Vec<_>>>()?;

    Ok(Field::Group(Group {
        level: line.level,
        name: line.name,
        redefines,
        is_redefined: false,
        occurs,
        depending_on,
        is_dependee: false,
        binary: BinaryProperties::default(),
        children,
    }))
}

/// Read the OCCURS clause; the lexer has already validated the numbers.
fn occurs_of(line: &CopybookLine) -> Result<Option<Occurs>> {
    let number = |keyword: Keyword| -> Result<Option<u32>> {
        line.modifier(keyword)
            .map(|value| {
                value.parse::<u32>().map_err(|_| CopybookError::InvalidNumber {
                    keyword: keyword.to_string(),
                    value: value.to_string(),
                    field: line.name.clone(),
                    line: line.line,
                })
            })
            .transpose()
    };

    match (number(Keyword::Occurs)?, number(Keyword::To)?) {
        (None, _) => Ok(None),
        (Some(n), None) => Ok(Some(Occurs::Fixed(n))),
        (Some(min), Some(max)) if min > max => Err(CopybookError::InvalidOccursRange {
            field: line.name.clone(),
            min,
            max,
            line: line.line,
        }),
        (Some(min), Some(max)) => Ok(Some(Occurs::Range { min, max })),
    }
}
