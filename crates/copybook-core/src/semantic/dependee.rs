//! OCCURS DEPENDING ON resolution.

use std::collections::BTreeSet;

use crate::ast::{Field, Group};
use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::error::CopybookError;
use crate::Result;

/// Warning code for a counter name that matches more than one field.
pub const DUPLICATE_DEPENDEE: &str = "W001";

struct LeafRef {
    name: String,
    path: String,
}

struct Reference {
    name: String,
    field: String,
}

/// Resolve every `DEPENDING ON` name to a leaf and flag it as a dependee.
///
/// Names are matched case-insensitively against every leaf in document
/// order. When a name matches several leaves the first one is used and a
/// [`DUPLICATE_DEPENDEE`] warning is reported to `sink`.
pub fn mark_dependees(roots: Vec<Group>, sink: &mut dyn DiagnosticSink) -> Result<Vec<Group>> {
    let mut leaves = Vec::new();
    let mut references = Vec::new();
    for root in &roots {
        collect(&root.children, &root.name, &mut leaves, &mut references);
    }

    let mut dependees = BTreeSet::new();
    for reference in &references {
        let mut matches = leaves
            .iter()
            .enumerate()
            .filter(|(_, leaf)| leaf.name.eq_ignore_ascii_case(&reference.name));
        let Some((first, chosen)) = matches.next() else {
            return Err(CopybookError::DependeeNotFound {
                name: reference.name.clone(),
                field: reference.field.clone(),
            });
        };
        let others: Vec<&str> = matches.map(|(_, leaf)| leaf.path.as_str()).collect();
        if !others.is_empty() {
            sink.report(
                Diagnostic::warning(
                    DUPLICATE_DEPENDEE,
                    format!(
                        "DEPENDING ON '{}' in '{}' matches {} fields",
                        reference.name,
                        reference.field,
                        others.len() + 1
                    ),
                )
                .with_field(reference.name.clone())
                .with_suggestion(format!(
                    "using {}; also matched {}",
                    chosen.path,
                    others.join(", ")
                )),
            );
        }
        dependees.insert(first);
    }

    tracing::debug!(
        references = references.len(),
        dependees = dependees.len(),
        "resolved DEPENDING ON counters"
    );

    let mut ordinal = 0usize;
    roots
        .into_iter()
        .map(|mut root| {
            let children = std::mem::take(&mut root.children);
            root.children = mark(children, &dependees, &mut ordinal)?;
            Ok(root)
        })
        .collect()
}

fn collect(
    fields: &[Field],
    parent: &str,
    leaves: &mut Vec<LeafRef>,
    references: &mut Vec<Reference>,
) {
    for field in fields {
        let path = format!("{parent}.{}", field.name());
        if let Some(name) = field.depending_on() {
            references.push(Reference {
                name: name.to_string(),
                field: field.name().to_string(),
            });
        }
        match field {
            Field::Group(group) => collect(&group.children, &path, leaves, references),
            Field::Statement(stmt) => leaves.push(LeafRef {
                name: stmt.name.clone(),
                path,
            }),
        }
    }
}

/// Second traversal: leaves are numbered in the same order as `collect`.
fn mark(fields: Vec<Field>, dependees: &BTreeSet<usize>, ordinal: &mut usize) -> Result<Vec<Field>> {
    fields
        .into_iter()
        .map(|field| match field {
            Field::Group(mut group) => {
                let children = std::mem::take(&mut group.children);
                group.children = mark(children, dependees, ordinal)?;
                Ok(Field::Group(group))
            }
            Field::Statement(mut stmt) => {
                let current = *ordinal;
                *ordinal += 1;
                if dependees.contains(&current) {
                    if !stmt.data_type.is_integer() {
                        return Err(CopybookError::DependeeNotInteger {
                            name: stmt.name,
                            data_type: stmt.data_type.to_string(),
                        });
                    }
                    stmt.is_dependee = true;
                }
                Ok(Field::Statement(stmt))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::options::{CompilerOptions, SourceFormat};
    use crate::parser::build_trees;

    fn resolve(text: &str, sink: &mut dyn DiagnosticSink) -> Result<Vec<Group>> {
        let options = CompilerOptions::new().with_source_format(SourceFormat::Free);
        mark_dependees(build_trees(lex(text, &options)?, options.encoding)?, sink)
    }

    #[test]
    fn test_marks_counter() {
        let mut diags: Vec<Diagnostic> = Vec::new();
        let roots = resolve(
            "01 REC.
               05 CNT PIC 9(2).
               05 ITEMS OCCURS 1 TO 5 DEPENDING ON cnt PIC X(1).",
            &mut diags,
        )
        .unwrap();
        assert!(roots[0].child("CNT").unwrap().is_dependee());
        assert!(!roots[0].child("ITEMS").unwrap().is_dependee());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_counter_in_nested_group() {
        let mut diags: Vec<Diagnostic> = Vec::new();
        let roots = resolve(
            "01 REC.
               05 HDR.
                  10 N PIC S9(4) COMP.
               05 ROWS OCCURS 0 TO 10 DEPENDING ON N.
                  10 V PIC X(3).",
            &mut diags,
        )
        .unwrap();
        let hdr = roots[0].child("HDR").unwrap();
        assert!(hdr.children()[0].is_dependee());
    }

    #[test]
    fn test_alphanumeric_counter_rejected() {
        let mut diags: Vec<Diagnostic> = Vec::new();
        let err = resolve(
            "01 REC.
               05 CNT PIC X(2).
               05 ITEMS OCCURS 1 TO 5 DEPENDING ON CNT PIC X(1).",
            &mut diags,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CopybookError::DependeeNotInteger { ref name, .. } if name == "CNT"
        ));
    }

    #[test]
    fn test_decimal_counter_rejected() {
        let mut diags: Vec<Diagnostic> = Vec::new();
        let err = resolve(
            "01 REC. 05 CNT PIC 9V9. 05 ITEMS OCCURS 1 TO 5 DEPENDING ON CNT PIC X.",
            &mut diags,
        )
        .unwrap_err();
        assert!(matches!(err, CopybookError::DependeeNotInteger { .. }));
    }

    #[test]
    fn test_missing_counter() {
        let mut diags: Vec<Diagnostic> = Vec::new();
        let err = resolve(
            "01 REC. 05 ITEMS OCCURS 1 TO 5 DEPENDING ON NOPE PIC X.",
            &mut diags,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CopybookError::DependeeNotFound { ref name, ref field } if name == "NOPE" && field == "ITEMS"
        ));
    }

    #[test]
    fn test_duplicate_counter_warns_and_uses_first() {
        let mut diags: Vec<Diagnostic> = Vec::new();
        let roots = resolve(
            "01 REC.
               05 A.
                  10 CNT PIC 9(2).
               05 B.
                  10 CNT PIC 9(2).
               05 ITEMS OCCURS 1 TO 5 DEPENDING ON CNT PIC X.",
            &mut diags,
        )
        .unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DUPLICATE_DEPENDEE);
        assert!(diags[0].is_warning());
        assert!(roots[0].child("A").unwrap().children()[0].is_dependee());
        assert!(!roots[0].child("B").unwrap().children()[0].is_dependee());
    }

    #[test]
    fn test_counter_in_other_record() {
        let mut diags: Vec<Diagnostic> = Vec::new();
        let roots = resolve(
            "01 HDR. 05 CNT PIC 9(3).
             01 BODY. 05 ITEMS OCCURS 1 TO 9 DEPENDING ON CNT PIC X.",
            &mut diags,
        )
        .unwrap();
        assert!(roots[0].children[0].is_dependee());
    }
}
