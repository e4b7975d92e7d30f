//! FILLER renaming and empty group removal.
//!
//! Pruning runs after layout and dependee marking, so references to a
//! pruned group are repaired here: a redefinition block keeps its shape
//! and a counter that no surviving OCCURS depends on loses its dependee
//! flag.

use std::collections::HashSet;

use crate::ast::{Field, Group};
use crate::lexer::FILLER;

/// Give every FILLER a unique `FILLER_<n>` name and drop empty groups.
///
/// The counter is shared by the whole copybook and skips numbers whose
/// name is already taken by a declared field.
pub fn normalize_fillers(roots: Vec<Group>) -> Vec<Group> {
    let mut taken = HashSet::new();
    for root in &roots {
        taken.insert(root.name.to_ascii_uppercase());
        collect_names(&root.children, &mut taken);
    }

    let mut namer = FillerNamer { next: 1, taken };
    let mut roots: Vec<Group> = roots
        .into_iter()
        .filter_map(|mut root| {
            let children = std::mem::take(&mut root.children);
            root.children = normalize(children, &mut namer);
            (!root.children.is_empty()).then_some(root)
        })
        .collect();

    let mut counters = HashSet::new();
    for root in &roots {
        collect_counters(&root.children, &mut counters);
    }
    for root in &mut roots {
        release_dependees(&mut root.children, &counters);
    }
    roots
}

struct FillerNamer {
    next: usize,
    taken: HashSet<String>,
}

impl FillerNamer {
    fn next_name(&mut self) -> String {
        loop {
            let name = format!("{FILLER}_{}", self.next);
            self.next += 1;
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

fn collect_names(fields: &[Field], taken: &mut HashSet<String>) {
    for field in fields {
        taken.insert(field.name().to_ascii_uppercase());
        collect_names(field.children(), taken);
    }
}

/// A pruned sibling and the field that took its place in its
/// redefinition block, once one has.
struct Pruned {
    name: String,
    stand_in: Option<String>,
}

fn normalize(fields: Vec<Field>, namer: &mut FillerNamer) -> Vec<Field> {
    let mut out: Vec<Field> = Vec::with_capacity(fields.len());
    let mut pruned: Vec<Pruned> = Vec::new();

    for mut field in fields {
        if field.name().eq_ignore_ascii_case(FILLER) {
            field.set_name(namer.next_name());
        }
        retarget(&mut field, &mut pruned);
        if let Field::Group(group) = &mut field {
            let children = std::mem::take(&mut group.children);
            group.children = normalize(children, namer);
            if group.children.is_empty() {
                pruned.push(Pruned {
                    name: group.name.clone(),
                    stand_in: group.redefines.clone(),
                });
                continue;
            }
        }
        out.push(field);
    }

    if !pruned.is_empty() {
        refresh_redefined(&mut out);
    }
    out
}

/// Point a REDEFINES at the field now standing in for a pruned target.
///
/// The first field that redefined a pruned block base becomes the new base.
fn retarget(field: &mut Field, pruned: &mut [Pruned]) {
    // Each step follows one pruned sibling.
    for _ in 0..pruned.len() {
        let Some(target) = field.redefines().map(str::to_string) else {
            return;
        };
        let Some(entry) = pruned
            .iter_mut()
            .rev()
            .find(|p| p.name.eq_ignore_ascii_case(&target))
        else {
            return;
        };
        match entry.stand_in.clone() {
            Some(stand_in) => field.set_redefines(Some(stand_in)),
            None => {
                entry.stand_in = Some(field.name().to_string());
                field.set_redefines(None);
            }
        }
    }
}

fn refresh_redefined(fields: &mut [Field]) {
    for field in fields.iter_mut() {
        field.set_redefined(false);
    }
    for i in 0..fields.len() {
        let Some(target) = fields[i].redefines().map(str::to_string) else {
            continue;
        };
        if let Some(base) = fields[..i]
            .iter_mut()
            .rev()
            .find(|f| f.name().eq_ignore_ascii_case(&target))
        {
            base.set_redefined(true);
        }
    }
}

fn collect_counters(fields: &[Field], counters: &mut HashSet<String>) {
    for field in fields {
        if let Some(name) = field.depending_on() {
            counters.insert(name.to_ascii_uppercase());
        }
        collect_counters(field.children(), counters);
    }
}

/// Clear `is_dependee` on leaves no surviving `DEPENDING ON` refers to.
fn release_dependees(fields: &mut [Field], counters: &HashSet<String>) {
    for field in fields {
        match field {
            Field::Group(group) => release_dependees(&mut group.children, counters),
            Field::Statement(stmt) => {
                if stmt.is_dependee && !counters.contains(&stmt.name.to_ascii_uppercase()) {
                    stmt.is_dependee = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::diagnostic::Diagnostic;
    use crate::options::{CompilerOptions, SourceFormat};
    use crate::parser::build_trees;
    use crate::semantic::{calculate_layout, mark_dependees};

    fn normalized(text: &str) -> Vec<Group> {
        let options = CompilerOptions::new().with_source_format(SourceFormat::Free);
        let roots = build_trees(lex(text, &options).unwrap(), options.encoding).unwrap();
        normalize_fillers(roots)
    }

    fn compiled(text: &str) -> Vec<Group> {
        let options = CompilerOptions::new().with_source_format(SourceFormat::Free);
        let roots = build_trees(lex(text, &options).unwrap(), options.encoding).unwrap();
        let roots = calculate_layout(roots).unwrap();
        let mut warnings: Vec<Diagnostic> = Vec::new();
        normalize_fillers(mark_dependees(roots, &mut warnings).unwrap())
    }

    fn names(fields: &[Field], out: &mut Vec<String>) {
        for f in fields {
            out.push(f.name().to_string());
            names(f.children(), out);
        }
    }

    #[test]
    fn test_fillers_numbered_across_tree() {
        let roots = normalized(
            "01 REC.
               05 FILLER PIC X.
               05 G.
                  10 FILLER PIC X(2).
                  10 filler PIC X(3).
               05 PIC X(4).",
        );
        let mut all = Vec::new();
        names(&roots[0].children, &mut all);
        assert_eq!(all, vec!["FILLER_1", "G", "FILLER_2", "FILLER_3", "FILLER_4"]);
    }

    #[test]
    fn test_existing_names_skipped() {
        let roots = normalized("01 REC. 05 FILLER_1 PIC X. 05 FILLER PIC X.");
        assert_eq!(roots[0].children[1].name(), "FILLER_2");
    }

    #[test]
    fn test_empty_groups_dropped() {
        let roots = normalized(
            "01 REC.
               05 EMPTY.
               05 OUTER.
                  10 INNER.
               05 A PIC X.",
        );
        let mut all = Vec::new();
        names(&roots[0].children, &mut all);
        assert_eq!(all, vec!["A"]);
    }

    #[test]
    fn test_empty_record_dropped() {
        let roots = normalized("01 R1. 01 R2. 05 A PIC X.");
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "R2");
    }

    #[test]
    fn test_filler_group_renamed() {
        let roots = normalized("01 REC. 05 FILLER. 10 A PIC X.");
        assert_eq!(roots[0].children[0].name(), "FILLER_1");
        assert_eq!(roots[0].children[0].children()[0].name(), "A");
    }

    #[test]
    fn test_pruned_base_replaced_by_redefiner() {
        let roots = compiled("01 REC. 05 A. 05 B REDEFINES A PIC X(4). 05 C PIC X.");
        let rec = &roots[0];
        let b = rec.child("B").unwrap();
        assert!(rec.child("A").is_none());
        assert_eq!(b.redefines(), None);
        assert_eq!(b.binary().offset, 0);
        assert_eq!(rec.child("C").unwrap().binary().offset, 32);
        assert_eq!(rec.binary.data_size, 40);
    }

    #[test]
    fn test_pruned_base_block_retargeted() {
        let roots = compiled(
            "01 REC.
               05 A.
               05 B REDEFINES A PIC X(4).
               05 C REDEFINES A PIC X(2).
               05 D PIC X.",
        );
        let rec = &roots[0];
        let c = rec.child("C").unwrap();
        assert_eq!(c.redefines(), Some("B"));
        assert_eq!(c.binary().offset, 0);
        assert!(rec.child("B").unwrap().is_redefined());
        assert!(!c.is_redefined());
        assert_eq!(rec.child("D").unwrap().binary().offset, 32);
    }

    #[test]
    fn test_pruned_redefiner_clears_flag() {
        let roots = compiled("01 REC. 05 A PIC X(4). 05 B REDEFINES A. 05 C PIC X.");
        let rec = &roots[0];
        assert!(rec.child("B").is_none());
        assert!(!rec.child("A").unwrap().is_redefined());
    }

    #[test]
    fn test_pruned_dependent_group_releases_counter() {
        let roots = compiled(
            "01 REC.
               05 CNT PIC 9(2).
               05 ROWS OCCURS 1 TO 5 DEPENDING ON CNT.
               05 TAIL PIC X.",
        );
        let rec = &roots[0];
        assert!(rec.child("ROWS").is_none());
        assert!(!rec.child("CNT").unwrap().is_dependee());
    }

    #[test]
    fn test_counter_kept_while_still_referenced() {
        let roots = compiled(
            "01 REC.
               05 CNT PIC 9(2).
               05 ROWS OCCURS 1 TO 5 DEPENDING ON CNT.
               05 ITEMS PIC X OCCURS 1 TO 3 DEPENDING ON cnt.",
        );
        assert!(roots[0].child("CNT").unwrap().is_dependee());
    }
}
