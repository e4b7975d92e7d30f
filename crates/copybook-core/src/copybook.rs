//! The compiled copybook and the compiler driver.

use serde::{Deserialize, Serialize};

use crate::ast::{Field, Group, Occurs, Statement};
use crate::diagnostic::{DiagnosticSink, TracingSink};
use crate::options::CompilerOptions;
use crate::{lexer, parser, semantic, Result};

/// Runs the compilation pipeline with a set of options.
///
/// Diagnostics go to [`TracingSink`] unless another sink is attached with
/// [`Compiler::with_sink`].
pub struct Compiler<'a> {
    options: CompilerOptions,
    sink: Option<&'a mut dyn DiagnosticSink>,
}

impl<'a> Compiler<'a> {
    /// Create a compiler.
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            sink: None,
        }
    }

    /// Send warnings to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: &'a mut dyn DiagnosticSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Compile copybook text.
    pub fn compile(self, text: &str) -> Result<Copybook> {
        let Compiler { options, sink } = self;
        match sink {
            Some(sink) => run(&options, text, sink),
            None => run(&options, text, &mut TracingSink),
        }
    }
}

fn run(options: &CompilerOptions, text: &str, sink: &mut dyn DiagnosticSink) -> Result<Copybook> {
    let lines = lexer::lex(text, options)?;
    let roots = parser::build_trees(lines, options.encoding)?;
    tracing::debug!(records = roots.len(), "built field trees");

    let roots = semantic::calculate_layout(roots)?;
    let roots = semantic::mark_dependees(roots, sink)?;
    let roots = semantic::normalize_fillers(roots);

    let copybook = Copybook { roots };
    tracing::debug!(
        record_size = copybook.record_size_bytes(),
        fixed = copybook.is_record_fixed_size(),
        "compiled copybook"
    );
    Ok(copybook)
}

/// A compiled record layout.
///
/// Immutable once built; share it between readers with `Arc<Copybook>`.
///
/// # Example
///
/// ```
/// use copybook_core::Copybook;
///
/// let text = "       01  CUSTOMER.\n\
///             \x20          05  CUST-ID    PIC 9(6).\n\
///             \x20          05  CUST-NAME  PIC X(20).\n";
/// let copybook = Copybook::parse(text).unwrap();
///
/// assert_eq!(copybook.record_size_bytes(), 26);
/// let name = copybook.field("CUSTOMER.CUST-NAME").unwrap();
/// assert_eq!(name.binary().offset, 48);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Copybook {
    roots: Vec<Group>,
}

/// One row of the layout report. Positions and sizes are in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Dotted path from the record, e.g. `REC.HDR.ID`.
    pub path: String,
    pub name: String,
    pub level: u32,
    /// `group` or the elementary data type.
    pub kind: String,
    /// 1-based start position.
    pub start: u64,
    /// 1-based end position (inclusive).
    pub end: u64,
    /// Size including all occurrences.
    pub size: u64,
    pub occurs: Option<Occurs>,
    pub redefines: Option<String>,
    pub depending_on: Option<String>,
    /// Nesting depth, 0 for records.
    pub depth: usize,
}

impl Copybook {
    /// Compile with default options.
    pub fn parse(text: &str) -> Result<Self> {
        Compiler::new(CompilerOptions::default()).compile(text)
    }

    /// Compile with the given options.
    pub fn parse_with_options(text: &str, options: CompilerOptions) -> Result<Self> {
        Compiler::new(options).compile(text)
    }

    /// The record groups, in source order.
    pub fn roots(&self) -> &[Group] {
        &self.roots
    }

    /// Take ownership of the record groups.
    pub fn into_roots(self) -> Vec<Group> {
        self.roots
    }

    /// Record size in bits: the largest record, since all records
    /// describe the same storage area.
    pub fn record_size_bits(&self) -> u64 {
        self.roots
            .iter()
            .map(|r| r.binary.actual_size)
            .max()
            .unwrap_or(0)
    }

    /// Record size in bytes, rounded up.
    pub fn record_size_bytes(&self) -> u64 {
        self.record_size_bits().div_ceil(8)
    }

    /// Whether no field uses `OCCURS ... DEPENDING ON`.
    pub fn is_record_fixed_size(&self) -> bool {
        fn fixed(fields: &[Field]) -> bool {
            fields
                .iter()
                .all(|f| f.depending_on().is_none() && fixed(f.children()))
        }
        self.roots
            .iter()
            .all(|r| r.depending_on.is_none() && fixed(&r.children))
    }

    /// Look up a field by dotted path (`REC.GROUP.FIELD`) or, with a single
    /// name, the first field of that name in document order. Matching is
    /// case-insensitive.
    pub fn field(&self, path: &str) -> Option<&Field> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let rest: Vec<&str> = parts.collect();

        if rest.is_empty() {
            return self.roots.iter().find_map(|r| find_first(&r.children, first));
        }

        let root = self
            .roots
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(first))?;
        let (last, middle) = rest.split_last()?;
        let mut children: &[Field] = &root.children;
        for part in middle {
            children = children
                .iter()
                .find(|f| f.name().eq_ignore_ascii_case(part))?
                .children();
        }
        children.iter().find(|f| f.name().eq_ignore_ascii_case(last))
    }

    /// Find a record by name.
    pub fn record(&self, name: &str) -> Option<&Group> {
        self.roots.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// All elementary fields with their dotted paths, in document order.
    pub fn leaves(&self) -> Vec<(String, &Statement)> {
        fn walk<'a>(fields: &'a [Field], parent: &str, out: &mut Vec<(String, &'a Statement)>) {
            for field in fields {
                let path = format!("{parent}.{}", field.name());
                match field {
                    Field::Group(g) => walk(&g.children, &path, out),
                    Field::Statement(s) => out.push((path, s)),
                }
            }
        }
        let mut out = Vec::new();
        for root in &self.roots {
            walk(&root.children, &root.name, &mut out);
        }
        out
    }

    /// One entry per field, records included, in document order.
    pub fn layout_entries(&self) -> Vec<LayoutEntry> {
        let mut entries = Vec::new();
        for root in &self.roots {
            push_entry(&mut entries, &root.name, root.name.clone(), Node::Group(root), 0);
            collect_entries(&root.children, &root.name, 1, &mut entries);
        }
        entries
    }

    /// Human-readable layout table followed by a summary line.
    pub fn layout_report(&self) -> String {
        let entries = self.layout_entries();
        let name_width = entries
            .iter()
            .map(|e| e.depth * 2 + e.name.len())
            .max()
            .unwrap_or(0)
            .max(4);

        let mut out = format!(
            "{:<5} {:<name_width$}  {:>7} {:>7} {:>7}  {}\n",
            "LEVEL", "NAME", "START", "END", "SIZE", "TYPE"
        );
        for e in &entries {
            let name = format!("{}{}", "  ".repeat(e.depth), e.name);
            let mut kind = e.kind.clone();
            match e.occurs {
                Some(Occurs::Fixed(n)) => kind.push_str(&format!(" occurs {n}")),
                Some(Occurs::Range { min, max }) => {
                    kind.push_str(&format!(" occurs {min} to {max}"))
                }
                None => {}
            }
            if let Some(ref target) = e.depending_on {
                kind.push_str(&format!(" depending on {target}"));
            }
            if let Some(ref target) = e.redefines {
                kind.push_str(&format!(" redefines {target}"));
            }
            out.push_str(&format!(
                "{:02}    {:<name_width$}  {:>7} {:>7} {:>7}  {}\n",
                e.level, name, e.start, e.end, e.size, kind
            ));
        }
        out.push_str(&format!(
            "Record size: {} bytes ({})\n",
            self.record_size_bytes(),
            if self.is_record_fixed_size() {
                "fixed"
            } else {
                "variable"
            }
        ));
        out
    }
}

fn find_first<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find_map(|f| {
        if f.name().eq_ignore_ascii_case(name) {
            Some(f)
        } else {
            find_first(f.children(), name)
        }
    })
}

enum Node<'a> {
    Group(&'a Group),
    Field(&'a Field),
}

fn collect_entries(fields: &[Field], parent: &str, depth: usize, out: &mut Vec<LayoutEntry>) {
    for field in fields {
        let path = format!("{parent}.{}", field.name());
        push_entry(out, field.name(), path.clone(), Node::Field(field), depth);
        collect_entries(field.children(), &path, depth + 1, out);
    }
}

fn push_entry(out: &mut Vec<LayoutEntry>, name: &str, path: String, node: Node<'_>, depth: usize) {
    let (level, binary, occurs, redefines, depending_on, kind) = match node {
        Node::Group(g) => (
            g.level,
            g.binary,
            g.occurs,
            g.redefines.clone(),
            g.depending_on.clone(),
            "group".to_string(),
        ),
        Node::Field(f) => (
            f.level(),
            *f.binary(),
            f.occurs(),
            f.redefines().map(str::to_string),
            f.depending_on().map(str::to_string),
            match f {
                Field::Group(_) => "group".to_string(),
                Field::Statement(s) => s.data_type.to_string(),
            },
        ),
    };
    let start = binary.offset / 8 + 1;
    let size = binary.actual_size.div_ceil(8);
    out.push(LayoutEntry {
        path,
        name: name.to_string(),
        level,
        kind,
        start,
        end: (start + size).saturating_sub(1),
        size,
        occurs,
        redefines,
        depending_on,
        depth,
    });
}
