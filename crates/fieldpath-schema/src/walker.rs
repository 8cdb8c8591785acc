//! # Schema Walker
//!
//! Compiles a [`SchemaNode`] tree into the path grammar: a trie keyed by
//! segment, where record fields and tuple indices are concrete edges and a
//! list position is a single wildcard edge over all non-negative integers.
//! Membership checks walk the trie once per segment, so they cost
//! O(path length) regardless of how many paths the schema admits.
//!
//! Every node of the trie is a valid path target. Scalars (including opaque
//! terminals) end a path; composite nodes may either end it or be walked
//! further.
//!
//! The grammar is compiled once and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use fieldpath_core::{
    check_field_name, join_dotted, parse_index, PathError, ScalarKind, SchemaError, SchemaNode,
    Segment,
};

/// Fields listed by name in an `InvalidSegment` message before eliding.
const MAX_LISTED_FIELDS: usize = 8;

/// One node of the compiled path trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarNode {
    /// A scalar or opaque terminal. No outgoing edges.
    Terminal(ScalarKind),
    /// Record fields, one edge per name.
    Named(BTreeMap<String, GrammarNode>),
    /// Tuple elements, one edge per index below the arity.
    Indexed(Vec<GrammarNode>),
    /// List element, reached through any non-negative integer.
    Wildcard(Box<GrammarNode>),
}

impl GrammarNode {
    pub fn target(&self) -> Target {
        match self {
            Self::Terminal(kind) => Target::Scalar(*kind),
            Self::Named(fields) => Target::Record {
                fields: fields.len(),
            },
            Self::Indexed(items) => Target::Tuple { arity: items.len() },
            Self::Wildcard(_) => Target::List,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Follow one segment out of this node.
    fn step(&self, segment: &str) -> Result<(&GrammarNode, Segment), StepError> {
        match self {
            Self::Terminal(kind) => Err(StepError::PastTerminal(*kind)),
            Self::Named(fields) => fields
                .get(segment)
                .map(|child| (child, Segment::Field(segment.to_string())))
                .ok_or_else(|| StepError::Unknown(describe_fields(fields))),
            Self::Indexed(items) => {
                let index = parse_index(segment).ok_or_else(|| {
                    StepError::Unknown(format!("a tuple index below {}", items.len()))
                })?;
                items
                    .get(index)
                    .map(|child| (child, Segment::Index(index)))
                    .ok_or(StepError::OutOfRange {
                        index,
                        arity: items.len(),
                    })
            }
            Self::Wildcard(item) => parse_index(segment)
                .map(|index| (&**item, Segment::Index(index)))
                .ok_or_else(|| StepError::Unknown(list_index_expectation(segment))),
        }
    }
}

/// What a list position expected, given a segment `parse_index` refused.
fn list_index_expectation(segment: &str) -> String {
    let canonical_digits = !segment.is_empty()
        && !segment.starts_with('0')
        && segment.bytes().all(|b| b.is_ascii_digit());
    if canonical_digits {
        // Well-formed but wider than usize.
        format!("a list index no greater than {}", usize::MAX)
    } else {
        "a non-negative integer list index".to_string()
    }
}

fn describe_fields(fields: &BTreeMap<String, GrammarNode>) -> String {
    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "no fields (empty record)".to_string();
    }
    if names.len() <= MAX_LISTED_FIELDS {
        return format!("one of [{}]", names.join(", "));
    }
    format!(
        "one of {} fields [{}, ...]",
        names.len(),
        names[..MAX_LISTED_FIELDS].join(", ")
    )
}

enum StepError {
    Unknown(String),
    OutOfRange { index: usize, arity: usize },
    PastTerminal(ScalarKind),
}

/// What a path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Scalar(ScalarKind),
    Record { fields: usize },
    Tuple { arity: usize },
    List,
}

impl Target {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// `record`, `tuple`, `list`, or the scalar's name.
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.as_str(),
            Self::Record { .. } => "record",
            Self::Tuple { .. } => "tuple",
            Self::List => "list",
        }
    }
}

/// A path that passed the grammar, with each segment typed by the
/// position it landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub segments: Vec<Segment>,
    pub target: Target,
}

impl ResolvedPath {
    pub fn to_dotted(&self) -> String {
        let rendered: Vec<String> = self.segments.iter().map(Segment::to_string).collect();
        join_dotted(&rendered)
    }
}

/// One step of an enumerated path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    Field(String),
    Index(usize),
    /// A list position: any non-negative integer.
    AnyIndex,
}

impl fmt::Display for PatternSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
            Self::AnyIndex => f.write_str("*"),
        }
    }
}

/// One member of the enumerated path grammar. List positions stay
/// wildcards, so the enumeration is finite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pub segments: Vec<PatternSegment>,
    pub target: Target,
}

impl PathPattern {
    pub fn is_terminal(&self) -> bool {
        self.target.is_terminal()
    }

    /// Concrete segmented path with every wildcard replaced by `index`.
    pub fn instantiate(&self, index: usize) -> Vec<String> {
        self.segments
            .iter()
            .map(|segment| match segment {
                PatternSegment::AnyIndex => index.to_string(),
                other => other.to_string(),
            })
            .collect()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PatternSegment::AnyIndex)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// The compiled path grammar for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    root: GrammarNode,
    depth: usize,
}

impl Grammar {
    /// Compile a schema into its path grammar.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::RootNotRecord`] if `schema` is not a record.
    /// - [`SchemaError::InvalidFieldName`] for a field name that dot
    ///   notation cannot address.
    /// - [`SchemaError::DepthExceeded`] if any path would be longer than
    ///   `max_depth` segments.
    pub fn compile(schema: &SchemaNode, max_depth: usize) -> Result<Self, SchemaError> {
        if !matches!(schema, SchemaNode::Record(_)) {
            return Err(SchemaError::RootNotRecord {
                found: schema.kind_name().to_string(),
            });
        }

        let mut compiler = Compiler {
            max_depth,
            deepest: 0,
            location: Vec::new(),
        };
        let root = compiler.compile(schema)?;
        let grammar = Self {
            root,
            depth: compiler.deepest,
        };

        tracing::debug!(
            depth = grammar.depth,
            patterns = grammar.pattern_count(),
            "compiled path grammar"
        );
        Ok(grammar)
    }

    pub fn root(&self) -> &GrammarNode {
        &self.root
    }

    /// Length of the longest path the grammar admits.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Walk `segments` through the trie and return the node reached.
    ///
    /// # Errors
    ///
    /// Returns the [`PathError`] for the first segment that leaves the
    /// grammar, or [`PathError::Empty`] for an empty sequence.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Result<&GrammarNode, PathError> {
        self.walk(segments, |_| {})
    }

    /// Like [`lookup`](Self::lookup), also typing each segment as a field
    /// name or an index.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<ResolvedPath, PathError> {
        let mut typed = Vec::with_capacity(segments.len());
        let node = self.walk(segments, |segment| typed.push(segment))?;
        Ok(ResolvedPath {
            segments: typed,
            target: node.target(),
        })
    }

    /// Membership test over the full grammar (composite targets included).
    pub fn contains<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.lookup(segments).is_ok()
    }

    fn walk<S, F>(&self, segments: &[S], mut visit: F) -> Result<&GrammarNode, PathError>
    where
        S: AsRef<str>,
        F: FnMut(Segment),
    {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }

        let mut node = &self.root;
        for (position, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            match node.step(segment) {
                Ok((child, typed)) => {
                    visit(typed);
                    node = child;
                }
                Err(StepError::Unknown(expected)) => {
                    return Err(PathError::InvalidSegment {
                        path: join_dotted(segments),
                        position,
                        segment: segment.to_string(),
                        expected,
                    });
                }
                Err(StepError::OutOfRange { index, arity }) => {
                    return Err(PathError::TupleIndexOutOfRange {
                        path: join_dotted(segments),
                        position,
                        index,
                        arity,
                    });
                }
                Err(StepError::PastTerminal(kind)) => {
                    return Err(PathError::TrailingSegments {
                        path: join_dotted(segments),
                        position,
                        scalar: kind.to_string(),
                    });
                }
            }
        }
        Ok(node)
    }

    /// Enumerate every path the grammar admits, depth-first, each composite
    /// node listed before the paths beneath it.
    pub fn patterns(&self) -> Vec<PathPattern> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect_patterns(&self.root, &mut prefix, &mut out);
        out
    }

    /// Number of patterns [`patterns`](Self::patterns) would return.
    pub fn pattern_count(&self) -> usize {
        count_patterns(&self.root)
    }
}

fn collect_patterns(
    node: &GrammarNode,
    prefix: &mut Vec<PatternSegment>,
    out: &mut Vec<PathPattern>,
) {
    let mut visit = |edge: PatternSegment, child: &GrammarNode, prefix: &mut Vec<PatternSegment>| {
        prefix.push(edge);
        out.push(PathPattern {
            segments: prefix.clone(),
            target: child.target(),
        });
        collect_patterns(child, prefix, out);
        prefix.pop();
    };

    match node {
        GrammarNode::Terminal(_) => {}
        GrammarNode::Named(fields) => {
            for (name, child) in fields {
                visit(PatternSegment::Field(name.clone()), child, prefix);
            }
        }
        GrammarNode::Indexed(items) => {
            for (index, child) in items.iter().enumerate() {
                visit(PatternSegment::Index(index), child, prefix);
            }
        }
        GrammarNode::Wildcard(item) => visit(PatternSegment::AnyIndex, item, prefix),
    }
}

fn count_patterns(node: &GrammarNode) -> usize {
    let below = |child: &GrammarNode| 1usize.saturating_add(count_patterns(child));
    match node {
        GrammarNode::Terminal(_) => 0,
        GrammarNode::Named(fields) => fields
            .values()
            .fold(0usize, |acc, child| acc.saturating_add(below(child))),
        GrammarNode::Indexed(items) => items
            .iter()
            .fold(0usize, |acc, child| acc.saturating_add(below(child))),
        GrammarNode::Wildcard(item) => below(item),
    }
}

struct Compiler {
    max_depth: usize,
    deepest: usize,
    location: Vec<String>,
}

impl Compiler {
    fn compile(&mut self, node: &SchemaNode) -> Result<GrammarNode, SchemaError> {
        let depth = self.location.len();
        if depth > self.max_depth {
            return Err(SchemaError::DepthExceeded {
                limit: self.max_depth,
                location: self.location_string(),
            });
        }
        self.deepest = self.deepest.max(depth);

        match node {
            SchemaNode::Scalar(kind) => Ok(GrammarNode::Terminal(*kind)),
            SchemaNode::Record(record) => {
                let mut fields = BTreeMap::new();
                for (name, child) in record.iter() {
                    check_field_name(name).map_err(|reason| SchemaError::InvalidFieldName {
                        name: name.to_string(),
                        location: self.location_string(),
                        reason: reason.to_string(),
                    })?;
                    let compiled = self.descend(name.to_string(), child)?;
                    fields.insert(name.to_string(), compiled);
                }
                Ok(GrammarNode::Named(fields))
            }
            SchemaNode::Tuple(items) => {
                let compiled = items
                    .iter()
                    .enumerate()
                    .map(|(index, child)| self.descend(index.to_string(), child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(GrammarNode::Indexed(compiled))
            }
            SchemaNode::List(item) => {
                let compiled = self.descend("*".to_string(), item)?;
                Ok(GrammarNode::Wildcard(Box::new(compiled)))
            }
        }
    }

    fn descend(&mut self, edge: String, child: &SchemaNode) -> Result<GrammarNode, SchemaError> {
        self.location.push(edge);
        let result = self.compile(child);
        self.location.pop();
        result
    }

    fn location_string(&self) -> String {
        if self.location.is_empty() {
            "(root)".to_string()
        } else {
            join_dotted(&self.location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldpath_core::ScalarKind::{Date, Number, String as Str};

    fn scalar(kind: ScalarKind) -> SchemaNode {
        SchemaNode::scalar(kind)
    }

    /// `{ name: string; address: [string, string]; books: { id: number; name: string }[] }`
    fn entity() -> SchemaNode {
        SchemaNode::record([
            ("name", scalar(Str)),
            ("address", SchemaNode::tuple([scalar(Str), scalar(Str)])),
            (
                "books",
                SchemaNode::list(SchemaNode::record([("id", scalar(Number)), ("name", scalar(Str))])),
            ),
        ])
    }

    #[test]
    fn enumerates_full_grammar_in_order() {
        let grammar = Grammar::compile(&entity(), 64).unwrap();
        let rendered: Vec<String> = grammar.patterns().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "address",
                "address.0",
                "address.1",
                "books",
                "books.*",
                "books.*.id",
                "books.*.name",
                "name",
            ]
        );
        assert_eq!(grammar.pattern_count(), 8);
        assert_eq!(grammar.depth(), 3);
    }

    #[test]
    fn composite_nodes_are_targets() {
        let grammar = Grammar::compile(&entity(), 64).unwrap();
        assert_eq!(grammar.lookup(&["address"]).unwrap().target(), Target::Tuple { arity: 2 });
        assert_eq!(grammar.lookup(&["books"]).unwrap().target(), Target::List);
        assert_eq!(
            grammar.lookup(&["books", "7"]).unwrap().target(),
            Target::Record { fields: 2 }
        );
    }

    #[test]
    fn resolve_types_segments() {
        let grammar = Grammar::compile(&entity(), 64).unwrap();
        let resolved = grammar.resolve(&["books", "3", "name"]).unwrap();
        assert_eq!(
            resolved.segments,
            [
                Segment::Field("books".into()),
                Segment::Index(3),
                Segment::Field("name".into())
            ]
        );
        assert_eq!(resolved.target, Target::Scalar(Str));
        assert_eq!(resolved.to_dotted(), "books.3.name");
    }

    #[test]
    fn opaque_terminal_is_not_descended() {
        let schema = SchemaNode::record([("created", scalar(Date))]);
        let grammar = Grammar::compile(&schema, 64).unwrap();
        assert!(grammar.contains(&["created"]));
        let err = grammar.lookup(&["created", "year"]).unwrap_err();
        assert!(matches!(err, PathError::TrailingSegments { position: 1, .. }));
    }

    #[test]
    fn oversized_index_names_the_bound() {
        let grammar = Grammar::compile(&entity(), 64).unwrap();
        let huge = format!("{}0", usize::MAX);

        match grammar.lookup(&["books", huge.as_str()]).unwrap_err() {
            PathError::InvalidSegment { position, expected, .. } => {
                assert_eq!(position, 1);
                assert_eq!(expected, format!("a list index no greater than {}", usize::MAX));
            }
            other => panic!("unexpected {other:?}"),
        }
        match grammar.lookup(&["books", "-1"]).unwrap_err() {
            PathError::InvalidSegment { expected, .. } => {
                assert_eq!(expected, "a non-negative integer list index");
            }
            other => panic!("unexpected {other:?}"),
        }
        match grammar.lookup(&["address", huge.as_str()]).unwrap_err() {
            PathError::InvalidSegment { expected, .. } => {
                assert_eq!(expected, "a tuple index below 2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejection_classes() {
        let grammar = Grammar::compile(&entity(), 64).unwrap();

        assert_eq!(grammar.lookup::<&str>(&[]).unwrap_err(), PathError::Empty);

        match grammar.lookup(&["address", "2"]).unwrap_err() {
            PathError::TupleIndexOutOfRange { index, arity, position, .. } => {
                assert_eq!((index, arity, position), (2, 2, 1));
            }
            other => panic!("unexpected {other:?}"),
        }

        match grammar.lookup(&["books", "3", "price"]).unwrap_err() {
            PathError::InvalidSegment { segment, position, expected, path } => {
                assert_eq!(segment, "price");
                assert_eq!(position, 2);
                assert_eq!(expected, "one of [id, name]");
                assert_eq!(path, "books.3.price");
            }
            other => panic!("unexpected {other:?}"),
        }

        for bad in ["-1", "x", "01", "1.0"] {
            assert!(
                matches!(
                    grammar.lookup(&["books", bad]).unwrap_err(),
                    PathError::InvalidSegment { position: 1, .. }
                ),
                "{bad} accepted at list position"
            );
        }
        assert!(matches!(
            grammar.lookup(&["address", "-1"]).unwrap_err(),
            PathError::InvalidSegment { .. }
        ));
    }

    #[test]
    fn root_must_be_record() {
        let err = Grammar::compile(&SchemaNode::list(scalar(Str)), 64).unwrap_err();
        assert_eq!(
            err,
            SchemaError::RootNotRecord {
                found: "list".into()
            }
        );
    }

    #[test]
    fn dotted_field_name_rejected_at_compile() {
        let schema = SchemaNode::record([(
            "outer",
            SchemaNode::list(SchemaNode::record([("a.b", scalar(Str))])),
        )]);
        match Grammar::compile(&schema, 64).unwrap_err() {
            SchemaError::InvalidFieldName { name, location, .. } => {
                assert_eq!(name, "a.b");
                assert_eq!(location, "outer.*");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn depth_limit_enforced() {
        let mut node = scalar(Str);
        for _ in 0..5 {
            node = SchemaNode::record([("n", node)]);
        }
        assert!(Grammar::compile(&node, 5).is_ok());
        assert!(matches!(
            Grammar::compile(&node, 4).unwrap_err(),
            SchemaError::DepthExceeded { limit: 4, .. }
        ));
    }

    #[test]
    fn empty_tuple_is_addressable_without_indices() {
        let schema = SchemaNode::record([("pair", SchemaNode::Tuple(Vec::new()))]);
        let grammar = Grammar::compile(&schema, 64).unwrap();
        assert!(grammar.contains(&["pair"]));
        assert!(matches!(
            grammar.lookup(&["pair", "0"]).unwrap_err(),
            PathError::TupleIndexOutOfRange { arity: 0, .. }
        ));
    }

    #[test]
    fn wide_record_message_is_elided() {
        let fields = (0..12).map(|i| (format!("f{i:02}"), scalar(Str)));
        let grammar = Grammar::compile(&SchemaNode::record(fields), 64).unwrap();
        match grammar.lookup(&["zzz"]).unwrap_err() {
            PathError::InvalidSegment { expected, .. } => {
                assert!(expected.starts_with("one of 12 fields [f00,"), "{expected}");
                assert!(expected.ends_with(", ...]"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pattern_instantiation() {
        let grammar = Grammar::compile(&entity(), 64).unwrap();
        let pattern = grammar
            .patterns()
            .into_iter()
            .find(|p| p.to_string() == "books.*.id")
            .unwrap();
        assert!(pattern.has_wildcard());
        assert!(pattern.is_terminal());
        assert_eq!(pattern.instantiate(12), ["books", "12", "id"]);
    }
}
