//! # Schema Node Model
//!
//! The explicit tagged-variant description of a data shape. Paths are
//! derived from this tree, never from a runtime value: a fixed-length tuple
//! and an open-ended list look the same at runtime, so the embedding
//! application states which one it means.
//!
//! A schema is a finite tree. Shared or self-referencing shapes are
//! expressed with named definitions in a schema document and expanded
//! (with cycle detection) before a tree is built.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Leaf kinds. Primitives and opaque terminals are both scalars for path
/// purposes: no path ever descends into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    #[serde(rename = "bigint")]
    BigInt,
    Symbol,
    /// Date or timestamp.
    Date,
    /// A single file handle.
    File,
    /// A list of file handles, addressed as a whole.
    FileList,
    /// Binary blob.
    Bytes,
}

impl ScalarKind {
    /// All scalar kinds, primitives first.
    pub const ALL: [ScalarKind; 11] = [
        Self::String,
        Self::Number,
        Self::Boolean,
        Self::Null,
        Self::Undefined,
        Self::BigInt,
        Self::Symbol,
        Self::Date,
        Self::File,
        Self::FileList,
        Self::Bytes,
    ];

    /// Structurally composite types that are treated as leaves by policy.
    pub fn is_opaque(self) -> bool {
        matches!(self, Self::Date | Self::File | Self::FileList | Self::Bytes)
    }

    /// The name used in schema documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::BigInt => "bigint",
            Self::Symbol => "symbol",
            Self::Date => "date",
            Self::File => "file",
            Self::FileList => "file_list",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mapping from field name to child node.
///
/// Fields are kept sorted by name so that path enumeration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, SchemaNode>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) -> Option<SchemaNode> {
        self.fields.insert(name.into(), node)
    }

    /// Look up a field by exact name.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.get(name)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SchemaNode)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, SchemaNode)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaNode {
    /// A primitive or opaque terminal.
    Scalar(ScalarKind),
    /// Named fields, statically known.
    Record(Record),
    /// Fixed-length ordered sequence; index `i` has schema `items[i]`.
    Tuple(Vec<SchemaNode>),
    /// Variable-length homogeneous sequence with an unbounded index domain.
    List(Box<SchemaNode>),
}

impl SchemaNode {
    /// Build a record node from `(name, node)` pairs.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        Self::Record(fields.into_iter().collect())
    }

    /// Build a tuple node from its element schemas, in index order.
    pub fn tuple<I: IntoIterator<Item = SchemaNode>>(items: I) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Build a list node from its element schema.
    pub fn list(item: SchemaNode) -> Self {
        Self::List(Box::new(item))
    }

    pub const fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }

    /// `true` for scalars, including opaque terminals.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// `record`, `tuple`, `list`, or the scalar's name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.as_str(),
            Self::Record(_) => "record",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
        }
    }
}

impl From<ScalarKind> for SchemaNode {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }
}

impl From<Record> for SchemaNode {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

/// Check that a record field name can be addressed in dot notation.
///
/// Returns the reason on rejection.
pub fn check_field_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("field names must not be empty");
    }
    if name.contains('.') {
        return Err("field names must not contain '.'");
    }
    Ok(())
}
