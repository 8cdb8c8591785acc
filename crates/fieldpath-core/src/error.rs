//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout fieldpath. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Path errors carry the offending path, the zero-based position of the
//!   failing segment, and what the schema expected at that position.
//! - Schema errors are configuration errors: they surface once, when a
//!   registry is constructed, never at path validation time.
//! - Validation is deterministic. There is no retry and no partial success.

use thiserror::Error;

/// Top-level error type for fieldpath.
#[derive(Error, Debug)]
pub enum FieldPathError {
    /// A candidate path was rejected.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// A schema description could not be turned into a registry.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// A candidate path was rejected by the path grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The dot notation is syntactically broken: empty string, or a
    /// leading, trailing, or doubled `.` separator.
    #[error("malformed path '{path}': {reason}")]
    Malformed {
        /// The offending path text.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A segmented path with no segments. It never reaches a node.
    #[error("path has no segments")]
    Empty,

    /// A segment does not name a field, tuple index, or list position
    /// reachable at that point in the schema.
    #[error("invalid segment '{segment}' at position {position} in '{path}': expected {expected}")]
    InvalidSegment {
        /// The offending path, rendered in dot notation.
        path: String,
        /// Zero-based position of the failing segment.
        position: usize,
        /// The failing segment text.
        segment: String,
        /// Human-readable description of what was allowed there.
        expected: String,
    },

    /// An integer segment at a tuple position is not below the tuple's arity.
    #[error("tuple index {index} at position {position} in '{path}' is out of range for arity {arity}")]
    TupleIndexOutOfRange {
        /// The offending path, rendered in dot notation.
        path: String,
        /// Zero-based position of the failing segment.
        position: usize,
        /// The index that was supplied.
        index: usize,
        /// The tuple's fixed length.
        arity: usize,
    },

    /// The path continues past a scalar node.
    #[error("path '{path}' continues past {scalar} scalar at position {position}")]
    TrailingSegments {
        /// The offending path, rendered in dot notation.
        path: String,
        /// Zero-based position of the first segment past the scalar.
        position: usize,
        /// The kind of the scalar that was reached.
        scalar: String,
    },

    /// The path stops at a composite node while the registry only accepts
    /// terminal targets.
    #[error("path '{path}' addresses a composite {kind} node; only terminal paths are accepted")]
    CompositeTarget {
        /// The offending path, rendered in dot notation.
        path: String,
        /// `record`, `tuple`, or `list`.
        kind: String,
    },
}

impl PathError {
    /// Short stable name of the rejection class, used in CLI output and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "MalformedPath",
            Self::Empty => "PathTooShort",
            Self::InvalidSegment { .. } => "InvalidSegment",
            Self::TupleIndexOutOfRange { .. } => "TupleIndexOutOfRange",
            Self::TrailingSegments { .. } => "PathTooLong",
            Self::CompositeTarget { .. } => "CompositeTarget",
        }
    }
}

/// A schema description cannot be compiled into a path grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema root must be a record.
    #[error("schema root must be a record, found {found}")]
    RootNotRecord {
        /// The kind that was supplied instead.
        found: String,
    },

    /// A record field name cannot be addressed in dot notation.
    #[error("invalid field name '{name}' at '{location}': {reason}")]
    InvalidFieldName {
        /// The rejected name.
        name: String,
        /// Dot-notation location of the record holding the field
        /// (`(root)` for the schema root).
        location: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// A `ref` names a definition that does not exist.
    #[error("unknown definition '{name}' referenced at '{location}'")]
    UnknownDefinition {
        /// The missing definition name.
        name: String,
        /// Dot-notation location of the reference.
        location: String,
    },

    /// Definitions refer to each other without an eventual scalar.
    #[error("cyclic schema definition: {}", .chain.join(" -> "))]
    Cycle {
        /// The definition names forming the cycle, first name repeated last.
        chain: Vec<String>,
    },

    /// The schema nests deeper than the configured limit.
    #[error("schema nesting exceeds depth limit {limit} at '{location}'")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
        /// Dot-notation location where the limit was hit.
        location: String,
    },

    /// Expanding the schema's definitions produces more nodes than the
    /// configured limit.
    #[error("schema expands to more than {limit} nodes at '{location}'")]
    SizeExceeded {
        /// The configured limit.
        limit: usize,
        /// Dot-notation location being expanded when the limit was hit.
        location: String,
    },

    /// The schema source could not be read or parsed.
    #[error("schema load error for '{source_name}': {reason}")]
    Load {
        /// File path or other identifier of the source.
        source_name: String,
        /// Reason the source could not be loaded.
        reason: String,
    },

    /// The schema description does not conform to the description format.
    #[error("schema description '{source_name}' is invalid:\n{}", .violations.join("\n"))]
    Invalid {
        /// File path or other identifier of the source.
        source_name: String,
        /// One line per violation.
        violations: Vec<String>,
    },
}
