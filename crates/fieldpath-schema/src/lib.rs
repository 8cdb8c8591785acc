//! # fieldpath-schema — Path Grammar & Validation
//!
//! Turns a schema into the set of field paths that can address a node in
//! an instance of it, and checks candidate paths against that set.
//!
//! ## Schema Walker (`walker`)
//!
//! [`Grammar::compile`] walks a [`SchemaNode`](fieldpath_core::SchemaNode)
//! tree once and builds a segment trie. Record fields and tuple indices
//! are concrete edges; a list position is one wildcard edge that matches
//! any non-negative integer. [`Grammar::patterns`] enumerates the grammar
//! with `*` standing in for list positions.
//!
//! ## Path Registry (`registry`)
//!
//! [`PathRegistry`] exposes the two validation entry points:
//!
//! - [`PathRegistry::validate_string_path`]: `"books.3.name"`
//! - [`PathRegistry::validate_segmented_path`] /
//!   [`PathRegistry::validate_segmented_paths`]: `["books", "3", "name"]`
//!   or a dependency list of such paths
//!
//! Each returns its input unchanged on success.
//!
//! ## Schema Documents (`document`)
//!
//! [`SchemaDocument`] reads a JSON or YAML description with named
//! definitions, checks it against the embedded description schema, and
//! resolves references with cycle detection.
//!
//! ## Crate Policy
//!
//! - Depends only on `fieldpath-core` internally.
//! - A registry never changes after construction and is safe to share
//!   across threads.
//! - Rejected paths are reported with the failing position and what the
//!   schema expected there.

pub mod document;
pub mod registry;
pub mod walker;

pub use document::{load_schema_file, SchemaDocument, TypeExpr, DOCUMENT_SCHEMA};
pub use registry::{
    create_path_registry, Addressing, PathRegistry, RegistryOptions, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_NODES,
};
pub use walker::{Grammar, GrammarNode, PathPattern, PatternSegment, ResolvedPath, Target};
