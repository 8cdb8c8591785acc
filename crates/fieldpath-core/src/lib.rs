//! # fieldpath-core — Foundational Types for fieldpath
//!
//! Defines the schema node model that path grammars are derived from, the
//! two path notations (dot and segmented), and the error taxonomy shared by
//! every other crate in the workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Explicit schema trees.** A [`SchemaNode`] is a tagged variant:
//!    `Scalar`, `Record`, `Tuple`, or `List`. Fixed tuples and open lists are
//!    declared, never guessed from a runtime value's shape.
//!
//! 2. **Opaque terminals are scalars.** `Date`, `File`, `FileList`, and
//!    `Bytes` are structurally composite but never descended into.
//!
//! 3. **Segments stay text until checked.** `"3"` is a field name under a
//!    record and an index under a tuple or list; only the grammar knows.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fieldpath-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod path;
pub mod schema;

// Re-export primary types for ergonomic imports.
pub use error::{FieldPathError, PathError, SchemaError};
pub use path::{join_dotted, parse_index, split_dotted, FieldPath, NamePath, Segment, SEPARATOR};
pub use schema::{check_field_name, Record, ScalarKind, SchemaNode};
