//! # Path Registry
//!
//! The two validation entry points consumed by collaborators (form
//! libraries, configuration layers, anything holding field references):
//!
//! - [`PathRegistry::validate_string_path`] for dot notation.
//! - [`PathRegistry::validate_segmented_path`] and
//!   [`PathRegistry::validate_segmented_paths`] for segmented notation, one
//!   path or a dependency list of paths.
//!
//! Both are pass-throughs: an accepted path is returned unchanged, a
//! rejected path fails fast with a [`PathError`]. A stale or mistyped field
//! reference is never silently accepted.
//!
//! ## Thread Safety
//!
//! `PathRegistry` is `Send + Sync` and cheap to clone. The grammar is
//! compiled once, at construction, and shared read-only behind an `Arc`.

use std::sync::Arc;

use fieldpath_core::{split_dotted, NamePath, PathError, SchemaError, SchemaNode};
use serde::{Deserialize, Serialize};

use crate::document::SchemaDocument;
use crate::walker::{Grammar, PathPattern, ResolvedPath};

/// Default limit on the number of segments in any path of a schema.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit on the number of nodes a schema document may expand to.
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// Which nodes a path may stop at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// Any node, composite or scalar. A whole tuple, list element, or
    /// sub-record may be referenced as a single field.
    #[default]
    Any,
    /// Only scalars and opaque terminals.
    TerminalOnly,
}

/// Registry construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryOptions {
    pub addressing: Addressing,
    pub max_depth: usize,
    /// Bounds `ref` expansion of a schema document; programmatic schemas
    /// are already materialized and are not counted.
    pub max_nodes: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            addressing: Addressing::Any,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Validates field paths against one schema's path grammar.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    grammar: Arc<Grammar>,
    options: RegistryOptions,
}

/// Construct a registry for `schema` with default options.
pub fn create_path_registry(schema: &SchemaNode) -> Result<PathRegistry, SchemaError> {
    PathRegistry::new(schema)
}

impl PathRegistry {
    /// Compile `schema` with default options.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the schema cannot be compiled; see
    /// [`Grammar::compile`].
    pub fn new(schema: &SchemaNode) -> Result<Self, SchemaError> {
        Self::with_options(schema, RegistryOptions::default())
    }

    pub fn with_options(schema: &SchemaNode, options: RegistryOptions) -> Result<Self, SchemaError> {
        let grammar = Grammar::compile(schema, options.max_depth)?;
        Ok(Self {
            grammar: Arc::new(grammar),
            options,
        })
    }

    /// Resolve a schema document's definitions and compile it with the
    /// document's own options.
    pub fn from_document(document: &SchemaDocument) -> Result<Self, SchemaError> {
        let schema = document.resolve()?;
        Self::with_options(&schema, document.options)
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Check a dot-notation path and hand it back unchanged.
    ///
    /// # Errors
    ///
    /// [`PathError::Malformed`] for separator misuse, otherwise the grammar
    /// rejection for the first failing segment.
    pub fn validate_string_path<'a>(&self, candidate: &'a str) -> Result<&'a str, PathError> {
        let checked = split_dotted(candidate).and_then(|segments| self.check(&segments));
        match checked {
            Ok(()) => Ok(candidate),
            Err(err) => {
                tracing::trace!(path = candidate, code = err.code(), error = %err, "path rejected");
                Err(err)
            }
        }
    }

    /// Check one segmented path and hand it back unchanged.
    pub fn validate_segmented_path<P, S>(&self, candidate: P) -> Result<P, PathError>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        match self.check(candidate.as_ref()) {
            Ok(()) => Ok(candidate),
            Err(err) => {
                tracing::trace!(code = err.code(), error = %err, "path rejected");
                Err(err)
            }
        }
    }

    /// Check every path of a dependency list and hand the list back
    /// unchanged. The list is accepted only if every path is.
    ///
    /// # Errors
    ///
    /// The rejection for the first failing path.
    pub fn validate_segmented_paths<P, S>(&self, candidates: Vec<P>) -> Result<Vec<P>, PathError>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        for candidate in &candidates {
            if let Err(err) = self.check(candidate.as_ref()) {
                tracing::trace!(code = err.code(), error = %err, "dependency path rejected");
                return Err(err);
            }
        }
        Ok(candidates)
    }

    /// Segmented validation for a value whose shape is only known at
    /// runtime (one path or many).
    pub fn validate_name_path(&self, candidate: NamePath) -> Result<NamePath, PathError> {
        for path in candidate.paths() {
            if let Err(err) = self.check(path) {
                tracing::trace!(code = err.code(), error = %err, "path rejected");
                return Err(err);
            }
        }
        Ok(candidate)
    }

    /// Resolve a dot-notation path to the node it addresses.
    pub fn resolve(&self, candidate: &str) -> Result<ResolvedPath, PathError> {
        let segments = split_dotted(candidate)?;
        let resolved = self.grammar.resolve(&segments)?;
        self.check_target(candidate, &resolved)?;
        Ok(resolved)
    }

    /// Membership test for segmented notation.
    pub fn is_valid_path<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.check(segments).is_ok()
    }

    /// Every pattern this registry accepts, list positions as wildcards.
    pub fn patterns(&self) -> Vec<PathPattern> {
        let mut patterns = self.grammar.patterns();
        if self.options.addressing == Addressing::TerminalOnly {
            patterns.retain(PathPattern::is_terminal);
        }
        patterns
    }

    fn check<S: AsRef<str>>(&self, segments: &[S]) -> Result<(), PathError> {
        let node = self.grammar.lookup(segments)?;
        if self.options.addressing == Addressing::TerminalOnly && !node.is_terminal() {
            return Err(PathError::CompositeTarget {
                path: fieldpath_core::join_dotted(segments),
                kind: node.target().kind_name().to_string(),
            });
        }
        Ok(())
    }

    fn check_target(&self, candidate: &str, resolved: &ResolvedPath) -> Result<(), PathError> {
        if self.options.addressing == Addressing::TerminalOnly && !resolved.target.is_terminal() {
            return Err(PathError::CompositeTarget {
                path: candidate.to_string(),
                kind: resolved.target.kind_name().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldpath_core::{FieldPath, ScalarKind};

    fn entity() -> SchemaNode {
        let text = SchemaNode::scalar(ScalarKind::String);
        SchemaNode::record([
            ("name", text.clone()),
            ("nickname", text.clone()),
            ("address", SchemaNode::tuple([text.clone(), text.clone()])),
            (
                "books",
                SchemaNode::list(SchemaNode::record([
                    ("id", SchemaNode::scalar(ScalarKind::Number)),
                    ("name", text),
                ])),
            ),
        ])
    }

    #[test]
    fn string_path_is_returned_unchanged() {
        let registry = create_path_registry(&entity()).unwrap();
        let path = String::from("books.2.name");
        let returned = registry.validate_string_path(&path).unwrap();
        assert_eq!(returned, "books.2.name");
        assert!(std::ptr::eq(returned, path.as_str()));
    }

    #[test]
    fn malformed_string_paths() {
        let registry = create_path_registry(&entity()).unwrap();
        for bad in ["", ".name", "name.", "books..0"] {
            let err = registry.validate_string_path(bad).unwrap_err();
            assert_eq!(err.code(), "MalformedPath", "{bad:?}");
        }
    }

    #[test]
    fn segmented_path_accepts_any_container() {
        let registry = create_path_registry(&entity()).unwrap();
        let array = registry.validate_segmented_path(["address", "0"]).unwrap();
        assert_eq!(array, ["address", "0"]);

        let owned = vec!["books".to_string(), "0".to_string()];
        assert_eq!(registry.validate_segmented_path(owned.clone()).unwrap(), owned);

        let path = FieldPath::from_segments(["nickname"]).unwrap();
        assert_eq!(registry.validate_segmented_path(path.clone()).unwrap(), path);

        let empty: [&str; 0] = [];
        assert_eq!(registry.validate_segmented_path(empty).unwrap_err(), PathError::Empty);
    }

    #[test]
    fn dependency_list_fails_on_first_bad_path() {
        let registry = create_path_registry(&entity()).unwrap();
        let deps = vec![vec!["address", "0"], vec!["address", "1"]];
        assert_eq!(registry.validate_segmented_paths(deps.clone()).unwrap(), deps);

        let deps = vec![vec!["address", "0"], vec!["address", "5"], vec!["nope"]];
        let err = registry.validate_segmented_paths(deps).unwrap_err();
        assert_eq!(err.code(), "TupleIndexOutOfRange");
    }

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_validator_traces_rejections() {
        let registry = PathRegistry::new(&entity()).unwrap();
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let many = NamePath::Many(vec![vec!["books".into(), "x".into()]]);
            assert!(registry.validate_name_path(many).is_err());
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("path rejected"), "{logs}");
        assert!(logs.contains("InvalidSegment"), "{logs}");
    }

    #[test]
    fn name_path_either_shape() {
        let registry = create_path_registry(&entity()).unwrap();
        let single = NamePath::Single(vec!["books".into(), "4".into(), "id".into()]);
        assert_eq!(registry.validate_name_path(single.clone()).unwrap(), single);

        let many = NamePath::Many(vec![vec!["name".into()], vec!["books".into(), "x".into()]]);
        assert_eq!(
            registry.validate_name_path(many).unwrap_err().code(),
            "InvalidSegment"
        );
    }

    #[test]
    fn terminal_only_rejects_composite_targets() {
        let options = RegistryOptions {
            addressing: Addressing::TerminalOnly,
            ..RegistryOptions::default()
        };
        let registry = PathRegistry::with_options(&entity(), options).unwrap();
        assert!(registry.validate_string_path("address.1").is_ok());
        match registry.validate_string_path("address").unwrap_err() {
            PathError::CompositeTarget { path, kind } => {
                assert_eq!(path, "address");
                assert_eq!(kind, "tuple");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(registry.resolve("books.0").is_err());
        assert!(registry.patterns().iter().all(PathPattern::is_terminal));
        assert_eq!(registry.patterns().len(), 6);
    }

    #[test]
    fn default_addressing_accepts_composites() {
        let registry = create_path_registry(&entity()).unwrap();
        assert!(registry.is_valid_path(&["address"]));
        assert!(registry.is_valid_path(&["books", "0"]));
        let resolved = registry.resolve("books").unwrap();
        assert!(!resolved.target.is_terminal());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: RegistryOptions = serde_json::from_str(r#"{"addressing":"terminal_only"}"#).unwrap();
        assert_eq!(options.addressing, Addressing::TerminalOnly);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!(serde_json::from_str::<RegistryOptions>(r#"{"depth":3}"#).is_err());
    }

    #[test]
    fn registry_is_send_sync_and_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PathRegistry>();

        let registry = create_path_registry(&entity()).unwrap();
        std::thread::scope(|scope| {
            for worker in 0..4usize {
                let registry = registry.clone();
                scope.spawn(move || {
                    for i in 0..100usize {
                        let path = format!("books.{}.name", worker * 100 + i);
                        assert!(registry.validate_string_path(&path).is_ok());
                        assert!(registry.validate_string_path("books.x").is_err());
                    }
                });
            }
        });
    }
}
