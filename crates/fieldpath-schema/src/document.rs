//! # Schema Documents
//!
//! Loads schema descriptions from JSON or YAML so an embedding application
//! can ship its form shapes as configuration instead of code.
//!
//! ```yaml
//! definitions:
//!   book:
//!     record:
//!       id: number
//!       name: string
//! root:
//!   name: string
//!   address: { tuple: [string, string] }
//!   books: { list: { ref: book } }
//! options:
//!   addressing: any
//! ```
//!
//! ## Trust Boundary
//!
//! Every document is checked against the embedded description schema
//! (`schemas/document.schema.json`, Draft 2020-12) before it is
//! deserialized. Violations are reported with the instance path of each
//! offending value.
//!
//! ## Definitions
//!
//! `ref` expands a named definition in place. A definition that reaches
//! itself again is a cycle, and a cyclic schema admits infinitely many
//! paths; it is rejected as a configuration error when the document is
//! resolved.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;

use fieldpath_core::{Record, ScalarKind, SchemaError, SchemaNode};
use serde::Deserialize;
use serde_json::Value;

use crate::registry::RegistryOptions;

/// The description format, embedded at compile time.
pub const DOCUMENT_SCHEMA: &str = include_str!("../schemas/document.schema.json");

/// A type expression inside a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Record(BTreeMap<String, TypeExpr>),
    Tuple(Vec<TypeExpr>),
    List(Box<TypeExpr>),
    Ref(String),
    #[serde(untagged)]
    Scalar(ScalarKind),
}

/// A parsed, unresolved schema document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub definitions: BTreeMap<String, TypeExpr>,
    pub root: BTreeMap<String, TypeExpr>,
    #[serde(default)]
    pub options: RegistryOptions,
}

impl SchemaDocument {
    /// Parse and check a JSON document.
    ///
    /// `source_name` identifies the document in error messages.
    pub fn from_json_str(text: &str, source_name: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(text).map_err(|e| SchemaError::Load {
            source_name: source_name.to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;
        Self::from_value(&value, source_name)
    }

    /// Parse and check a YAML document.
    pub fn from_yaml_str(text: &str, source_name: &str) -> Result<Self, SchemaError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| SchemaError::Load {
            source_name: source_name.to_string(),
            reason: format!("invalid YAML: {e}"),
        })?;
        let value = yaml_to_json_value(&yaml).map_err(|reason| SchemaError::Load {
            source_name: source_name.to_string(),
            reason: format!("YAML-to-JSON conversion failed: {reason}"),
        })?;
        Self::from_value(&value, source_name)
    }

    /// Check an already-parsed JSON value against the description schema
    /// and deserialize it.
    pub fn from_value(value: &Value, source_name: &str) -> Result<Self, SchemaError> {
        check_description(value, source_name)?;
        serde_json::from_value(value.clone()).map_err(|e| SchemaError::Load {
            source_name: source_name.to_string(),
            reason: format!("cannot deserialize schema document: {e}"),
        })
    }

    /// Load a document from disk. `.yaml` and `.yml` files are read as
    /// YAML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let source_name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
            source_name: source_name.clone(),
            reason: format!("cannot read file: {e}"),
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let document = match ext {
            "yaml" | "yml" => Self::from_yaml_str(&content, &source_name)?,
            _ => Self::from_json_str(&content, &source_name)?,
        };

        tracing::debug!(
            source = %source_name,
            definitions = document.definitions.len(),
            root_fields = document.root.len(),
            "loaded schema document"
        );
        Ok(document)
    }

    /// Expand every `ref` and build the schema tree.
    ///
    /// Expansion is bounded by the document's `max_depth` and `max_nodes`
    /// options, so a small document cannot unfold into an unbounded tree.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownDefinition`] for a `ref` to a missing name.
    /// - [`SchemaError::Cycle`] when definitions reach themselves.
    /// - [`SchemaError::DepthExceeded`] when a path would be longer than
    ///   `max_depth` segments.
    /// - [`SchemaError::SizeExceeded`] when the tree would have more than
    ///   `max_nodes` nodes.
    pub fn resolve(&self) -> Result<SchemaNode, SchemaError> {
        let mut resolver = Resolver {
            definitions: &self.definitions,
            max_depth: self.options.max_depth,
            max_nodes: self.options.max_nodes,
            nodes: 0,
            expanded: HashMap::new(),
            stack: Vec::new(),
        };
        resolver.charge(1, "(root)")?;
        let mut record = Record::new();
        for (name, expr) in &self.root {
            let (node, _) = resolver.expand(expr, 1, name)?;
            record.insert(name.clone(), node);
        }
        tracing::debug!(nodes = resolver.nodes, "resolved schema document");
        Ok(SchemaNode::Record(record))
    }
}

/// Load a schema document from disk and resolve it to a schema tree.
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<SchemaNode, SchemaError> {
    SchemaDocument::load(path.as_ref())?.resolve()
}

/// A fully expanded definition: the tree, its height below the point of
/// use, and its node count.
struct Expanded {
    node: SchemaNode,
    height: usize,
    size: usize,
}

struct Resolver<'d> {
    definitions: &'d BTreeMap<String, TypeExpr>,
    max_depth: usize,
    max_nodes: usize,
    nodes: usize,
    expanded: HashMap<&'d str, Rc<Expanded>>,
    stack: Vec<&'d str>,
}

impl<'d> Resolver<'d> {
    /// Expand `expr` sitting `depth` segments below the root. Returns the
    /// node and its height.
    fn expand(
        &mut self,
        expr: &'d TypeExpr,
        depth: usize,
        location: &str,
    ) -> Result<(SchemaNode, usize), SchemaError> {
        if let TypeExpr::Ref(name) = expr {
            return self.expand_ref(name, depth, location);
        }
        if depth > self.max_depth {
            return Err(SchemaError::DepthExceeded {
                limit: self.max_depth,
                location: location.to_string(),
            });
        }
        self.charge(1, location)?;

        let mut height = 0;
        let node = match expr {
            TypeExpr::Scalar(kind) => SchemaNode::Scalar(*kind),
            TypeExpr::Record(fields) => {
                let mut record = Record::new();
                for (name, child) in fields {
                    let (node, below) =
                        self.expand(child, depth + 1, &format!("{location}.{name}"))?;
                    height = height.max(below + 1);
                    record.insert(name.clone(), node);
                }
                SchemaNode::Record(record)
            }
            TypeExpr::Tuple(items) => {
                let mut nodes = Vec::with_capacity(items.len());
                for (index, child) in items.iter().enumerate() {
                    let (node, below) =
                        self.expand(child, depth + 1, &format!("{location}.{index}"))?;
                    height = height.max(below + 1);
                    nodes.push(node);
                }
                SchemaNode::Tuple(nodes)
            }
            TypeExpr::List(item) => {
                let (node, below) = self.expand(item, depth + 1, &format!("{location}.*"))?;
                height = below + 1;
                SchemaNode::List(Box::new(node))
            }
            TypeExpr::Ref(name) => return self.expand_ref(name, depth, location),
        };
        Ok((node, height))
    }

    fn expand_ref(
        &mut self,
        name: &'d str,
        depth: usize,
        location: &str,
    ) -> Result<(SchemaNode, usize), SchemaError> {
        let base = self.stack.len();
        let before = self.nodes;
        let result = self.follow(name, depth, location);
        let opened = self.stack.split_off(base);
        let (node, height) = result?;

        let entry = Rc::new(Expanded {
            node,
            height,
            size: self.nodes - before,
        });
        for key in opened {
            self.expanded.insert(key, Rc::clone(&entry));
        }
        Ok((entry.node.clone(), entry.height))
    }

    /// Follow a chain of aliases (`a: { ref: b }`) iteratively, then
    /// expand the first definition that is not itself a `ref`.
    fn follow(
        &mut self,
        mut name: &'d str,
        depth: usize,
        location: &str,
    ) -> Result<(SchemaNode, usize), SchemaError> {
        let definitions = self.definitions;
        loop {
            let Some((key, body)) = definitions.get_key_value(name) else {
                return Err(SchemaError::UnknownDefinition {
                    name: name.to_string(),
                    location: location.to_string(),
                });
            };
            let key = key.as_str();

            if let Some(start) = self.stack.iter().position(|open| *open == key) {
                let mut chain: Vec<String> =
                    self.stack[start..].iter().map(|s| s.to_string()).collect();
                chain.push(key.to_string());
                return Err(SchemaError::Cycle { chain });
            }

            // A cached tree that would overrun the depth limit here is
            // expanded again so the error names the exact location.
            if let Some(cached) = self.expanded.get(key).map(Rc::clone) {
                if depth + cached.height <= self.max_depth {
                    self.charge(cached.size, location)?;
                    return Ok((cached.node.clone(), cached.height));
                }
            }

            self.stack.push(key);
            match body {
                TypeExpr::Ref(next) => name = next.as_str(),
                other => return self.expand(other, depth, location),
            }
        }
    }

    fn charge(&mut self, count: usize, location: &str) -> Result<(), SchemaError> {
        self.nodes = self.nodes.saturating_add(count);
        if self.nodes > self.max_nodes {
            return Err(SchemaError::SizeExceeded {
                limit: self.max_nodes,
                location: location.to_string(),
            });
        }
        Ok(())
    }
}

fn check_description(value: &Value, source_name: &str) -> Result<(), SchemaError> {
    let schema: Value = serde_json::from_str(DOCUMENT_SCHEMA).map_err(|e| SchemaError::Load {
        source_name: "document.schema.json".to_string(),
        reason: format!("invalid JSON: {e}"),
    })?;

    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    let validator = opts.build(&schema).map_err(|e| SchemaError::Load {
        source_name: "document.schema.json".to_string(),
        reason: e.to_string(),
    })?;

    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|e| {
            let instance_path = e.instance_path.to_string();
            if instance_path.is_empty() {
                format!("  (root): {e}")
            } else {
                format!("  {instance_path}: {e}")
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Invalid {
            source_name: source_name.to_string(),
            violations,
        })
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Schema documents use only the JSON-compatible subset of YAML; tags are
/// ignored and number or boolean map keys are stringified. Errors name the
/// offending value by JSON pointer, as description violations do.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    convert_yaml(yaml, &mut String::new())
}

fn convert_yaml(yaml: &serde_yaml::Value, pointer: &mut String) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        format!("{}: cannot represent {n} in JSON", pointer_label(pointer))
                    })
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let mut items = Vec::with_capacity(seq.len());
            for (index, item) in seq.iter().enumerate() {
                let len = pointer.len();
                pointer.push_str(&format!("/{index}"));
                let converted = convert_yaml(item, pointer);
                pointer.truncate(len);
                items.push(converted?);
            }
            Ok(Value::Array(items))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => {
                        let at = pointer_label(pointer);
                        return Err(format!("{at}: unsupported map key {other:?}"));
                    }
                };
                if object.contains_key(&key) {
                    return Err(format!("{}: duplicate key '{key}'", pointer_label(pointer)));
                }
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                let converted = convert_yaml(v, pointer);
                pointer.truncate(len);
                object.insert(key, converted?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => convert_yaml(&tagged.value, pointer),
    }
}

fn pointer_label(pointer: &str) -> &str {
    if pointer.is_empty() {
        "(root)"
    } else {
        pointer
    }
}
