//! # fieldpath-cli — Command Line Interface
//!
//! Subcommand handlers for the `fieldpath` binary:
//!
//! - `fieldpath check`: validate field paths against a schema document.
//! - `fieldpath list`: print every path pattern a schema admits.
//!
//! Handlers return a process exit code: 0 on success, 1 when a path is
//! rejected, and errors (exit 2) for operational failures such as an
//! unreadable or invalid schema document.

pub mod check;
pub mod list;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use fieldpath_schema::{Addressing, PathRegistry, SchemaDocument};

/// Registry options that override the schema document's `options` block.
#[derive(Args, Debug, Default, Clone)]
pub struct RegistryArgs {
    /// Accept only paths that end at a scalar or opaque terminal.
    #[arg(long)]
    pub terminal_only: bool,

    /// Maximum number of segments in any path of the schema.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

/// Load a schema document, apply command-line overrides, and compile it.
pub fn load_registry(schema: &Path, overrides: &RegistryArgs) -> Result<PathRegistry> {
    let mut document = SchemaDocument::load(schema)
        .with_context(|| format!("failed to load schema document {}", schema.display()))?;

    if overrides.terminal_only {
        document.options.addressing = Addressing::TerminalOnly;
    }
    if let Some(max_depth) = overrides.max_depth {
        document.options.max_depth = max_depth;
    }

    let registry = PathRegistry::from_document(&document)
        .with_context(|| format!("failed to compile schema {}", schema.display()))?;

    tracing::info!(
        schema = %schema.display(),
        patterns = registry.grammar().pattern_count(),
        depth = registry.grammar().depth(),
        addressing = ?registry.options().addressing,
        "compiled path registry"
    );
    Ok(registry)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    /// Write the `Entity` schema document into `dir` and return its path.
    pub fn entity_schema(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("entity.yaml");
        std::fs::write(
            &path,
            r#"
definitions:
  book:
    record:
      id: number
      name: string
root:
  name: string
  nickname: string
  address: { tuple: [string, string] }
  books: { list: { ref: book } }
"#,
        )
        .unwrap();
        path
    }
}
