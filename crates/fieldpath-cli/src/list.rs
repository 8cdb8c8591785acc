//! # List Subcommand
//!
//! Prints the path grammar a schema admits, one pattern per line, with `*`
//! standing in for list positions. With `--json` each pattern is emitted as
//! an object carrying its target kind.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use fieldpath_schema::{PathPattern, PathRegistry};

use crate::{load_registry, RegistryArgs};

/// Arguments for the `fieldpath list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Schema document (YAML or JSON).
    #[arg(long, short = 's', value_name = "FILE")]
    pub schema: PathBuf,

    /// Emit a JSON array instead of plain lines.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

/// One listed pattern in `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternEntry {
    pub path: String,
    pub segments: Vec<String>,
    pub target: &'static str,
    pub terminal: bool,
}

impl From<&PathPattern> for PatternEntry {
    fn from(pattern: &PathPattern) -> Self {
        Self {
            path: pattern.to_string(),
            segments: pattern.segments.iter().map(ToString::to_string).collect(),
            target: pattern.target.kind_name(),
            terminal: pattern.is_terminal(),
        }
    }
}

/// Execute the list subcommand. Always returns exit code 0.
pub fn run_list(args: &ListArgs) -> Result<u8> {
    let registry = load_registry(&args.schema, &args.registry)?;
    println!("{}", render_patterns(&registry, args.json)?);
    Ok(0)
}

/// Render the registry's patterns as plain lines or a JSON array.
pub fn render_patterns(registry: &PathRegistry, json: bool) -> Result<String> {
    let patterns = registry.patterns();
    if json {
        let entries: Vec<PatternEntry> = patterns.iter().map(PatternEntry::from).collect();
        return serde_json::to_string_pretty(&entries).context("failed to serialize patterns");
    }
    let lines: Vec<String> = patterns.iter().map(ToString::to_string).collect();
    Ok(lines.join("\n"))
}
