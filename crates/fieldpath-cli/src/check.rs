//! # Check Subcommand
//!
//! Validates field paths against a schema document. Paths are given in dot
//! notation by default; with `--segmented` each argument is a JSON array of
//! segments or a JSON array of such arrays (a dependency list).
//!
//! ```text
//! $ fieldpath check --schema entity.yaml name address.2 books.3.name
//! OK    name
//! FAIL  address.2  TupleIndexOutOfRange: tuple index 2 at position 1 in 'address.2' is out of range for arity 2
//! OK    books.3.name
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fieldpath_core::{NamePath, PathError};
use fieldpath_schema::PathRegistry;

use crate::{load_registry, RegistryArgs};

/// Arguments for the `fieldpath check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema document (YAML or JSON).
    #[arg(long, short = 's', value_name = "FILE")]
    pub schema: PathBuf,

    /// Read each PATH as a JSON array of segments, or an array of arrays.
    #[arg(long)]
    pub segmented: bool,

    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Paths to check.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

/// Result of checking one command-line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// The argument as given.
    pub input: String,
    pub result: Result<(), PathError>,
}

impl CheckOutcome {
    pub fn render(&self) -> String {
        match &self.result {
            Ok(()) => format!("OK    {}", self.input),
            Err(err) => format!("FAIL  {}  {}: {err}", self.input, err.code()),
        }
    }
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 if every path is accepted, 1 otherwise.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let registry = load_registry(&args.schema, &args.registry)?;
    let outcomes = check_paths(&registry, &args.paths, args.segmented)?;

    let mut failed = 0usize;
    for outcome in &outcomes {
        println!("{}", outcome.render());
        if outcome.result.is_err() {
            failed += 1;
        }
    }

    if failed > 0 {
        println!("\n{failed} of {} path(s) rejected.", outcomes.len());
        Ok(1)
    } else {
        Ok(0)
    }
}

/// Check each input against `registry`.
///
/// # Errors
///
/// Fails if `segmented` is set and an input is not a JSON array of strings
/// or array of string arrays.
pub fn check_paths(
    registry: &PathRegistry,
    inputs: &[String],
    segmented: bool,
) -> Result<Vec<CheckOutcome>> {
    inputs
        .iter()
        .map(|input| {
            let result = if segmented {
                let name_path: NamePath = serde_json::from_str(input).with_context(|| {
                    format!("'{input}' is not a JSON array of segments or array of arrays")
                })?;
                tracing::debug!(paths = name_path.len(), "checking segmented input");
                registry.validate_name_path(name_path).map(|_| ())
            } else {
                registry.validate_string_path(input).map(|_| ())
            };
            Ok(CheckOutcome {
                input: input.clone(),
                result,
            })
        })
        .collect()
}
