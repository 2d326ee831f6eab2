//! # Show Command Implementation
//!
//! This module implements the `show` subcommand, which composes the project
//! configuration and prints it as pretty JSON. `--path` narrows the output
//! to one node of the tree, addressed like `path.source.base` or
//! `injection.entry.normalized.index[0]`.
//!
//! This command is read-only, apart from consuming a pending dynamic
//! configuration file like every composition does.

use anyhow::{anyhow, Result};
use clap::Args;
use serde_json::Value;

use super::LoadArgs;

/// Print the resolved configuration as JSON
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Key path of the node to print
    #[arg(long, value_name = "KEY_PATH")]
    pub path: Option<String>,

    /// Print the applied layers instead of the configuration
    #[arg(long, conflicts_with = "path")]
    pub layers: bool,

    #[command(flatten)]
    pub load: LoadArgs,
}

/// Execute the `show` command.
pub fn execute(args: ShowArgs) -> Result<()> {
    println!("{}", render(&args)?);
    Ok(())
}

fn render(args: &ShowArgs) -> Result<String> {
    let resolved = args.load.load()?;
    let value = if args.layers {
        serde_json::to_value(&resolved.layers)?
    } else if let Some(key_path) = &args.path {
        resolved
            .get(key_path)
            .cloned()
            .ok_or_else(|| anyhow!("No configuration value at '{}'", key_path))?
    } else {
        resolved.tree
    };
    Ok(match value {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other)?,
    })
}
