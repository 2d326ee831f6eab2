//! # Locate Command Implementation
//!
//! This module implements the `locate` subcommand, which resolves a single
//! module specifier with the project's aliases, replacements, extensions and
//! search locations, exactly as entry modules are resolved.
//!
//! A resolvable specifier the project leaves to the host environment, and an
//! unresolvable one matching an implicit external pattern, are reported as
//! external. Any other specifier resolving to no file is an error.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use super::LoadArgs;

/// Resolve a single module specifier
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Module specifier, optionally with loaders and query (`a!b!./file?x`)
    #[arg(value_name = "SPECIFIER")]
    pub specifier: String,

    /// Directory relative specifiers start from; defaults to the context.
    ///
    /// Relative paths are taken relative to the context.
    #[arg(long, value_name = "DIR")]
    pub context_dir: Option<PathBuf>,

    #[command(flatten)]
    pub load: LoadArgs,
}

/// Execute the `locate` command.
pub fn execute(args: LocateArgs) -> Result<()> {
    println!("{}", locate(&args)?);
    Ok(())
}

fn locate(args: &LocateArgs) -> Result<String> {
    let resolved = args.load.load()?;
    let context_dir = args
        .context_dir
        .clone()
        .unwrap_or_else(|| resolved.context.directory.clone());

    match resolved.determine_module_file_path(&args.specifier, Some(&context_dir)) {
        Some(file_path) => {
            match resolved.determine_external_request(&args.specifier, &context_dir) {
                Some(request) => Ok(format!("external {}", request)),
                None => Ok(file_path.display().to_string()),
            }
        }
        None if resolved.is_implicit_external(&args.specifier) => {
            Ok(format!("external {}", args.specifier))
        }
        None => bail!("Given request \"{}\" couldn't be resolved", args.specifier),
    }
}
