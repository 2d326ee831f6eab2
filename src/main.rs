//! # Asset Composer CLI
//!
//! This is the binary entry point for the `asset-composer` command-line tool.
//!
//! It parses the command line with `clap`, initializes logging and runs the
//! selected command. Composition and resolution live in the `asset_composer`
//! library; the binary only presents their results.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
