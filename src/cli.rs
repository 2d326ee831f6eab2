//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use crate::commands;

/// Asset Composer - Compose layered build configuration and resolve entry modules
#[derive(Parser, Debug)]
#[command(name = "asset-composer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace); `RUST_LOG` takes precedence
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved configuration as JSON
    Show(commands::show::ShowArgs),

    /// Resolve a single module specifier
    Locate(commands::locate::LocateArgs),

    /// Display the resolved entry chunks
    Entries(commands::entries::EntriesArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Show(args) => commands::show::execute(args),
            Commands::Locate(args) => commands::locate::execute(args),
            Commands::Entries(args) => commands::entries::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    // Only the first initialization in a process takes effect.
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}
