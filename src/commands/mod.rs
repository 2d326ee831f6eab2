//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `asset-composer` command-line tool. Each subcommand lives in its own file
//! with an `Args` struct derived using `clap` and an `execute` function that
//! calls into the `asset_composer` library.
//!
//! Commands that need a resolved configuration flatten [`LoadArgs`] into
//! their arguments, so every one of them accepts the same context, debug,
//! task and override options.

pub mod completions;
pub mod entries;
pub mod locate;
pub mod show;

use anyhow::{Context, Result};
use clap::Args;
use std::env;
use std::path::PathBuf;

use asset_composer::config::{load, LoadOptions, ResolvedConfiguration};

/// `NODE_ENV` values selecting debug mode.
const DEBUG_NODE_ENVIRONMENTS: &[&str] = &["debug", "dev", "development"];

/// Options controlling how the configuration is composed
#[derive(Args, Debug, Clone, Default)]
pub struct LoadArgs {
    /// Directory to discover the project context from.
    ///
    /// The nearest ancestor holding a `package.json` becomes the context.
    /// Defaults to the working directory.
    #[arg(long, value_name = "DIR", env = "ASSET_COMPOSER_CONTEXT")]
    pub context: Option<PathBuf>,

    /// Compose in debug mode.
    ///
    /// Also selected by `NODE_ENV=development` (or `debug`, `dev`) and
    /// `npm_config_dev=true`.
    #[arg(long, env = "ASSET_COMPOSER_DEBUG", overrides_with = "no_debug")]
    pub debug: bool,

    /// Compose in release mode, whatever the manifest says
    #[arg(long, overrides_with = "debug")]
    pub no_debug: bool,

    /// Task to compose for (build, serve, test, test:browser, document, ...)
    #[arg(long, value_name = "NAME")]
    pub task: Option<String>,

    /// JSON object merged over every other configuration layer
    #[arg(value_name = "JSON")]
    pub overrides: Option<String>,
}

impl LoadArgs {
    /// Explicit debug setting, if any.
    pub fn debug_override(&self) -> Option<bool> {
        if self.no_debug {
            return Some(false);
        }
        if self.debug || debug_requested_by_environment() {
            return Some(true);
        }
        None
    }

    pub fn to_options(&self) -> LoadOptions {
        let mut arguments = vec!["asset-composer".to_string()];
        arguments.extend(self.task.clone());
        LoadOptions {
            context: self.context.clone(),
            task: self.task.clone(),
            debug: self.debug_override(),
            cli_json: self.overrides.clone(),
            arguments,
            now: None,
        }
    }

    pub fn load(&self) -> Result<ResolvedConfiguration> {
        let options = self.to_options();
        load(&options).with_context(|| match &options.context {
            Some(context) => format!("Failed to compose configuration for {}", context.display()),
            None => "Failed to compose configuration".to_string(),
        })
    }
}

fn debug_requested_by_environment() -> bool {
    env::var("NODE_ENV").is_ok_and(|value| DEBUG_NODE_ENVIRONMENTS.contains(&value.as_str()))
        || env::var("npm_config_dev").is_ok_and(|value| value == "true")
}
