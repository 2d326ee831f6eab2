//! # Error Handling
//!
//! This module defines the centralized error type for `asset-composer`. It
//! uses the `thiserror` library to build a single `Error` enum covering every
//! failure the composition pipeline can report.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Three variants are fatal configuration
//!   errors that abort a whole resolution run:
//!   - `ConfigurationShape`: two layers define the same key with shapes that
//!     cannot be merged and no modify directive resolves the conflict.
//!   - `UnresolvableModule`: a required entry module resolves to no file and
//!     is not allowed to be external.
//!   - `CyclicConfiguration`: layer input or a dynamic expression refers back
//!     to itself.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Filesystem probe failures during module resolution are not errors at all:
//! they are reported as "candidate does not exist" by the resolver.

use thiserror::Error;

/// Main error type for asset-composer operations
#[derive(Error, Debug)]
pub enum Error {
    /// Two layers define the same key with incompatible shapes.
    #[error("Configuration shape error at '{path}': {message}")]
    ConfigurationShape { path: String, message: String },

    /// A required module specifier could not be resolved to a file and does
    /// not match any implicit external pattern.
    #[error("Given request \"{request}\" in chunk \"{chunk}\" couldn't be resolved")]
    UnresolvableModule { request: String, chunk: String },

    /// Configuration input refers back to itself.
    #[error("Cyclic configuration detected: {cycle}")]
    CyclicConfiguration { cycle: String },

    /// The one-shot dynamic configuration file could not be consumed.
    #[error("Dynamic configuration file {path}: {message}")]
    DynamicConfiguration { path: String, message: String },

    /// A dynamic expression failed to parse or evaluate.
    #[error("Expression error in `{expression}`: {message}")]
    Expression { expression: String, message: String },

    /// A configuration source could not be parsed.
    ///
    /// Includes an optional hint about how to fix the input.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
