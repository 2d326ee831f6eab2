//! Shared test utilities for integration and E2E tests.
//!
//! This module provides project fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::ProjectFixture;
}

/// Common `package.json` contents for testing.
#[allow(dead_code)]
pub mod manifests {
    /// A named project without composer settings.
    pub const MINIMAL: &str = r#"{"name": "fixture"}"#;

    /// A project in debug mode.
    pub const DEBUG: &str = r#"{"name": "fixture", "assetComposer": {"debug": true}}"#;

    /// A library project with one bare dependency in its entry.
    pub const LIBRARY: &str = r#"{
    "name": "fixture-library",
    "assetComposer": {
        "library": true,
        "injection": {"entry": ["./source/index.js", "lodash"]}
    }
}"#;

    /// A project with explicit chunks and an alias.
    pub const CHUNKS: &str = r#"{
    "name": "fixture-chunks",
    "assetComposer": {
        "module": {"aliases": {"app$": "./source/index.js"}},
        "injection": {
            "entry": {"main": "app", "style": ["./source/style.css"], "empty": []}
        }
    }
}"#;
}

/// A temporary project directory with a manifest and source files.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = ProjectFixture::new()
///     .with_manifest(manifests::MINIMAL)
///     .with_file("source/index.js", "");
///
/// let mut cmd = fixture.command();
/// cmd.arg("show").assert().success();
/// ```
pub struct ProjectFixture {
    temp_dir: assert_fs::TempDir,
}

impl ProjectFixture {
    /// Create a fixture holding `source/index.js` and nothing else.
    pub fn new() -> Self {
        let fixture = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        fixture.with_file("source/index.js", "export default 1\n")
    }

    /// Write `package.json` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("package.json", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The canonical project directory, as the composer reports it.
    #[allow(dead_code)]
    pub fn context(&self) -> PathBuf {
        self.path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFixture {
    /// Create a command running in the fixture with a clean environment.
    ///
    /// Variables that select debug mode or the context are removed so the
    /// caller's shell cannot leak into the test.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("asset-composer");
        cmd.current_dir(self.context())
            .env_remove("NODE_ENV")
            .env_remove("npm_config_dev")
            .env_remove("ASSET_COMPOSER_DEBUG")
            .env_remove("ASSET_COMPOSER_CONTEXT")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_has_entry_file() {
        let fixture = ProjectFixture::new();
        assert!(fixture.path().join("source/index.js").exists());
    }

    #[test]
    fn test_manifests_are_valid_json() {
        for manifest in [
            manifests::MINIMAL,
            manifests::DEBUG,
            manifests::LIBRARY,
            manifests::CHUNKS,
        ] {
            serde_json::from_str::<serde_json::Value>(manifest).expect("Manifest should be JSON");
        }
    }
}
