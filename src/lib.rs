//! # Asset Composer Library
//!
//! This library composes the build configuration of a front-end project from
//! layered JSON trees and resolves the project's entry modules against the
//! filesystem. It is used by the `asset-composer` command-line tool but can
//! be embedded by any bundler-facing collaborator.
//!
//! ## Quick Example
//!
//! ```
//! use asset_composer::merge::merge;
//! use asset_composer::resolver::AliasTable;
//! use serde_json::json;
//!
//! // Later layers win; arrays are replaced, never concatenated
//! let merged = merge(
//!     &json!({"path": {"base": "./"}, "ignore": ["a"]}),
//!     &[&json!({"path": {"base": "./dev/"}, "ignore": ["b"]})],
//! )
//! .unwrap();
//! assert_eq!(merged, json!({"path": {"base": "./dev/"}, "ignore": ["b"]}));
//!
//! // Aliases rewrite the first occurrence of their key
//! let aliases = AliasTable::from_pairs([("a", "b")]);
//! assert_eq!(aliases.apply("bba"), "bbb");
//! ```
//!
//! ## Core Concepts
//!
//! - **Merging (`merge`)**: Ordered deep-merge of configuration layers, with
//!   modify directives and key-path navigation.
//! - **Evaluation (`evaluate`)**: Replaces `{"__evaluate__": ...}` nodes by
//!   the value of a small, sandboxed expression language.
//! - **Resolution (`resolver`)**: Aliases, replacement chains, loader-prefixed
//!   specifiers, package manifests and the module search itself.
//! - **Injection (`injection`)**: Normalizes the given entry points into
//!   chunks and resolves every module in them.
//! - **Build types (`build_types`)**: Asset kinds, the files they claim and
//!   the type of a given file.
//! - **Loading (`config`, `defaults`, `cache`)**: The layer pipeline that
//!   turns a project directory into a [`config::ResolvedConfiguration`].
//!
//! ## Execution Flow
//!
//! [`config::load`] runs these steps for one project:
//!
//! 1.  **Context**: Find the project directory and read its manifest.
//! 2.  **Layers**: Merge the packaged, task, manifest, dynamic and command
//!     line layers in precedence order.
//! 3.  **Paths**: Make the `path` block absolute.
//! 4.  **Evaluation**: Evaluate dynamic configuration nodes.
//! 5.  **Build types**: Consolidate the asset type descriptors.
//! 6.  **Injection**: Resolve entry modules into chunks, external modules
//!     and needed asset types.

pub mod build_types;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod error;
pub mod evaluate;
pub mod injection;
pub mod merge;
pub mod resolver;

#[cfg(test)]
mod path_proptest;
