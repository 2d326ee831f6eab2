//! Module specifier resolution
//!
//! - [`path`]: filesystem probes and path string helpers
//! - [`alias`]: alias tables, replacement chains and request patterns
//! - [`package`]: package manifest lookup
//! - [`module`]: the resolver itself and external request classification

pub mod alias;
pub mod module;
pub mod package;
pub mod path;

pub use alias::{AliasTable, Replacement, ReplacementTable, RequestPattern};
pub use module::{
    Extensions, ExternalRequestOptions, FileExtensions, ModuleKind, ModuleResolver, ResolvedModule,
};
