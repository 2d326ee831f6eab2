//! Configuration tree merging
//!
//! This module hosts the ordered deep-merge used to compose configuration
//! layers, plus the key-path type shared by the merger, the dynamic
//! evaluator and the CLI for addressing nodes inside a configuration tree.
//!
//! ## Merge Rules
//!
//! - Mappings merge key by key, recursively.
//! - Arrays are replaced wholesale by the later layer.
//! - Scalars are overwritten.
//! - A layer mapping may carry modify directives (`__remove__`,
//!   `__prepend__`, `__append__`, `__replace__`) that rewrite the target
//!   before the ordinary merge of that mapping continues. See [`json`].
//!
//! ## Key Paths
//!
//! Key paths like `path.source.asset.base` or `files.html[0].filename` are
//! parsed into [`PathSegment`]s for navigation.

pub mod json;

pub use json::{merge, merge_into, remove_comment_keys};

use serde_json::Value;
use std::fmt;

/// A segment in a key path addressing a node of a configuration tree
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named key of a mapping
    Key(String),
    /// A position in an array
    Index(usize),
}

/// An owned key path, printable as `a.b[0].c`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<PathSegment>);

impl KeyPath {
    /// The empty path addressing the tree root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted key path.
    ///
    /// Supports dot notation (`a.b`), array indices (`a[0]`), quoted keys
    /// (`a["b.c"]`) and escaped dots (`a\.b`).
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = input.trim().chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                '.' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                    let mut inner = String::new();
                    for next in chars.by_ref() {
                        if next == ']' {
                            break;
                        }
                        inner.push(next);
                    }
                    let inner = inner.trim();
                    let unquoted = inner
                        .strip_prefix('"')
                        .and_then(|rest| rest.strip_suffix('"'))
                        .or_else(|| {
                            inner
                                .strip_prefix('\'')
                                .and_then(|rest| rest.strip_suffix('\''))
                        });
                    match (unquoted, inner.parse::<usize>()) {
                        (Some(key), _) => segments.push(PathSegment::Key(key.to_string())),
                        (None, Ok(index)) => segments.push(PathSegment::Index(index)),
                        (None, Err(_)) if !inner.is_empty() => {
                            segments.push(PathSegment::Key(inner.to_string()))
                        }
                        _ => {}
                    }
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::Key(current));
        }

        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Look up the node this path addresses.
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(value, |current, segment| match segment {
            PathSegment::Key(key) => current.as_object()?.get(key),
            PathSegment::Index(index) => current.as_array()?.get(*index),
        })
    }

    /// Mutable lookup of the node this path addresses.
    pub fn get_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        self.0
            .iter()
            .try_fold(value, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object_mut()?.get_mut(key),
                PathSegment::Index(index) => current.as_array_mut()?.get_mut(*index),
            })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for KeyPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}
