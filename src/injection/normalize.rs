//! Entry injection normalization

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::{ChunkMap, AUTO_INJECTION_SENTINEL, DEFAULT_CHUNK_NAME};
use crate::error::{Error, Result};

/// Producer of an entry injection computed at resolution time
pub type InjectionFactory = Arc<dyn Fn() -> GivenInjection + Send + Sync>;

/// Entry injection as written in the configuration
#[derive(Clone)]
pub enum GivenInjection {
    /// Discover entries by scanning the asset directory
    Auto,
    /// One specifier, bundled into the `index` chunk
    Single(String),
    /// Several specifiers, bundled into the `index` chunk
    List(Vec<String>),
    /// Explicit chunk name to specifiers mapping
    Chunks(ChunkMap),
    /// Computed on demand; only available through the library API
    Computed(InjectionFactory),
}

impl fmt::Debug for GivenInjection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => formatter.write_str("Auto"),
            Self::Single(specifier) => formatter.debug_tuple("Single").field(specifier).finish(),
            Self::List(specifiers) => formatter.debug_tuple("List").field(specifiers).finish(),
            Self::Chunks(chunks) => formatter.debug_tuple("Chunks").field(chunks).finish(),
            Self::Computed(_) => formatter.write_str("Computed(<fn>)"),
        }
    }
}

impl PartialEq for GivenInjection {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Auto, Self::Auto) => true,
            (Self::Single(first), Self::Single(second)) => first == second,
            (Self::List(first), Self::List(second)) => first == second,
            (Self::Chunks(first), Self::Chunks(second)) => first == second,
            (Self::Computed(first), Self::Computed(second)) => Arc::ptr_eq(first, second),
            _ => false,
        }
    }
}

impl GivenInjection {
    /// Interpret the `injection.entry` configuration value.
    ///
    /// `null` means no entries. Chunk values may be one specifier or a list.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::List(Vec::new())),
            Value::String(specifier) if specifier == AUTO_INJECTION_SENTINEL => Ok(Self::Auto),
            Value::String(specifier) => Ok(Self::Single(specifier.clone())),
            Value::Array(items) => Ok(Self::List(specifier_list(items, "injection.entry")?)),
            Value::Object(map) => {
                let mut chunks = IndexMap::with_capacity(map.len());
                for (name, specifiers) in map {
                    let path = format!("injection.entry.{}", name);
                    let specifiers = match specifiers {
                        Value::String(specifier) => vec![specifier.clone()],
                        Value::Array(items) => specifier_list(items, &path)?,
                        Value::Null => Vec::new(),
                        other => return Err(shape_error(&path, other)),
                    };
                    chunks.insert(name.clone(), specifiers);
                }
                Ok(Self::Chunks(chunks))
            }
            other => Err(shape_error("injection.entry", other)),
        }
    }

    /// Configuration value form; computed injections are evaluated.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Auto => Value::String(AUTO_INJECTION_SENTINEL.to_string()),
            Self::Single(specifier) => Value::String(specifier.clone()),
            Self::List(specifiers) => Value::from(specifiers.clone()),
            Self::Chunks(chunks) => Value::Object(
                chunks
                    .iter()
                    .map(|(name, specifiers)| (name.clone(), Value::from(specifiers.clone())))
                    .collect(),
            ),
            Self::Computed(factory) => factory().to_value(),
        }
    }

    pub fn is_auto(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Computed(factory) => factory().is_auto(),
            _ => false,
        }
    }
}

/// Normalize a given injection into a chunk map.
///
/// Auto-discovery yields an empty map; discovery itself happens during
/// resolution. Otherwise chunks without specifiers are dropped, and if none
/// remain an empty `index` chunk is synthesized.
pub fn normalize(given: &GivenInjection) -> ChunkMap {
    let mut chunks: ChunkMap = match given {
        GivenInjection::Auto => return ChunkMap::new(),
        GivenInjection::Computed(factory) => return normalize(&factory()),
        GivenInjection::Single(specifier) => {
            ChunkMap::from([(DEFAULT_CHUNK_NAME.to_string(), vec![specifier.clone()])])
        }
        GivenInjection::List(specifiers) => {
            ChunkMap::from([(DEFAULT_CHUNK_NAME.to_string(), specifiers.clone())])
        }
        GivenInjection::Chunks(chunks) => chunks.clone(),
    };

    drop_empty_chunks(&mut chunks);
    chunks
}

/// Drop chunks without specifiers, keeping an empty `index` chunk if none
/// remain.
pub fn drop_empty_chunks(chunks: &mut ChunkMap) {
    chunks.retain(|_, specifiers| !specifiers.is_empty());
    if chunks.is_empty() {
        chunks.insert(DEFAULT_CHUNK_NAME.to_string(), Vec::new());
    }
}

fn specifier_list(items: &[Value], path: &str) -> Result<Vec<String>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(specifier) => Ok(specifier.clone()),
            other => Err(shape_error(&format!("{}[{}]", path, index), other)),
        })
        .collect()
}

fn shape_error(path: &str, value: &Value) -> Error {
    Error::ConfigurationShape {
        path: path.to_string(),
        message: format!("expected a module specifier or a list of them, found {}", value),
    }
}
