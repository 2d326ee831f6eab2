//! Configuration layers and their sources

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::evaluate::expression::is_truthy;
use crate::merge::merge_into;
use crate::resolver::path::{is_file, resolve_path};

/// Task names that may carry a task-specific block.
pub const TASK_TYPES: &[&str] = &["build", "debug", "document", "serve", "test", "test:browser"];

/// Key of the composer's block inside a package manifest.
pub const MANIFEST_CONFIGURATION_KEY: &str = "assetComposer";

/// Key of a command line override naming configuration to splice in.
pub const REFERENCE_KEY: &str = "__reference__";

/// File name prefix of one-shot dynamic configuration files.
pub const DYNAMIC_CONFIGURATION_PREFIX: &str = ".dynamicConfiguration-";

/// Where a layer comes from, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Default,
    Debug,
    Library,
    Task,
    Manifest,
    DynamicFile,
    CliJson,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Default => "default",
            Self::Debug => "debug",
            Self::Library => "library",
            Self::Task => "task",
            Self::Manifest => "manifest",
            Self::DynamicFile => "dynamic-file",
            Self::CliJson => "cli-json",
        })
    }
}

/// A named partial configuration tree
///
/// Layers are never modified once built; applying one merges a copy of its
/// content into the target.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationLayer {
    pub kind: LayerKind,
    pub name: String,
    pub tree: Value,
}

impl ConfigurationLayer {
    pub fn new(kind: LayerKind, name: impl Into<String>, tree: Value) -> Self {
        Self {
            kind,
            name: name.into(),
            tree,
        }
    }

    /// Merge this layer onto `target`.
    pub fn apply_to(&self, target: &mut Value) -> Result<()> {
        debug!("Applying {} layer '{}'", self.kind, self.name);
        merge_into(target, &self.tree)
    }
}

/// Summary of an applied layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedLayer {
    pub kind: LayerKind,
    pub name: String,
}

impl From<&ConfigurationLayer> for AppliedLayer {
    fn from(layer: &ConfigurationLayer) -> Self {
        Self {
            kind: layer.kind,
            name: layer.name.clone(),
        }
    }
}

/// Whether the library layer applies.
///
/// An explicit manifest `library: true` enables it. When the manifest does
/// not mention `library` (or sets it to null), the merged default decides.
pub fn library_layer_applies(manifest_block: &Value, tree: &Value) -> bool {
    match manifest_block.get("library") {
        Some(Value::Bool(true)) => true,
        None | Some(Value::Null) => tree.get("library").is_some_and(is_truthy),
        Some(_) => false,
    }
}

/// The library layer, updated by a `library` mapping found in `tree`.
pub fn library_layer(packaged: &Value, tree: &Value) -> Result<ConfigurationLayer> {
    let mut library = packaged.clone();
    if let Some(update @ Value::Object(_)) = tree.get("library") {
        merge_into(&mut library, update)?;
    }
    Ok(ConfigurationLayer::new(LayerKind::Library, "library", library))
}

/// Path of the highest-numbered dynamic configuration file in `context`.
pub fn find_dynamic_configuration(context: &Path) -> Option<PathBuf> {
    (0..)
        .map(|count| context.join(format!("{}{}.json", DYNAMIC_CONFIGURATION_PREFIX, count)))
        .take_while(|candidate| is_file(candidate))
        .last()
}

/// Consume the dynamic configuration file of `context`, if any.
///
/// The file is deleted as soon as it has been read, so it is used at most
/// once even when it turns out to be malformed.
pub fn read_dynamic_configuration(context: &Path) -> Result<Option<Value>> {
    let Some(file_path) = find_dynamic_configuration(context) else {
        return Ok(None);
    };
    let failure = |message: String| Error::DynamicConfiguration {
        path: file_path.display().to_string(),
        message,
    };

    let content = fs::read_to_string(&file_path).map_err(|error| failure(error.to_string()))?;
    fs::remove_file(&file_path).map_err(|error| failure(format!("cannot delete: {}", error)))?;
    info!("Consumed dynamic configuration {}", file_path.display());

    let value: Value = serde_json::from_str(&content).map_err(|error| failure(error.to_string()))?;
    if !value.is_object() {
        return Err(failure("expected a JSON object".to_string()));
    }
    Ok(Some(value))
}

/// The `givenCommandLineArguments` recorded in a dynamic configuration.
///
/// `None` unless the entry is a list of strings.
pub fn given_command_line_arguments(dynamic: &Value) -> Option<Vec<String>> {
    dynamic
        .get("givenCommandLineArguments")?
        .as_array()?
        .iter()
        .map(|argument| argument.as_str().map(str::to_string))
        .collect()
}

/// The runtime layer: dynamic file content, or the given arguments.
pub fn runtime_layer(dynamic: Option<Value>, arguments: &[String]) -> ConfigurationLayer {
    match dynamic {
        Some(tree) => ConfigurationLayer::new(LayerKind::DynamicFile, "dynamic-file", tree),
        None => ConfigurationLayer::new(
            LayerKind::DynamicFile,
            "command-line",
            json!({ "givenCommandLineArguments": arguments }),
        ),
    }
}

/// Task blocks of `tree` to apply for `task`.
///
/// The `debug` block applies whenever debug mode is active. Blocks are
/// returned in [`TASK_TYPES`] order.
pub fn task_layers(tree: &Value, task: Option<&str>, debug: bool) -> Vec<ConfigurationLayer> {
    TASK_TYPES
        .iter()
        .filter(|task_type| task == Some(**task_type) || (debug && **task_type == "debug"))
        .filter_map(|task_type| match tree.get(*task_type) {
            Some(block @ Value::Object(_)) => Some(ConfigurationLayer::new(
                LayerKind::Task,
                *task_type,
                block.clone(),
            )),
            _ => None,
        })
        .collect()
}

/// Remove every task block holding a mapping from `tree`.
pub fn remove_task_blocks(tree: &mut Value) {
    if let Some(map) = tree.as_object_mut() {
        for task_type in TASK_TYPES {
            if map.get(*task_type).is_some_and(Value::is_object) {
                map.shift_remove(*task_type);
            }
        }
    }
}

/// Parse a command line override.
pub fn parse_cli_override(text: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(text).map_err(|error| Error::ConfigParse {
        message: format!("Invalid configuration override: {}", error),
        hint: Some("Pass the override as a JSON object, e.g. '{\"debug\": true}'".to_string()),
    })?;
    if !value.is_object() {
        return Err(Error::ConfigParse {
            message: format!("Configuration override must be a JSON object, found {}", value),
            hint: None,
        });
    }
    Ok(value)
}

/// Splice referenced configuration into a command line override.
///
/// `__reference__` names (one string or a list) are looked up as top-level
/// keys of `tree` first, then as JSON files relative to `context`. The
/// referenced content is merged into the override in the listed order.
pub fn resolve_references(overrides: &mut Value, tree: &Value, context: &Path) -> Result<()> {
    let Some(references) = overrides
        .as_object_mut()
        .and_then(|map| map.shift_remove(REFERENCE_KEY))
    else {
        return Ok(());
    };
    let names: Vec<String> = match references {
        Value::String(name) => vec![name],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(name),
                other => Err(reference_error(&other.to_string())),
            })
            .collect::<Result<_>>()?,
        other => return Err(reference_error(&other.to_string())),
    };

    for name in names {
        let referenced = match tree.get(&name) {
            Some(value) => value.clone(),
            None => read_reference_file(&name, context)?,
        };
        debug!("Splicing referenced configuration '{}'", name);
        merge_into(overrides, &referenced)?;
    }
    Ok(())
}

fn read_reference_file(name: &str, context: &Path) -> Result<Value> {
    let file_path = resolve_path(context, name);
    if !is_file(&file_path) {
        return Err(reference_error(name));
    }
    let content = fs::read_to_string(&file_path)?;
    serde_json::from_str(&content).map_err(|error| Error::ConfigParse {
        message: format!("Referenced file {} is malformed: {}", file_path.display(), error),
        hint: None,
    })
}

fn reference_error(name: &str) -> Error {
    Error::ConfigParse {
        message: format!("Unknown configuration reference {}", name),
        hint: Some("References name a top-level configuration key or an existing JSON file".to_string()),
    }
}

/// The manifest block, with the package name copied in.
///
/// A missing manifest yields the name `mockup`.
pub fn manifest_block(manifest: Option<&Value>) -> Value {
    let Some(manifest) = manifest else {
        warn!("No package manifest found, composing for a mockup project");
        return json!({ "name": "mockup" });
    };
    let mut block = match manifest.get(MANIFEST_CONFIGURATION_KEY) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    if let Some(name) = manifest.get("name") {
        block.insert("name".to_string(), name.clone());
    }
    Value::Object(block)
}
