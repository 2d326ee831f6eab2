//! Asset build types
//!
//! A build type describes one asset kind (`javaScript`,
//! `cascadingStyleSheet`, ...) by its source extension, output extension and
//! an optional file path pattern. The configuration carries them under
//! `buildContext.types`, including a synthetic `default` descriptor that is
//! folded into every concrete descriptor by [`consolidate_build_types`].

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::merge::merge;
use crate::resolver::path::is_file_path_in_location;

/// Name of the descriptor merged under all others.
pub const DEFAULT_BUILD_TYPE: &str = "default";

/// Output extension of script bundles; these types sort first.
pub const SCRIPT_OUTPUT_EXTENSION: &str = "js";

/// One asset kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTypeDescriptor {
    /// Type name, filled in during consolidation
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Source file extension without leading dot
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub output_extension: String,
    /// Regular expression a file path must match; empty matches everything
    #[serde(default)]
    pub file_path_pattern: String,
}

impl BuildTypeDescriptor {
    fn pattern(&self) -> Result<Option<Regex>> {
        if self.file_path_pattern.is_empty() {
            return Ok(None);
        }
        Ok(Some(Regex::new(&self.file_path_pattern)?))
    }

    /// `true` if `file_path` has this type's extension and matches its pattern.
    pub fn claims(&self, file_path: &Path) -> Result<bool> {
        if extension_of(file_path) != self.extension {
            return Ok(false);
        }
        Ok(match self.pattern()? {
            Some(pattern) => pattern.is_match(&file_path.to_string_lossy()),
            None => true,
        })
    }
}

/// A build type together with the files it claims below the asset base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBuildType {
    #[serde(flatten)]
    pub descriptor: BuildTypeDescriptor,
    pub file_paths: Vec<PathBuf>,
}

/// Fold `buildContext.types.default` into every other descriptor and drop it.
///
/// Each descriptor becomes `default` ← `{extension: <name>}` ← descriptor ←
/// `{type: <name>}`.
pub fn consolidate_build_types(types: &mut Map<String, Value>) -> Result<()> {
    let defaults = types
        .shift_remove(DEFAULT_BUILD_TYPE)
        .unwrap_or_else(|| Value::Object(Map::new()));

    for (name, descriptor) in types.iter_mut() {
        let specific = merge(
            &json!({ "extension": name }),
            &[&*descriptor, &json!({ "type": name })],
        )?;
        *descriptor = merge(&defaults, &[&specific])?;
    }
    Ok(())
}

/// Typed view of consolidated `buildContext.types`.
pub fn build_types_from_value(types: &Value) -> Result<IndexMap<String, BuildTypeDescriptor>> {
    serde_json::from_value(types.clone()).map_err(|error| Error::ConfigParse {
        message: format!("Invalid build type descriptors: {}", error),
        hint: Some("Each entry of buildContext.types must be a mapping".to_string()),
    })
}

/// Name of the first build type claiming `file_path`.
///
/// A descriptor whose pattern matches wins over one that only shares the
/// extension. Directories and files without extension have no type.
pub fn determine_asset_type(
    file_path: &Path,
    types: &IndexMap<String, BuildTypeDescriptor>,
) -> Result<Option<String>> {
    let extension = extension_of(file_path);
    if extension.is_empty() {
        return Ok(None);
    }

    for (name, descriptor) in types {
        if let Some(pattern) = descriptor.pattern()? {
            if pattern.is_match(&file_path.to_string_lossy()) {
                return Ok(Some(name.clone()));
            }
        }
    }
    Ok(types
        .iter()
        .find(|(_, descriptor)| descriptor.extension == extension)
        .map(|(name, _)| name.clone()))
}

/// Collect the files below `base` claimed by each build type.
///
/// Files inside `ignore_dirs` are skipped. Within a type, files whose stem is
/// one of `main_file_names` come first. Types producing script bundles sort
/// before all others, the rest by extension.
pub fn resolve_build_configuration_file_paths(
    types: &IndexMap<String, BuildTypeDescriptor>,
    base: &Path,
    ignore_dirs: &[PathBuf],
    main_file_names: &[String],
) -> Result<Vec<ResolvedBuildType>> {
    let files: Vec<PathBuf> = WalkDir::new(base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_file_path_in_location(entry.path(), ignore_dirs))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                debug!("Skipping unreadable entry below {}: {}", base.display(), error);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    let mut resolved = Vec::with_capacity(types.len());
    for (name, descriptor) in types {
        let mut descriptor = descriptor.clone();
        if descriptor.type_name.is_empty() {
            descriptor.type_name = name.clone();
        }
        let mut file_paths = Vec::new();
        for file in &files {
            if descriptor.claims(file)? {
                file_paths.push(file.clone());
            }
        }
        file_paths.sort_by_key(|path| !is_main_file(path, main_file_names));
        resolved.push(ResolvedBuildType {
            descriptor,
            file_paths,
        });
    }

    resolved.sort_by(|first, second| {
        let first_script = first.descriptor.output_extension == SCRIPT_OUTPUT_EXTENSION;
        let second_script = second.descriptor.output_extension == SCRIPT_OUTPUT_EXTENSION;
        second_script
            .cmp(&first_script)
            .then_with(|| first.descriptor.extension.cmp(&second.descriptor.extension))
    });
    if resolved.iter().all(|build_type| build_type.file_paths.is_empty()) && !types.is_empty() {
        debug!("No asset files found below {}", base.display());
    }
    Ok(resolved)
}

fn is_main_file(path: &Path, main_file_names: &[String]) -> bool {
    path.file_stem()
        .map(|stem| main_file_names.iter().any(|name| stem == name.as_str()))
        .unwrap_or(false)
}

/// File extension without leading dot, or the empty string.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|extension| extension.to_string_lossy().into_owned())
        .unwrap_or_default()
}
