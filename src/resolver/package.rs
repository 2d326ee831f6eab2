//! Package manifest lookup

use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::alias::AliasTable;
use super::path::{absolutize, is_file};

/// File name of a package manifest.
pub const PACKAGE_MANIFEST_FILE_NAME: &str = "package.json";

/// Upper bound for ancestor directory walks.
///
/// Walks stop here even when the filesystem root has not been reached.
pub const MAX_ASCENT_DEPTH: usize = 64;

/// Entry file and alias information declared by a package manifest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageEntry {
    /// Entry file named by the first matching main property
    pub file_name: Option<String>,
    /// Aliases from the first alias property holding a mapping
    pub aliases: AliasTable,
}

/// Read and parse a JSON manifest. Unreadable or malformed files yield `None`.
pub fn read_manifest(file_path: &Path, encoding: &str) -> Option<Value> {
    if !matches!(encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8") {
        debug!(
            "Reading {} as UTF-8 although '{}' is configured",
            file_path.display(),
            encoding
        );
    }
    let content = fs::read(file_path).ok()?;
    match serde_json::from_slice(&content) {
        Ok(value) => Some(value),
        Err(error) => {
            debug!("Ignoring malformed manifest {}: {}", file_path.display(), error);
            None
        }
    }
}

/// Determine the declared entry of the package in `directory`.
///
/// Main properties are checked before alias properties. A main property
/// counts when it holds a non-empty string. An alias property holding a
/// string also names the entry file when no main property did; one holding
/// a mapping provides aliases for the entry file name.
pub fn package_entry(
    directory: &Path,
    main_property_names: &[String],
    alias_property_names: &[String],
    encoding: &str,
) -> Option<PackageEntry> {
    let manifest_path = directory.join(PACKAGE_MANIFEST_FILE_NAME);
    if !is_file(&manifest_path) {
        return None;
    }
    let manifest = read_manifest(&manifest_path, encoding)?;

    let mut entry = PackageEntry {
        file_name: main_property_names.iter().find_map(|name| {
            manifest
                .get(name)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        }),
        aliases: AliasTable::default(),
    };

    for name in alias_property_names {
        match manifest.get(name) {
            Some(Value::String(file_name)) if entry.file_name.is_none() && !file_name.is_empty() => {
                entry.file_name = Some(file_name.clone());
                break;
            }
            Some(Value::Object(map)) => {
                entry.aliases = AliasTable::from_pairs(
                    map.iter()
                        .filter_map(|(key, value)| Some((key.clone(), value.as_str()?.to_string()))),
                );
                break;
            }
            _ => {}
        }
    }

    Some(entry)
}

/// Find the nearest `file_name` in `start` or one of at most `max_depth`
/// levels of its ancestors.
pub fn find_package_descriptor_file_path(
    start: &Path,
    file_name: &str,
    max_depth: usize,
) -> Option<PathBuf> {
    absolutize(start)
        .ancestors()
        .take(max_depth)
        .map(|directory| directory.join(file_name))
        .find(|candidate| is_file(candidate))
}
