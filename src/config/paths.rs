//! Context discovery and absolute path building

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::evaluate::expression_source;
use crate::resolver::package::{find_package_descriptor_file_path, PACKAGE_MANIFEST_FILE_NAME};
use crate::resolver::path::{absolutize, resolve_path, with_trailing_separator};

/// Upper bound for the ascent looking for a package manifest.
pub const MAX_CONTEXT_ASCENT: usize = 32;

/// Name of package installation directories.
pub const MODULE_DIRECTORY_NAME: &str = "node_modules";

/// Suffix of precompiled DLL manifests.
pub const DLL_MANIFEST_SUFFIX: &str = ".dll-manifest.json";

/// Keys of a path group that are never resolved.
const LITERAL_PATH_KEYS: &[&str] = &["base", "public"];

/// How the context directory was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextType {
    /// The project being built
    Main,
    /// A package installed as a dependency of another project
    Dependency,
}

/// The project directory configuration is composed for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectContext {
    pub directory: PathBuf,
    pub context_type: ContextType,
}

/// Determine the project context for `start`.
///
/// A directory installed into a module directory (directly, or through a
/// `.staging` directory inside one) is its own context. Otherwise the
/// nearest ancestor holding a package manifest is, within
/// [`MAX_CONTEXT_ASCENT`] levels. Without one, `start` is used.
pub fn discover_context(start: &Path) -> ProjectContext {
    let start = absolutize(start);
    let parent_name = start.parent().and_then(Path::file_name);
    let grandparent_name = start
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name);
    let is_dependency = parent_name.is_some_and(|name| name == MODULE_DIRECTORY_NAME)
        || (parent_name.is_some_and(|name| name == ".staging")
            && grandparent_name.is_some_and(|name| name == MODULE_DIRECTORY_NAME));
    if is_dependency {
        debug!("{} is an installed dependency", start.display());
        return ProjectContext {
            directory: start,
            context_type: ContextType::Dependency,
        };
    }

    let directory =
        find_package_descriptor_file_path(&start, PACKAGE_MANIFEST_FILE_NAME, MAX_CONTEXT_ASCENT)
            .and_then(|manifest| manifest.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| start.clone());
    trace!("Context of {} is {}", start.display(), directory.display());
    ProjectContext {
        directory,
        context_type: ContextType::Main,
    }
}

/// Resolve every path of the `path` configuration block.
///
/// `base` resolves against `context`; other strings resolve against `base`
/// and gain a trailing separator. Nested groups resolve their own `base`
/// against the enclosing one first, then their members against it. Arrays,
/// `public` entries, the `configuration` group and expression nodes are left
/// untouched.
pub fn build_absolute_paths(paths: &mut Value, context: &Path) -> Result<()> {
    let Some(paths) = paths.as_object_mut() else {
        return Err(Error::ConfigurationShape {
            path: "path".to_string(),
            message: format!("expected a mapping, found {}", paths),
        });
    };

    paths.insert(
        "context".to_string(),
        Value::String(with_trailing_separator(context)),
    );
    let base = resolve_path(context, string_at(paths, "base"));
    paths.insert("base".to_string(), Value::String(with_trailing_separator(&base)));

    for (key, value) in paths.iter_mut() {
        if key == "base" || key == "context" {
            continue;
        }
        match value {
            Value::String(relative) => {
                *value = Value::String(with_trailing_separator(&resolve_path(&base, relative)));
            }
            Value::Object(_) if key != "configuration" && expression_source(value).is_none() => {
                resolve_group(value, &base);
            }
            _ => {}
        }
    }
    Ok(())
}

fn resolve_group(group: &mut Value, parent_base: &Path) {
    let Some(group) = group.as_object_mut() else {
        return;
    };
    let base = resolve_path(parent_base, string_at(group, "base"));
    group.insert("base".to_string(), Value::String(with_trailing_separator(&base)));

    for (key, value) in group.iter_mut() {
        if LITERAL_PATH_KEYS.contains(&key.as_str()) {
            continue;
        }
        match value {
            Value::String(relative) => {
                *value = Value::String(with_trailing_separator(&resolve_path(&base, relative)));
            }
            Value::Object(_) if expression_source(value).is_none() => resolve_group(value, &base),
            _ => {}
        }
    }
}

fn string_at<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Precompiled DLL manifests in `directory`, sorted.
pub fn dll_manifest_file_paths(directory: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };
    let mut manifests: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(DLL_MANIFEST_SUFFIX))
        })
        .collect();
    manifests.sort();
    manifests
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod context_tests {
        use super::*;

        #[test]
        fn test_dependency_context() {
            let temp = tempfile::tempdir().unwrap();
            let installed = temp.path().join("node_modules").join("library");
            fs::create_dir_all(&installed).unwrap();
            fs::write(temp.path().join("package.json"), "{}").unwrap();

            let context = discover_context(&installed);
            assert_eq!(context.directory, installed);
            assert_eq!(context.context_type, ContextType::Dependency);
        }

        #[test]
        fn test_staging_dependency_context() {
            let temp = tempfile::tempdir().unwrap();
            let staged = temp.path().join("node_modules/.staging/library");
            fs::create_dir_all(&staged).unwrap();
            assert_eq!(
                discover_context(&staged).context_type,
                ContextType::Dependency
            );
        }

        #[test]
        fn test_nearest_manifest_wins() {
            let temp = tempfile::tempdir().unwrap();
            let nested = temp.path().join("source/deep");
            fs::create_dir_all(&nested).unwrap();
            fs::write(temp.path().join("package.json"), "{}").unwrap();

            let context = discover_context(&nested);
            assert_eq!(context.directory, temp.path());
            assert_eq!(context.context_type, ContextType::Main);
        }
    }

    mod absolute_path_tests {
        use super::*;

        #[test]
        fn test_build_absolute_paths() {
            let mut paths = json!({
                "base": "",
                "context": "./",
                "apiDocumentation": "apiDocumentation",
                "ignore": [".git"],
                "configuration": {"javaScript": "webpack.js"},
                "source": {
                    "base": "source/",
                    "asset": {"base": "", "javaScript": "javaScript/"}
                },
                "target": {"base": "build", "public": "/", "manifest": "manifest"},
                "computed": {"__evaluate__": "'x'"}
            });
            build_absolute_paths(&mut paths, Path::new("/project")).unwrap();

            assert_eq!(
                paths,
                json!({
                    "base": "/project/",
                    "context": "/project/",
                    "apiDocumentation": "/project/apiDocumentation/",
                    "ignore": [".git"],
                    "configuration": {"javaScript": "webpack.js"},
                    "source": {
                        "base": "/project/source/",
                        "asset": {
                            "base": "/project/source/",
                            "javaScript": "/project/source/javaScript/"
                        }
                    },
                    "target": {
                        "base": "/project/build/",
                        "public": "/",
                        "manifest": "/project/build/manifest/"
                    },
                    "computed": {"__evaluate__": "'x'"}
                })
            );
        }

        #[test]
        fn test_base_relative_to_context() {
            let mut paths = json!({"base": "../shared", "source": {"base": "src"}});
            build_absolute_paths(&mut paths, Path::new("/project/app")).unwrap();
            assert_eq!(paths["base"], json!("/project/shared/"));
            assert_eq!(paths["source"]["base"], json!("/project/shared/src/"));
        }

        #[test]
        fn test_non_mapping_is_a_shape_error() {
            let mut paths = json!(["a"]);
            assert!(matches!(
                build_absolute_paths(&mut paths, Path::new("/project")),
                Err(Error::ConfigurationShape { .. })
            ));
        }
    }

    #[test]
    fn test_dll_manifest_file_paths() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("vendor.dll-manifest.json"), "{}").unwrap();
        fs::write(temp.path().join("app.dll-manifest.json"), "{}").unwrap();
        fs::write(temp.path().join("other.json"), "{}").unwrap();

        assert_eq!(
            dll_manifest_file_paths(temp.path()),
            vec![
                temp.path().join("app.dll-manifest.json"),
                temp.path().join("vendor.dll-manifest.json")
            ]
        );
        assert!(dll_manifest_file_paths(&temp.path().join("missing")).is_empty());
    }
}
