//! Filesystem probing and path normalization primitives
//!
//! Everything here is synchronous. Probe failures (permission errors, a file
//! vanishing between two checks) are reported as "does not exist".

use indexmap::IndexMap;
use path_clean::PathClean;
use std::fs;
use std::path::{Path, PathBuf};

use super::alias::{AliasTable, ReplacementTable};

/// Placeholders of output file path templates and their dummy substitution.
const DEFAULT_TEMPLATE_PLACEHOLDERS: &[&str] =
    &["[name]", "[id]", "[hash]", "[chunkhash]", "[contenthash]"];

/// Token substituted for placeholders without an explicit value.
pub const DUMMY_PLACEHOLDER_VALUE: &str = ".__dummy__";

/// `true` if `path` is a regular file, following symlinks.
pub fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}

/// `true` if `path` is a directory, following symlinks.
pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false)
}

/// `true` if `path` itself is a symbolic link.
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Make `path` absolute against the working directory and clean it
/// lexically.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.clean();
    }
    match std::env::current_dir() {
        Ok(current) => current.join(path).clean(),
        Err(_) => path.clean(),
    }
}

/// Resolve `path` against `base` the way a shell `cd base; realpath -m path`
/// would, without touching the filesystem.
pub fn resolve_path(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.clean()
    } else {
        absolutize(&base.join(path))
    }
}

/// Render a path as a string with a trailing separator.
pub fn with_trailing_separator(path: &Path) -> String {
    let mut rendered = path.to_string_lossy().into_owned();
    if !rendered.ends_with('/') {
        rendered.push('/');
    }
    rendered
}

/// `true` if `file_path` equals or lies inside any of `locations`.
///
/// Containment is component-wise: `/a` contains `/a/b` but not `/ab`.
pub fn is_file_path_in_location<P: AsRef<Path>>(file_path: &Path, locations: &[P]) -> bool {
    let file_path = absolutize(file_path);
    locations
        .iter()
        .any(|location| file_path.starts_with(absolutize(location.as_ref())))
}

/// Trailing-slash-insensitive, order-stable de-duplication of paths.
///
/// Each path is cleaned lexically first, so `a/` and `a` collapse and an
/// empty path becomes `.`.
pub fn normalize_paths<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for path in paths {
        let normalized = Path::new(path.as_ref())
            .clean()
            .to_string_lossy()
            .into_owned();
        if !normalized.is_empty() && !result.contains(&normalized) {
            result.push(normalized);
        }
    }
    result
}

/// A module specifier split into its loader chain, bare request and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderRequest<'a> {
    /// Everything up to and including the last `!`
    pub loaders: &'a str,
    /// The bare request
    pub request: &'a str,
    /// Everything from the first `?` after the last `!`
    pub query: &'a str,
}

impl<'a> LoaderRequest<'a> {
    pub fn parse(specifier: &'a str) -> Self {
        let split = specifier.rfind('!').map(|index| index + 1).unwrap_or(0);
        let (loaders, rest) = specifier.split_at(split);
        let (request, query) = match rest.find('?') {
            Some(index) => rest.split_at(index),
            None => (rest, ""),
        };
        Self {
            loaders,
            request,
            query,
        }
    }
}

/// Strip a loader chain prefix and query suffix from a specifier.
///
/// `imports?$=library!moduleName` becomes `moduleName`. A trailing bundler
/// layer marker such as `.webpack[javascript/auto]` is dropped as well.
pub fn strip_loader(specifier: &str) -> &str {
    let loaders = LoaderRequest::parse(specifier).loaders;
    let rest = strip_layer_suffix(&specifier[loaders.len()..]);
    LoaderRequest::parse(rest).request
}

const LAYER_MARKER: &str = ".webpack[";

/// `request` without a trailing `.webpack[<a>/<b>]` marker.
fn strip_layer_suffix(request: &str) -> &str {
    if !request.ends_with(']') {
        return request;
    }
    request
        .match_indices(LAYER_MARKER)
        .find(|(index, _)| {
            let layer = &request[index + LAYER_MARKER.len()..request.len() - 1];
            layer
                .match_indices('/')
                .any(|(slash, _)| slash > 0 && slash + 1 < layer.len())
        })
        .map(|(index, _)| &request[..index])
        .unwrap_or(request)
}

/// Substitute placeholders in an output file path template.
///
/// Placeholders missing from `scope` are replaced by
/// [`DUMMY_PLACEHOLDER_VALUE`].
pub fn render_file_path_template(template: &str, scope: &IndexMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for placeholder in DEFAULT_TEMPLATE_PLACEHOLDERS {
        if !scope.contains_key(*placeholder) {
            rendered = rendered.replace(placeholder, DUMMY_PLACEHOLDER_VALUE);
        }
    }
    for (placeholder, value) in scope {
        rendered = rendered.replace(placeholder.as_str(), value);
    }
    rendered
}

/// Re-express a `./`-relative request seen from `context` relative to
/// `reference_path`.
///
/// When the re-based request lies inside one of `module_locations` (relative
/// to `reference_path`) or inside `reference_path` itself, the prefix is
/// dropped and aliases plus replacements are applied to the remainder.
/// Requests that are not `./`-relative, or whose context already is the
/// reference path, are returned unchanged.
pub fn apply_context(
    request: &str,
    context: &Path,
    reference_path: &Path,
    aliases: &AliasTable,
    replacements: &ReplacementTable,
    module_locations: &[String],
) -> String {
    let reference_path = absolutize(reference_path);
    if !request.starts_with("./") || absolutize(context) == reference_path {
        return request.to_string();
    }

    let rebased = resolve_path(context, request);
    let mut prefixes: Vec<PathBuf> = module_locations
        .iter()
        .map(|location| resolve_path(&reference_path, location))
        .collect();
    prefixes.push(reference_path);

    for prefix in prefixes {
        if let Ok(remainder) = rebased.strip_prefix(&prefix) {
            let remainder = remainder.to_string_lossy();
            return replacements.apply(&aliases.apply(strip_loader(&remainder)));
        }
    }
    request.to_string()
}
