//! Node-style module resolution
//!
//! [`ModuleResolver`] turns one module specifier into an absolute file path:
//!
//! 1. Strip the loader chain and query (`style!css!./a.css?inline` → `./a.css`).
//! 2. Apply aliases, then the replacement chain (one pass each).
//! 3. Absolute requests are probed as is and `./`/`../` requests against the
//!    context directory. Bare names are probed in every module directory
//!    (`node_modules`) of the context and its ancestors, then in the base
//!    directory.
//! 4. Each candidate is tried literally, with every internal file extension
//!    appended, via its package manifest entry, and via the main file names.
//! 5. Candidates inside an ignored directory are rejected.
//!
//! The first surviving candidate wins. Nothing is cached: identical inputs on
//! an unchanged filesystem always give the same answer.

use log::trace;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::alias::{is_any_matching, AliasTable, ReplacementTable, RequestPattern};
use super::package::{package_entry, MAX_ASCENT_DEPTH};
use super::path::{
    absolutize, apply_context, is_directory, is_file, is_file_path_in_location, resolve_path,
    strip_loader, LoaderRequest,
};

/// File extensions considered during resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExtensions {
    /// Extensions probed for modules bundled into the build
    #[serde(default)]
    pub internal: Vec<String>,
    /// Extensions of modules that may be left to the host environment
    #[serde(default)]
    pub external: Vec<String>,
}

/// File and module extension sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extensions {
    #[serde(default)]
    pub file: FileExtensions,
    /// Module name suffixes probed before file extensions
    #[serde(default)]
    pub module: Vec<String>,
}

/// How a specifier was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleKind {
    /// Resolved to a local file, bundled into the build
    Internal,
    /// Left to the host environment
    External,
    /// Could not be resolved
    Unresolved,
}

/// Outcome of resolving one specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedModule {
    /// The specifier as given
    pub request: String,
    /// Absolute path, present exactly when `kind` is internal
    pub absolute_path: Option<PathBuf>,
    pub kind: ModuleKind,
    /// Asset type name of the resolved file, if any descriptor claims it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

impl ResolvedModule {
    pub fn internal(request: &str, absolute_path: PathBuf) -> Self {
        Self {
            request: request.to_string(),
            absolute_path: Some(absolute_path),
            kind: ModuleKind::Internal,
            asset_type: None,
        }
    }

    pub fn external(request: &str) -> Self {
        Self {
            request: request.to_string(),
            absolute_path: None,
            kind: ModuleKind::External,
            asset_type: None,
        }
    }

    pub fn unresolved(request: &str) -> Self {
        Self {
            request: request.to_string(),
            absolute_path: None,
            kind: ModuleKind::Unresolved,
            asset_type: None,
        }
    }
}

/// Which name to append to a candidate location
enum EntryName<'a> {
    Literal,
    Package,
    MainFile(&'a str),
}

/// Module resolver configured with aliases, extensions and search locations
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    pub aliases: AliasTable,
    pub replacements: ReplacementTable,
    pub extensions: Extensions,
    /// Directory `./` requests and module directory ascent start from
    pub context: PathBuf,
    /// Last-resort directory for bare requests
    pub base_dir: PathBuf,
    /// Absolute directories whose contents never resolve
    pub ignore_dirs: Vec<PathBuf>,
    pub module_dir_names: Vec<String>,
    pub main_file_names: Vec<String>,
    pub main_property_names: Vec<String>,
    pub alias_property_names: Vec<String>,
    pub encoding: String,
}

impl ModuleResolver {
    /// A resolver rooted at `context` with Node-like defaults.
    pub fn new(context: impl AsRef<Path>) -> Self {
        let context = absolutize(context.as_ref());
        Self {
            aliases: AliasTable::default(),
            replacements: ReplacementTable::default(),
            extensions: Extensions {
                file: FileExtensions {
                    internal: vec![".js".to_string(), ".json".to_string()],
                    external: vec![".js".to_string()],
                },
                module: Vec::new(),
            },
            base_dir: context.clone(),
            ignore_dirs: vec![context.join(".git")],
            context,
            module_dir_names: vec!["node_modules".to_string()],
            main_file_names: vec!["index".to_string()],
            main_property_names: vec!["main".to_string()],
            alias_property_names: Vec::new(),
            encoding: "utf-8".to_string(),
        }
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_replacements(mut self, replacements: ReplacementTable) -> Self {
        self.replacements = replacements;
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Set the base directory; relative paths resolve against the context.
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        self.base_dir = resolve_path(&self.context, base_dir);
        self
    }

    /// Set the ignored directories; relative paths resolve against the context.
    pub fn with_ignore_dirs<S: AsRef<Path>>(mut self, ignore_dirs: &[S]) -> Self {
        self.ignore_dirs = ignore_dirs
            .iter()
            .map(|dir| resolve_path(&self.context, dir))
            .collect();
        self
    }

    pub fn with_module_dir_names(mut self, names: Vec<String>) -> Self {
        self.module_dir_names = names;
        self
    }

    pub fn with_main_file_names(mut self, names: Vec<String>) -> Self {
        self.main_file_names = names;
        self
    }

    pub fn with_main_property_names(mut self, names: Vec<String>) -> Self {
        self.main_property_names = names;
        self
    }

    pub fn with_alias_property_names(mut self, names: Vec<String>) -> Self {
        self.alias_property_names = names;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Apply aliases and the replacement chain to the bare request of
    /// `specifier`.
    ///
    /// Whatever the replacements produce is used as is, including any
    /// loader chain or query they introduce.
    pub fn rewrite_request(&self, specifier: &str) -> String {
        self.replacements
            .apply(&self.aliases.apply(strip_loader(specifier)))
    }

    /// Resolve `specifier` to an absolute file path.
    ///
    /// `None` means "could not resolve"; callers must either classify the
    /// specifier external or report it, never drop it.
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        let request = self.rewrite_request(specifier);
        if request.is_empty() {
            return None;
        }

        let resolved = self
            .candidate_locations(&request)
            .into_iter()
            .find_map(|location| self.probe(&location));
        trace!("Resolved '{}' to {:?}", specifier, resolved);
        resolved
    }

    /// Resolve and classify `specifier` as internal or unresolved.
    pub fn classify(&self, specifier: &str) -> ResolvedModule {
        match self.resolve(specifier) {
            Some(path) => ResolvedModule::internal(specifier, path),
            None => ResolvedModule::unresolved(specifier),
        }
    }

    fn candidate_locations(&self, request: &str) -> Vec<PathBuf> {
        let path = Path::new(request);
        if path.is_absolute() {
            return vec![resolve_path(Path::new("/"), path)];
        }
        if is_explicitly_relative(request) {
            return vec![resolve_path(&self.context, path)];
        }

        let mut locations: Vec<PathBuf> = self
            .context
            .ancestors()
            .take(MAX_ASCENT_DEPTH)
            .flat_map(|directory| {
                self.module_dir_names
                    .iter()
                    .map(move |name| directory.join(name).join(request))
            })
            .collect();
        locations.push(self.base_dir.join(request));
        locations
    }

    fn probe(&self, location: &Path) -> Option<PathBuf> {
        let entry_names = [EntryName::Literal, EntryName::Package]
            .into_iter()
            .chain(
                self.main_file_names
                    .iter()
                    .map(|name| EntryName::MainFile(name.as_str())),
            );

        for entry_name in entry_names {
            let stem = match entry_name {
                EntryName::Literal => location.to_path_buf(),
                EntryName::Package => {
                    if !is_directory(location) {
                        continue;
                    }
                    let Some(entry) = package_entry(
                        location,
                        &self.main_property_names,
                        &self.alias_property_names,
                        &self.encoding,
                    ) else {
                        continue;
                    };
                    let Some(file_name) = entry.file_name else {
                        continue;
                    };
                    let file_name = self.replacements.apply(&entry.aliases.apply(&file_name));
                    resolve_path(location, file_name)
                }
                EntryName::MainFile(name) => {
                    let name = self.replacements.apply(name);
                    if name.is_empty() {
                        continue;
                    }
                    location.join(name)
                }
            };

            for module_extension in self.module_extensions() {
                for file_extension in self.file_extensions() {
                    let candidate = append_suffix(&stem, module_extension, file_extension);
                    if is_file_path_in_location(&candidate, &self.ignore_dirs) {
                        continue;
                    }
                    if is_file(&candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    fn module_extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions
            .module
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(""))
    }

    fn file_extensions(&self) -> impl Iterator<Item = &str> {
        std::iter::once("").chain(self.extensions.file.internal.iter().map(String::as_str))
    }

    /// Decide whether `request` should be left to the host environment.
    ///
    /// Returns the request to emit as external (re-expressed relative to
    /// `options.reference_path` via [`apply_context`]) or `None` when the
    /// module must be bundled. In order:
    ///
    /// 1. Requests that cannot be resolved (unless normal libraries are
    ///    bundled in place) or match an include pattern are external.
    /// 2. Requests matching an exclude pattern are internal.
    /// 3. Requests resolving to the same file as an entry module are internal.
    /// 4. Otherwise a request is external when normal libraries are not
    ///    bundled in place, its file extension is an external one, it does
    ///    not carry a loader chain (when dynamic libraries are bundled in
    ///    place), and it lies outside the context or inside an external
    ///    module location.
    pub fn determine_external_request(
        &self,
        request: &str,
        options: &ExternalRequestOptions<'_>,
    ) -> Option<String> {
        let bare = &request[LoaderRequest::parse(request).loaders.len()..];
        let resolved_request = self.replacements.apply(&self.aliases.apply(bare));
        let as_external = || {
            apply_context(
                &resolved_request,
                &options.request_context,
                &options.reference_path,
                &self.aliases,
                &self.replacements,
                &options.external_module_locations,
            )
        };

        let external_resolver = ModuleResolver {
            aliases: AliasTable::default(),
            replacements: ReplacementTable::default(),
            extensions: Extensions {
                file: FileExtensions {
                    internal: self.extensions.file.external.clone(),
                    external: self.extensions.file.external.clone(),
                },
                module: self.extensions.module.clone(),
            },
            context: options.request_context.clone(),
            base_dir: options.request_context.clone(),
            ..self.clone()
        };
        let file_path = external_resolver.resolve(&resolved_request);

        if (file_path.is_none() && !options.in_place_normal_library)
            || is_any_matching(&resolved_request, options.include_patterns)
        {
            return Some(as_external());
        }
        if is_any_matching(&resolved_request, options.exclude_patterns) {
            return None;
        }

        let entry_resolver = ModuleResolver {
            context: options.request_context.clone(),
            base_dir: options.request_context.clone(),
            ..self.clone()
        };
        if options
            .entry_modules
            .iter()
            .any(|module| entry_resolver.resolve(module) == file_path)
        {
            return None;
        }

        let external_extensions = &self.extensions.file.external;
        let has_external_extension = external_extensions.is_empty()
            || match &file_path {
                Some(path) => external_extensions.contains(&extension_of(path)),
                None => external_extensions.iter().any(String::is_empty),
            };
        let external_locations: Vec<PathBuf> = options
            .external_module_locations
            .iter()
            .map(|location| resolve_path(&self.context, location))
            .collect();
        let outside_package = match &file_path {
            Some(path) => {
                !path.starts_with(&self.context)
                    || is_file_path_in_location(path, &external_locations)
            }
            None => options.in_place_dynamic_library,
        };

        if !options.in_place_normal_library
            && has_external_extension
            && !(options.in_place_dynamic_library && request.contains('!'))
            && outside_package
        {
            return Some(as_external());
        }
        None
    }
}

/// Inputs to [`ModuleResolver::determine_external_request`]
#[derive(Debug, Clone)]
pub struct ExternalRequestOptions<'a> {
    /// Directory the request was issued from
    pub request_context: PathBuf,
    /// Directory external requests are re-expressed against
    pub reference_path: PathBuf,
    /// All entry module specifiers
    pub entry_modules: &'a [String],
    /// Module directories whose contents count as external libraries
    pub external_module_locations: Vec<String>,
    pub include_patterns: &'a [RequestPattern],
    pub exclude_patterns: &'a [RequestPattern],
    /// Bundle resolvable libraries instead of leaving them external
    pub in_place_normal_library: bool,
    /// Bundle loader-prefixed requests instead of leaving them external
    pub in_place_dynamic_library: bool,
}

impl<'a> ExternalRequestOptions<'a> {
    pub fn new(request_context: impl AsRef<Path>, entry_modules: &'a [String]) -> Self {
        let request_context = absolutize(request_context.as_ref());
        Self {
            reference_path: request_context.clone(),
            request_context,
            entry_modules,
            external_module_locations: vec!["node_modules".to_string()],
            include_patterns: &[],
            exclude_patterns: &[],
            in_place_normal_library: false,
            in_place_dynamic_library: true,
        }
    }
}

/// `true` for `.`, `..` and requests starting with `./` or `../`.
pub fn is_explicitly_relative(request: &str) -> bool {
    request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../")
}

/// `.ext` of a path, or the empty string.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default()
}

fn append_suffix(stem: &Path, module_extension: &str, file_extension: &str) -> PathBuf {
    let mut candidate = OsString::from(stem.as_os_str());
    candidate.push(module_extension);
    candidate.push(file_extension);
    PathBuf::from(candidate)
}
