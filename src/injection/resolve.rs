//! Entry injection resolution
//!
//! [`InjectionResolver`] takes the `injection` configuration block through
//! these steps:
//!
//! 1. Normalize the given entry, or discover entries below the asset base
//!    when auto-discovery is requested.
//! 2. Remove `autoExclude` specifiers from every chunk.
//! 3. Expand specifiers naming a directory into the files it contains.
//! 4. Resolve every specifier. Unresolvable ones become external when they
//!    match an implicit external include pattern and no exclude pattern,
//!    otherwise resolution fails.
//! 5. De-duplicate each chunk, keeping first occurrences.

use indexmap::IndexMap;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::normalize::{drop_empty_chunks, normalize, GivenInjection};
use super::{deduplicate, ChunkMap, AUTO_INJECTION_SENTINEL, DEFAULT_CHUNK_NAME};
use crate::build_types::{
    determine_asset_type, resolve_build_configuration_file_paths, BuildTypeDescriptor,
};
use crate::error::{Error, Result};
use crate::resolver::alias::{is_any_matching, RequestPattern};
use crate::resolver::module::{is_explicitly_relative, ModuleResolver, ResolvedModule};
use crate::resolver::path::{is_directory, is_file_path_in_location, resolve_path, strip_loader};

fn auto_entry() -> Value {
    Value::String(AUTO_INJECTION_SENTINEL.to_string())
}

/// The `injection` configuration block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionSettings {
    /// Specifiers removed from every chunk
    #[serde(default)]
    pub auto_exclude: Vec<String>,
    /// Bundler chunk settings, passed through untouched
    #[serde(default)]
    pub chunks: Value,
    #[serde(default)]
    pub dll_chunk_names: Vec<String>,
    #[serde(default = "auto_entry")]
    pub entry: Value,
    /// Glob patterns, relative to the asset base, skipped by auto-discovery
    #[serde(default)]
    pub ignore_pattern: Vec<String>,
    #[serde(default)]
    pub implicit_external_include_pattern: Vec<RequestPattern>,
    #[serde(default)]
    pub implicit_external_exclude_pattern: Vec<RequestPattern>,
    /// Directory names matching this expression become their own chunk
    /// during auto-discovery
    #[serde(default)]
    pub own_chunk_directory_pattern: Option<String>,
}

impl Default for InjectionSettings {
    fn default() -> Self {
        Self {
            auto_exclude: Vec::new(),
            chunks: Value::Null,
            dll_chunk_names: Vec::new(),
            entry: auto_entry(),
            ignore_pattern: Vec::new(),
            implicit_external_include_pattern: Vec::new(),
            implicit_external_exclude_pattern: Vec::new(),
            own_chunk_directory_pattern: None,
        }
    }
}

/// Given and normalized entry injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryInjection {
    pub given: Value,
    pub normalized: ChunkMap,
}

/// Fully resolved injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionConfiguration {
    pub auto_exclude: Vec<String>,
    pub chunks: Value,
    pub dll_chunk_names: Vec<String>,
    /// Normalized chunks only hold internal modules
    pub entry: EntryInjection,
    /// Specifiers left to the host environment, in first-seen order
    pub external: Vec<String>,
    /// Classification of every entry specifier, per chunk
    pub modules: IndexMap<String, Vec<ResolvedModule>>,
}

impl InjectionConfiguration {
    /// Asset types of all internal entry modules.
    pub fn needed_asset_types(&self) -> IndexMap<String, bool> {
        self.modules
            .values()
            .flatten()
            .filter_map(|module| module.asset_type.clone())
            .map(|asset_type| (asset_type, true))
            .collect()
    }
}

/// Resolved entry module files and their directories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLocations {
    pub file_paths: Vec<PathBuf>,
    pub directory_paths: Vec<PathBuf>,
}

/// Resolves entry injections against the filesystem
///
/// Module resolution uses the resolver's own ignore list. Auto-discovery and
/// directory expansion use a separate, usually wider, list that also covers
/// module and loader directories.
#[derive(Debug)]
pub struct InjectionResolver<'a> {
    resolver: &'a ModuleResolver,
    build_types: &'a IndexMap<String, BuildTypeDescriptor>,
    discovery_ignore_dirs: Vec<PathBuf>,
}

impl<'a> InjectionResolver<'a> {
    pub fn new(
        resolver: &'a ModuleResolver,
        build_types: &'a IndexMap<String, BuildTypeDescriptor>,
    ) -> Self {
        Self {
            resolver,
            build_types,
            discovery_ignore_dirs: resolver.ignore_dirs.clone(),
        }
    }

    pub fn with_discovery_ignore_dirs(mut self, ignore_dirs: Vec<PathBuf>) -> Self {
        self.discovery_ignore_dirs = ignore_dirs;
        self
    }

    /// Resolve the injection described by `settings`.
    pub fn resolve(&self, settings: &InjectionSettings) -> Result<InjectionConfiguration> {
        let given = GivenInjection::from_value(&settings.entry)?;
        self.resolve_given(&given, settings)
    }

    /// Resolve an already interpreted entry injection; `settings.entry` is
    /// ignored.
    pub fn resolve_given(
        &self,
        given: &GivenInjection,
        settings: &InjectionSettings,
    ) -> Result<InjectionConfiguration> {
        let mut chunks = if given.is_auto() {
            self.auto_chunks(settings)?
        } else {
            normalize(given)
        };

        for specifiers in chunks.values_mut() {
            specifiers.retain(|specifier| {
                !is_auto_excluded(specifier, &settings.auto_exclude, &self.resolver.context)
            });
        }
        let mut chunks = self.resolve_modules_in_folders(&chunks);
        drop_empty_chunks(&mut chunks);

        let mut normalized = ChunkMap::with_capacity(chunks.len());
        let mut modules = IndexMap::with_capacity(chunks.len());
        let mut external: Vec<String> = Vec::new();
        for (chunk_name, specifiers) in &chunks {
            let mut internal = Vec::new();
            let mut classified = Vec::new();
            for specifier in deduplicate(specifiers) {
                let module = self.classify(&specifier, chunk_name, settings)?;
                match module.absolute_path {
                    Some(_) => internal.push(specifier),
                    None => {
                        if !external.contains(&specifier) {
                            external.push(specifier);
                        }
                    }
                }
                classified.push(module);
            }
            normalized.insert(chunk_name.clone(), internal);
            modules.insert(chunk_name.clone(), classified);
        }
        drop_empty_chunks(&mut normalized);
        modules.retain(|chunk_name, _| normalized.contains_key(chunk_name));
        for chunk_name in normalized.keys() {
            modules.entry(chunk_name.clone()).or_default();
        }

        info!(
            "Resolved {} entry chunk(s), {} external module(s)",
            normalized.len(),
            external.len()
        );
        Ok(InjectionConfiguration {
            auto_exclude: settings.auto_exclude.clone(),
            chunks: settings.chunks.clone(),
            dll_chunk_names: settings.dll_chunk_names.clone(),
            entry: EntryInjection {
                given: given.to_value(),
                normalized,
            },
            external,
            modules,
        })
    }

    fn classify(
        &self,
        specifier: &str,
        chunk_name: &str,
        settings: &InjectionSettings,
    ) -> Result<ResolvedModule> {
        if let Some(path) = self.resolver.resolve(specifier) {
            let asset_type = determine_asset_type(&path, self.build_types)?;
            let mut module = ResolvedModule::internal(specifier, path);
            module.asset_type = asset_type;
            return Ok(module);
        }
        if is_any_matching(specifier, &settings.implicit_external_include_pattern)
            && !is_any_matching(specifier, &settings.implicit_external_exclude_pattern)
        {
            debug!("Treating unresolvable '{}' as external", specifier);
            return Ok(ResolvedModule::external(specifier));
        }
        Err(Error::UnresolvableModule {
            request: specifier.to_string(),
            chunk: chunk_name.to_string(),
        })
    }

    /// Discover entry modules below the resolver's base directory.
    ///
    /// Every file claimed by a build type becomes a `./`-relative specifier in
    /// the `index` chunk, or in a chunk named after its directory when that
    /// name matches `ownChunkDirectoryPattern`.
    pub fn auto_chunks(&self, settings: &InjectionSettings) -> Result<ChunkMap> {
        let base = &self.resolver.base_dir;
        let resolved = resolve_build_configuration_file_paths(
            self.build_types,
            base,
            &self.discovery_ignore_dirs,
            &self.resolver.main_file_names,
        )?;
        let ignore_patterns = settings
            .ignore_pattern
            .iter()
            .map(|pattern| glob::Pattern::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let own_chunk_pattern = settings
            .own_chunk_directory_pattern
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
            .map(Regex::new)
            .transpose()?;

        let mut chunks = ChunkMap::new();
        for file_path in resolved.iter().flat_map(|build_type| &build_type.file_paths) {
            let relative = file_path.strip_prefix(base).unwrap_or(file_path);
            if ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(relative))
            {
                debug!("Auto-discovery skips ignored {}", file_path.display());
                continue;
            }

            let chunk_name = own_chunk_pattern
                .as_ref()
                .and_then(|pattern| own_chunk_name(file_path, base, pattern))
                .unwrap_or_else(|| DEFAULT_CHUNK_NAME.to_string());
            chunks
                .entry(chunk_name)
                .or_default()
                .push(relative_specifier(&self.resolver.context, file_path));
        }
        debug!("Auto-discovered chunks: {:?}", chunks.keys().collect::<Vec<_>>());
        Ok(chunks)
    }

    /// Replace specifiers naming a directory by the files inside it.
    ///
    /// Files are listed recursively in name order as `./`-relative
    /// specifiers. Directories inside the discovery ignore list are left
    /// untouched.
    pub fn resolve_modules_in_folders(&self, chunks: &ChunkMap) -> ChunkMap {
        chunks
            .iter()
            .map(|(chunk_name, specifiers)| {
                let expanded = specifiers
                    .iter()
                    .flat_map(|specifier| match self.directory_of(specifier) {
                        Some(directory) => self.files_in(&directory),
                        None => vec![specifier.clone()],
                    })
                    .collect();
                (chunk_name.clone(), expanded)
            })
            .collect()
    }

    fn directory_of(&self, specifier: &str) -> Option<PathBuf> {
        let request = self.resolver.rewrite_request(specifier);
        if request.is_empty() {
            return None;
        }
        let directory = if Path::new(&request).is_absolute() {
            resolve_path(Path::new("/"), &request)
        } else if is_explicitly_relative(&request) {
            resolve_path(&self.resolver.context, &request)
        } else {
            resolve_path(&self.resolver.base_dir, &request)
        };
        (is_directory(&directory)
            && !is_file_path_in_location(&directory, &self.discovery_ignore_dirs))
        .then_some(directory)
    }

    fn files_in(&self, directory: &Path) -> Vec<String> {
        WalkDir::new(directory)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !is_file_path_in_location(entry.path(), &self.discovery_ignore_dirs)
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| relative_specifier(&self.resolver.context, entry.path()))
            .collect()
    }

    /// Files and directories of every resolvable entry module.
    ///
    /// Unresolvable specifiers are skipped here; they are reported by
    /// [`InjectionResolver::resolve`].
    pub fn determine_module_locations(&self, chunks: &ChunkMap) -> ModuleLocations {
        let mut locations = ModuleLocations::default();
        for specifier in chunks.values().flatten() {
            let Some(file_path) = self.resolver.resolve(specifier) else {
                continue;
            };
            if let Some(directory) = file_path.parent() {
                if !locations.directory_paths.iter().any(|known| known == directory) {
                    locations.directory_paths.push(directory.to_path_buf());
                }
            }
            if !locations.file_paths.contains(&file_path) {
                locations.file_paths.push(file_path);
            }
        }
        locations
    }
}

fn own_chunk_name(file_path: &Path, base: &Path, pattern: &Regex) -> Option<String> {
    let directory = file_path.parent()?;
    if directory == base {
        return None;
    }
    let name = directory.file_name()?.to_str()?;
    pattern.is_match(name).then(|| name.to_string())
}

fn is_auto_excluded(specifier: &str, exclusions: &[String], context: &Path) -> bool {
    let is_path_like = |request: &str| request.starts_with('.') || request.starts_with('/');
    exclusions.iter().any(|exclusion| {
        if exclusion == specifier {
            return true;
        }
        let (exclusion, request) = (strip_loader(exclusion), strip_loader(specifier));
        is_path_like(exclusion)
            && is_path_like(request)
            && resolve_path(context, exclusion) == resolve_path(context, request)
    })
}

/// `./`-relative specifier of `file_path` seen from `context`, or the
/// absolute path when it lies outside.
fn relative_specifier(context: &Path, file_path: &Path) -> String {
    match file_path.strip_prefix(context) {
        Ok(relative) => {
            let components: Vec<String> = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("./{}", components.join("/"))
        }
        Err(_) => file_path.to_string_lossy().into_owned(),
    }
}
