//! # Configuration Loading
//!
//! [`load`] composes the resolved configuration of a project from its
//! layers, in this order (later layers win):
//!
//! 1. the packaged `default` layer,
//! 2. the packaged `debug` layer, in debug mode,
//! 3. the packaged `library` layer, for library projects,
//! 4. task blocks of the requested task (and `debug` in debug mode), taken
//!    from the merged tree and from the manifest block,
//! 5. the `assetComposer` block of the project's `package.json`,
//! 6. the one-shot dynamic configuration file, or the given arguments,
//! 7. the command line JSON override.
//!
//! The merged tree then has its comment keys removed, its `path` block made
//! absolute and its expression nodes evaluated. Finally build types are
//! consolidated and the entry injection is resolved against the filesystem.
//!
//! Loading is a pure function of [`LoadOptions`] and the filesystem, apart
//! from consuming the dynamic configuration file. Callers wanting to reuse a
//! result hold on to it, or use [`crate::cache::ConfigurationCache`].

pub mod layers;
pub mod paths;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::build_types::{build_types_from_value, consolidate_build_types, BuildTypeDescriptor};
use crate::defaults::{default_debug, packaged_layers};
use crate::error::{Error, Result};
use crate::evaluate::{evaluate, EvaluationContext};
use crate::injection::{
    InjectionConfiguration, InjectionResolver, InjectionSettings, ModuleLocations,
};
use crate::merge::{remove_comment_keys, KeyPath};
use crate::resolver::alias::is_any_matching;
use crate::resolver::package::{read_manifest, PACKAGE_MANIFEST_FILE_NAME};
use crate::resolver::path::{normalize_paths, resolve_path};
use crate::resolver::{
    AliasTable, Extensions, ExternalRequestOptions, ModuleResolver, ReplacementTable,
};
use layers::{
    given_command_line_arguments, library_layer, library_layer_applies, manifest_block,
    parse_cli_override,
    read_dynamic_configuration, remove_task_blocks, resolve_references, runtime_layer,
    task_layers, AppliedLayer, ConfigurationLayer, LayerKind,
};
use paths::{build_absolute_paths, discover_context, dll_manifest_file_paths, ProjectContext};

/// Tasks for which precompiled DLL bundles are worth building.
const DLL_TASKS: &[&str] = &["build:dll", "watch:dll"];

/// Tasks able to use existing DLL manifests.
const DLL_CONSUMING_TASKS: &[&str] = &["build", "serve", "test:browser"];

/// Tasks that always need the script build type in debug mode.
const SCRIPT_DEBUG_TASKS: &[&str] = &["serve", "test:browser"];

/// Explicit input of [`load`]
///
/// `arguments` follows the `[program, task, ..., override]` convention: when
/// `task` or `cli_json` are not given, the second argument names the task and
/// the last of more than two arguments is the JSON override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    /// Directory to start context discovery from; defaults to the working
    /// directory
    pub context: Option<PathBuf>,
    pub task: Option<String>,
    /// Overrides the manifest's and the packaged debug setting
    pub debug: Option<bool>,
    pub cli_json: Option<String>,
    pub arguments: Vec<String>,
    /// Time seen by expressions; defaults to the current time
    pub now: Option<DateTime<Utc>>,
}

impl LoadOptions {
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::default()
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn with_cli_json(mut self, json: impl Into<String>) -> Self {
        self.cli_json = Some(json.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn effective_task(&self, arguments: &[String]) -> Option<String> {
        self.task.clone().or_else(|| arguments.get(1).cloned())
    }

    fn effective_cli_json(&self, arguments: &[String]) -> Option<String> {
        self.cli_json.clone().or_else(|| {
            (arguments.len() > 2)
                .then(|| arguments.last().cloned())
                .flatten()
        })
    }
}

/// The `module` configuration block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleSettings {
    pub aliases: AliasTable,
    pub directory_names: Vec<String>,
    pub replacements: ReplacementSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementSettings {
    pub normal: ReplacementTable,
}

/// The `package` configuration block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageSettings {
    pub alias_property_names: Vec<String>,
    pub main: PackageMainSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageMainSettings {
    pub file_names: Vec<String>,
    pub property_names: Vec<String>,
}

/// A fully composed and resolved project configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfiguration {
    /// The complete tree, including the resolved sections below
    pub tree: Value,
    pub context: ProjectContext,
    pub debug: bool,
    pub task: Option<String>,
    /// Layers in application order
    pub layers: Vec<AppliedLayer>,
    pub build_types: IndexMap<String, BuildTypeDescriptor>,
    pub injection: InjectionConfiguration,
    pub module_locations: ModuleLocations,
    /// Asset types the entry modules need built
    pub needed: IndexMap<String, bool>,
    pub dll_manifest_file_paths: Vec<PathBuf>,
    injection_settings: InjectionSettings,
    module_resolver: ModuleResolver,
}

impl ResolvedConfiguration {
    /// Value at a dotted key path like `path.source.base` or `a.b[0]`.
    pub fn get(&self, key_path: &str) -> Option<&Value> {
        KeyPath::parse(key_path).get(&self.tree)
    }

    /// The resolver entry modules were resolved with.
    pub fn module_resolver(&self) -> &ModuleResolver {
        &self.module_resolver
    }

    /// Resolve a single specifier the way entry modules are resolved.
    ///
    /// `context_dir` replaces the project context as the directory relative
    /// requests start from; the base directory is the context itself, since
    /// entry specifiers are already rewritten relative to it.
    pub fn determine_module_file_path(
        &self,
        specifier: &str,
        context_dir: Option<&Path>,
    ) -> Option<PathBuf> {
        let mut resolver = self.module_resolver.clone();
        if let Some(context_dir) = context_dir {
            resolver.context = resolve_path(&self.context.directory, context_dir);
        }
        resolver.base_dir = resolver.context.clone();
        resolver.resolve(specifier)
    }

    /// Whether `specifier` is left to the host environment, and as which
    /// request.
    pub fn determine_external_request(&self, specifier: &str, context_dir: &Path) -> Option<String> {
        let entry_modules: Vec<String> = self
            .injection
            .entry
            .normalized
            .values()
            .flatten()
            .cloned()
            .collect();
        let settings = &self.injection_settings;
        let request_context = resolve_path(&self.context.directory, context_dir);
        let mut options = ExternalRequestOptions::new(&request_context, &entry_modules);
        options.include_patterns = &settings.implicit_external_include_pattern;
        options.exclude_patterns = &settings.implicit_external_exclude_pattern;
        options.in_place_normal_library = self.flag("inPlace.externalLibrary.normal", false);
        options.in_place_dynamic_library = self.flag("inPlace.externalLibrary.dynamic", true);
        self.module_resolver
            .determine_external_request(specifier, &options)
    }

    /// Whether an unresolvable `specifier` may be left to the host
    /// environment.
    pub fn is_implicit_external(&self, specifier: &str) -> bool {
        let settings = &self.injection_settings;
        is_any_matching(specifier, &settings.implicit_external_include_pattern)
            && !is_any_matching(specifier, &settings.implicit_external_exclude_pattern)
    }

    fn flag(&self, key_path: &str, default: bool) -> bool {
        self.get(key_path).and_then(Value::as_bool).unwrap_or(default)
    }
}

/// Compose the configuration of the project found from `options.context`.
pub fn load(options: &LoadOptions) -> Result<ResolvedConfiguration> {
    let start = match &options.context {
        Some(directory) => directory.clone(),
        None => std::env::current_dir()?,
    };
    let context = discover_context(&start);
    info!(
        "Composing configuration for {} ({:?})",
        context.directory.display(),
        context.context_type
    );

    let packaged = packaged_layers()?;
    let manifest = read_manifest(&context.directory.join(PACKAGE_MANIFEST_FILE_NAME), "utf-8");
    let mut manifest_block = manifest_block(manifest.as_ref());
    let debug = options
        .debug
        .or_else(|| manifest_block.get("debug").and_then(Value::as_bool))
        .unwrap_or_else(|| default_debug(&packaged));
    let dynamic = read_dynamic_configuration(&context.directory)?;
    let arguments = dynamic
        .as_ref()
        .and_then(given_command_line_arguments)
        .unwrap_or_else(|| options.arguments.clone());
    let task = options.effective_task(&arguments);
    debug!("Debug mode {}, task {:?}", debug, task);

    let mut tree = Value::Object(Map::new());
    let mut applied = Vec::new();
    apply_layer(
        &mut tree,
        &mut applied,
        ConfigurationLayer::new(LayerKind::Default, "default", packaged.default.clone()),
    )?;
    if debug {
        apply_layer(
            &mut tree,
            &mut applied,
            ConfigurationLayer::new(LayerKind::Debug, "debug", packaged.debug.clone()),
        )?;
    }
    if library_layer_applies(&manifest_block, &tree) {
        let layer = library_layer(&packaged.library, &tree)?;
        apply_layer(&mut tree, &mut applied, layer)?;
    }

    let runtime = runtime_layer(dynamic, &arguments);

    for layer in task_layers(&tree, task.as_deref(), debug) {
        apply_layer(&mut tree, &mut applied, layer)?;
    }
    for mut layer in task_layers(&manifest_block, task.as_deref(), debug) {
        layer.name = format!("manifest:{}", layer.name);
        apply_layer(&mut manifest_block, &mut applied, layer)?;
    }
    remove_task_blocks(&mut tree);
    remove_task_blocks(&mut manifest_block);

    apply_layer(
        &mut tree,
        &mut applied,
        ConfigurationLayer::new(LayerKind::Manifest, "manifest", manifest_block),
    )?;
    apply_layer(&mut tree, &mut applied, runtime)?;

    if let Some(text) = options.effective_cli_json(&arguments) {
        let mut overrides = parse_cli_override(&text)?;
        resolve_references(&mut overrides, &tree, &context.directory)?;
        apply_layer(
            &mut tree,
            &mut applied,
            ConfigurationLayer::new(LayerKind::CliJson, "cli-json", overrides),
        )?;
    }

    remove_comment_keys(&mut tree);
    let map = object_mut(&mut tree, "")?;
    map.insert("debug".to_string(), Value::Bool(debug));
    map.insert("contextType".to_string(), serde_json::to_value(context.context_type)?);

    let path_block = tree.get_mut("path").ok_or_else(|| Error::ConfigurationShape {
        path: "path".to_string(),
        message: "missing".to_string(),
    })?;
    build_absolute_paths(path_block, &context.directory)?;

    let dll_manifest_file_paths = string_at(&tree, "path.target.base")
        .map(|target| dll_manifest_file_paths(Path::new(target)))
        .unwrap_or_default();
    object_mut(&mut tree, "")?.insert(
        "dllManifestFilePaths".to_string(),
        serde_json::to_value(&dll_manifest_file_paths)?,
    );

    let is_dll_useful = task.as_deref().is_some_and(|task| {
        DLL_TASKS.contains(&task)
            || (!dll_manifest_file_paths.is_empty() && DLL_CONSUMING_TASKS.contains(&task))
    });
    let evaluation_context =
        EvaluationContext::new(&context.directory, options.now.unwrap_or_else(Utc::now))
            .with_debug(debug)
            .with_task(task.clone().unwrap_or_default())
            .with_variable("isDLLUseful", Value::Bool(is_dll_useful));
    evaluate(&mut tree, &evaluation_context)?;

    let types = object_mut(&mut tree, "buildContext.types")?;
    consolidate_build_types(types)?;
    let build_types = build_types_from_value(&Value::Object(types.clone()))?;

    let module_resolver = module_resolver_for(&tree, &context.directory)?;
    let discovery_ignore_dirs = discovery_ignore_dirs(&tree, &context.directory)?;
    let settings: InjectionSettings = section(&tree, "injection")?;
    let injection_resolver = InjectionResolver::new(&module_resolver, &build_types)
        .with_discovery_ignore_dirs(discovery_ignore_dirs);
    let injection = injection_resolver.resolve(&settings)?;
    let module_locations = injection_resolver.determine_module_locations(&injection.entry.normalized);

    let mut needed = IndexMap::from([(
        "javaScript".to_string(),
        debug && task.as_deref().is_some_and(|task| SCRIPT_DEBUG_TASKS.contains(&task)),
    )]);
    needed.extend(injection.needed_asset_types());

    let map = object_mut(&mut tree, "")?;
    map.insert("injection".to_string(), serde_json::to_value(&injection)?);
    map.insert("needed".to_string(), serde_json::to_value(&needed)?);
    object_mut(&mut tree, "module")?.insert(
        "locations".to_string(),
        serde_json::to_value(&module_locations)?,
    );

    info!(
        "Resolved configuration from {} layer(s), {} build type(s)",
        applied.len(),
        build_types.len()
    );
    Ok(ResolvedConfiguration {
        tree,
        context,
        debug,
        task,
        layers: applied,
        build_types,
        injection,
        module_locations,
        needed,
        dll_manifest_file_paths,
        injection_settings: settings,
        module_resolver,
    })
}

fn apply_layer(
    target: &mut Value,
    applied: &mut Vec<AppliedLayer>,
    layer: ConfigurationLayer,
) -> Result<()> {
    layer.apply_to(target)?;
    applied.push(AppliedLayer::from(&layer));
    Ok(())
}

/// The resolver entry modules are resolved with.
fn module_resolver_for(tree: &Value, context: &Path) -> Result<ModuleResolver> {
    let module: ModuleSettings = section(tree, "module")?;
    let package: PackageSettings = section(tree, "package")?;
    let extensions: Extensions = section(tree, "extensions")?;
    let ignore: Vec<String> = section(tree, "path.ignore")?;

    let mut resolver = ModuleResolver::new(context)
        .with_aliases(module.aliases)
        .with_replacements(module.replacements.normal)
        .with_extensions(extensions)
        .with_ignore_dirs(&ignore)
        .with_module_dir_names(module.directory_names)
        .with_main_file_names(package.main.file_names)
        .with_main_property_names(package.main.property_names)
        .with_alias_property_names(package.alias_property_names);
    if let Some(base) = string_at(tree, "path.source.asset.base") {
        resolver = resolver.with_base_dir(base);
    }
    if let Some(encoding) = string_at(tree, "encoding") {
        resolver = resolver.with_encoding(encoding);
    }
    Ok(resolver)
}

/// Directories skipped by auto-discovery and directory expansion.
///
/// Path ignores, module and loader directories, resolved against the context.
/// Directories containing the context itself are dropped.
fn discovery_ignore_dirs(tree: &Value, context: &Path) -> Result<Vec<PathBuf>> {
    let mut names: Vec<String> = section(tree, "path.ignore")?;
    names.extend(section::<Vec<String>>(tree, "module.directoryNames")?);
    names.extend(section::<Vec<String>>(tree, "loader.directoryNames")?);
    let resolved: Vec<String> = names
        .iter()
        .map(|name| resolve_path(context, name).to_string_lossy().into_owned())
        .collect();
    Ok(normalize_paths(&resolved)
        .into_iter()
        .map(PathBuf::from)
        .filter(|directory| !context.starts_with(directory))
        .collect())
}

/// Deserialize the value at `key_path`; missing or null values give the
/// default.
fn section<T: DeserializeOwned + Default>(tree: &Value, key_path: &str) -> Result<T> {
    match KeyPath::parse(key_path).get(tree) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|error| Error::ConfigurationShape {
                path: key_path.to_string(),
                message: error.to_string(),
            })
        }
    }
}

fn string_at<'a>(tree: &'a Value, key_path: &str) -> Option<&'a str> {
    KeyPath::parse(key_path).get(tree).and_then(Value::as_str)
}

fn object_mut<'a>(tree: &'a mut Value, key_path: &str) -> Result<&'a mut Map<String, Value>> {
    KeyPath::parse(key_path)
        .get_mut(tree)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| Error::ConfigurationShape {
            path: key_path.to_string(),
            message: "expected a mapping".to_string(),
        })
}
