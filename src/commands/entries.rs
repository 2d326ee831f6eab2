//! # Entries Command Implementation
//!
//! This module implements the `entries` subcommand, which displays the
//! resolved entry injection as a tree: one branch per chunk, one leaf per
//! module with the file it resolved to, followed by the external modules.

use anyhow::{anyhow, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::borrow::Cow;
use std::io;

use asset_composer::config::ResolvedConfiguration;
use asset_composer::resolver::{ModuleKind, ResolvedModule};

use super::LoadArgs;

/// Display the resolved entry chunks
#[derive(Args, Debug)]
pub struct EntriesArgs {
    /// Only list specifiers, without resolved files and asset types
    #[arg(long)]
    pub plain: bool,

    #[command(flatten)]
    pub load: LoadArgs,
}

/// Execute the `entries` command.
pub fn execute(args: EntriesArgs) -> Result<()> {
    let resolved = args.load.load()?;
    let tree = build_tree(&resolved, args.plain);
    print_tree(&tree).map_err(|error| anyhow!("Failed to display entries: {}", error))
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug, PartialEq)]
struct EntryNode {
    label: String,
    children: Vec<EntryNode>,
}

impl EntryNode {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: Vec::new(),
        }
    }
}

impl TreeItem for EntryNode {
    type Child = EntryNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &ptree::Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

fn build_tree(resolved: &ResolvedConfiguration, plain: bool) -> EntryNode {
    let mut children: Vec<EntryNode> = resolved
        .injection
        .modules
        .iter()
        .map(|(chunk_name, modules)| EntryNode {
            label: chunk_name.clone(),
            children: modules
                .iter()
                .filter(|module| module.kind == ModuleKind::Internal)
                .map(|module| EntryNode::leaf(module_label(module, plain)))
                .collect(),
        })
        .collect();
    if !resolved.injection.external.is_empty() {
        children.push(EntryNode {
            label: "(external)".to_string(),
            children: resolved
                .injection
                .external
                .iter()
                .cloned()
                .map(EntryNode::leaf)
                .collect(),
        });
    }
    EntryNode {
        label: format!("entries of {}", resolved.context.directory.display()),
        children,
    }
}

fn module_label(module: &ResolvedModule, plain: bool) -> String {
    if plain {
        return module.request.clone();
    }
    let location = module
        .absolute_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    match &module.asset_type {
        Some(asset_type) => format!("{} -> {} [{}]", module.request, location, asset_type),
        None => format!("{} -> {}", module.request, location),
    }
}
