//! Asset kinds and their handlers
//!
//! An asset is a kind-tagged unit (a skill directory, an MCP server config)
//! discovered in a cloned tree or listed in a registry manifest. Everything
//! kind-specific lives behind the [`AssetHandler`] trait so the orchestrator
//! can stay kind-agnostic.
//!
//! ## Module Organization
//!
//! - `frontmatter.rs`: YAML frontmatter of `SKILL.md`
//! - `skill.rs`: the `skill` handler (file-based)
//! - `mcp.rs`: the `mcp` handler (config-based)

pub mod frontmatter;
pub mod mcp;
pub mod skill;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::lockfile::LockedAsset;

pub use mcp::{McpHandler, McpServerConfig};
pub use skill::SkillHandler;

pub const KIND_SKILL: &str = "skill";
pub const KIND_MCP: &str = "mcp";

/// Kinds listed first by [`HandlerRegistry::kinds`], in this order
const PRIMARY_KINDS: &[&str] = &[KIND_SKILL, KIND_MCP];

/// Longest sanitized asset name
pub const MAX_NAME_LEN: usize = 255;

/// Name used when sanitizing leaves nothing
pub const FALLBACK_NAME: &str = "unnamed-asset";

/// Directories never descended into during discovery
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "target",
    ".venv",
    "__pycache__",
];

/// Kind-specific payload of an asset
#[derive(Debug, Clone, PartialEq)]
pub enum AssetMeta {
    Skill { internal: bool },
    Mcp(McpServerConfig),
}

/// A discovered, installable asset
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub kind: String,
    pub name: String,
    pub description: String,
    /// Canonical source; the orchestrator fills it in when left empty
    pub source: String,
    /// Local content location, for file-based kinds
    pub prepared_path: Option<PathBuf>,
    pub meta: AssetMeta,
}

/// Parsed entry of a registry manifest
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub name: String,
    pub description: String,
    pub source: String,
    /// Pinned commit, when the registry declares one
    pub commit: Option<String>,
    pub meta: AssetMeta,
}

/// Discovery scope and filters
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// Path within the tree to search ("" for the whole tree)
    pub sub_path: String,
    /// Only return the asset with this name
    pub name_filter: Option<String>,
    /// Include assets marked internal
    pub include_internal: bool,
}

impl DiscoverOptions {
    /// Directory to walk under `base`
    pub fn scope(&self, base: &Path) -> PathBuf {
        let sub = self.sub_path.trim_matches('/');
        if sub.is_empty() {
            base.to_path_buf()
        } else {
            base.join(sub)
        }
    }

    /// Whether `name` passes the name filter
    pub fn matches_name(&self, name: &str) -> bool {
        self.name_filter
            .as_deref()
            .is_none_or(|filter| filter == name || sanitize_name(filter) == name)
    }
}

/// Install facts recorded in a lock entry
#[derive(Debug, Clone, Default)]
pub struct InstallInfo {
    pub source: String,
    pub commit: String,
    pub git_ref: Option<String>,
}

/// Kind-specific behavior: discovery, validation, manifests, lock records
pub trait AssetHandler {
    /// Kind tag, e.g. `skill`
    fn kind(&self) -> &'static str;

    /// Plural human-facing name, e.g. `skills`
    fn display_name(&self) -> &'static str;

    /// Whether assets of this kind have on-disk content copied to a canonical location
    fn is_file_based(&self) -> bool;

    /// Find assets of this kind under `base`. Nothing found is an empty list.
    fn discover(&self, base: &Path, options: &DiscoverOptions) -> Result<Vec<Asset>>;

    /// Structural checks before anything is installed
    fn validate(&self, asset: &Asset) -> Result<()>;

    /// Decode this kind's array from a registry manifest
    fn parse_manifest_entries(&self, raw: &serde_json::Value) -> Result<Vec<RegistryEntry>>;

    /// Lock file record for an installed asset
    fn lock_data(&self, asset: &Asset, info: &InstallInfo) -> LockedAsset;

    /// An installable asset defined inline by a registry entry without a
    /// source. Kinds whose content must come from a tree return `None`.
    fn asset_from_entry(&self, _entry: &RegistryEntry) -> Option<Asset> {
        None
    }

    /// Rebuild an inline-defined asset from its lock record
    fn asset_from_lock(&self, _locked: &LockedAsset) -> Option<Asset> {
        None
    }
}

/// Prefix of lock sources for assets defined inline in a registry manifest
pub const REGISTRY_SOURCE_PREFIX: &str = "registry:";

/// `registry:<registry>/<name>`
pub fn registry_source(registry: &str, name: &str) -> String {
    format!("{REGISTRY_SOURCE_PREFIX}{registry}/{name}")
}

/// Handlers keyed by kind
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn AssetHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(SkillHandler));
        registry.register(Box::new(McpHandler));
        registry
    }
}

impl HandlerRegistry {
    /// Registry with the built-in kinds
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add a handler, replacing any existing one for the same kind
    pub fn register(&mut self, handler: Box<dyn AssetHandler>) {
        self.handlers.retain(|h| h.kind() != handler.kind());
        self.handlers.push(handler);
    }

    pub fn get(&self, kind: &str) -> Option<&dyn AssetHandler> {
        self.handlers
            .iter()
            .find(|h| h.kind() == kind)
            .map(|h| &**h)
    }

    /// All kinds: primary kinds first, then the rest in registration order
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = PRIMARY_KINDS
            .iter()
            .copied()
            .filter(|k| self.get(k).is_some())
            .collect();
        for handler in &self.handlers {
            if !kinds.contains(&handler.kind()) {
                kinds.push(handler.kind());
            }
        }
        kinds
    }
}

/// Filesystem-safe asset name: lowercase `[a-z0-9-]`, no leading, trailing
/// or repeated dashes, at most [`MAX_NAME_LEN`] chars, never empty.
pub fn sanitize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let mut name = out.trim_matches('-').to_string();
    if name.len() > MAX_NAME_LEN {
        name.truncate(MAX_NAME_LEN);
        name = name.trim_end_matches('-').to_string();
    }
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

/// Whether a directory entry name is in [`SKIP_DIRS`]
pub(crate) fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}
