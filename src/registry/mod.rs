//! Registries: git-hosted catalogs of installable assets
//!
//! A registry is a repository with a `duckrow.json` manifest at its root.
//! Registries are cloned under `~/.duckrow/registries/<key>`, where `<key>`
//! is derived from the repository URL.
//!
//! Two manifest layouts are understood:
//!
//! - v2: `{"name", "description", "assets": {"<kind>": [...]}}`
//! - v1: `{"name", "description", "skills": [...], "mcps": [...]}`
//!
//! Unpinned entries can be "hydrated": their latest commits are resolved and
//! cached in `duckrow.commits.json` next to the manifest, so update checks for
//! registry-sourced assets avoid cloning.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::asset::{HandlerRegistry, KIND_MCP, KIND_SKILL, RegistryEntry};
use crate::common::fs::{copy_dir_recursive, remove_path, write_atomic};
use crate::config::{Config, RegistryConfig};
use crate::error::{DuckrowError, Result, fs as fs_err};
use crate::git::GitClient;
use crate::hash::dir_key;
use crate::source::SourceDescriptor;
use crate::update::{CommitRequest, resolve_latest_commits};

pub const MANIFEST_FILE: &str = "duckrow.json";
pub const COMMITS_FILE: &str = "duckrow.commits.json";
pub const REGISTRIES_DIR: &str = "registries";

/// v1 manifest keys and the kinds they hold
const LEGACY_KEYS: &[(&str, &str)] = &[("skills", KIND_SKILL), ("mcps", KIND_MCP)];

/// A parsed registry manifest
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    /// Entries per kind
    pub entries: BTreeMap<String, Vec<RegistryEntry>>,
}

impl Manifest {
    pub fn of_kind(&self, kind: &str) -> &[RegistryEntry] {
        self.entries.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn find(&self, kind: &str, name: &str) -> Option<&RegistryEntry> {
        self.of_kind(kind).iter().find(|e| e.name == name)
    }
}

/// Parse a manifest, dispatching each kind's entries to its handler.
///
/// Kinds without a handler are skipped.
pub fn parse_manifest(registry: &str, json: &str, handlers: &HandlerRegistry) -> Result<Manifest> {
    let invalid = |reason: String| DuckrowError::ManifestParseFailed {
        registry: registry.to_string(),
        reason,
    };
    let root: Value = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(root) = root else {
        return Err(invalid("manifest is not a JSON object".to_string()));
    };
    let text = |key: &str| {
        root.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let sections: Vec<(String, &Value)> = match root.get("assets") {
        Some(Value::Object(assets)) => assets.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Some(_) => return Err(invalid("'assets' must be an object".to_string())),
        None => LEGACY_KEYS
            .iter()
            .filter_map(|(key, kind)| root.get(*key).map(|v| ((*kind).to_string(), v)))
            .collect(),
    };

    let mut entries = BTreeMap::new();
    for (kind, raw) in sections {
        let Some(handler) = handlers.get(&kind) else {
            tracing::debug!("registry {registry}: skipping unknown kind {kind}");
            continue;
        };
        let parsed = handler
            .parse_manifest_entries(raw)
            .map_err(|e| invalid(format!("{kind} entries: {e}")))?;
        entries.insert(kind, parsed);
    }

    Ok(Manifest {
        name: text("name"),
        description: text("description"),
        entries,
    })
}

/// `host/owner/repo/sub` form of a manifest source, as recorded in lock files.
/// Sources that do not parse are kept verbatim.
fn canonical_source(source: &str) -> String {
    SourceDescriptor::parse(source).map_or_else(|_| source.to_string(), |d| d.canonical())
}

/// Clones, reads, and hydrates configured registries
pub struct RegistryManager<'a> {
    root: PathBuf,
    handlers: &'a HandlerRegistry,
    git: &'a dyn GitClient,
    clone_url_overrides: HashMap<String, String>,
}

impl<'a> RegistryManager<'a> {
    /// `home` is the duckrow home directory
    pub fn new(home: &Path, handlers: &'a HandlerRegistry, git: &'a dyn GitClient) -> Self {
        Self {
            root: home.join(REGISTRIES_DIR),
            handlers,
            git,
            clone_url_overrides: HashMap::new(),
        }
    }

    pub fn with_clone_url_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.clone_url_overrides = overrides;
        self
    }

    /// Local clone directory of `registry`
    pub fn registry_dir(&self, registry: &RegistryConfig) -> PathBuf {
        self.root.join(dir_key(&registry.repo))
    }

    /// Clone a new registry and add it to `config`. The caller saves the config.
    pub fn add(&self, config: &mut Config, name: &str, repo: &str) -> Result<Manifest> {
        if config.registry(name).is_some() {
            return Err(DuckrowError::RegistryExists {
                name: name.to_string(),
            });
        }
        let registry = RegistryConfig {
            name: name.to_string(),
            repo: repo.to_string(),
        };
        self.fetch(&registry)?;
        let manifest = match self.manifest(&registry) {
            Ok(manifest) => manifest,
            Err(e) => {
                let dir = self.registry_dir(&registry);
                if let Err(cleanup) = remove_path(&dir) {
                    tracing::warn!("failed to remove registry clone {}: {cleanup}", dir.display());
                }
                return Err(e);
            }
        };
        config.registries.push(registry);
        Ok(manifest)
    }

    /// Drop a registry from `config` and delete its clone
    pub fn remove(&self, config: &mut Config, name: &str) -> Result<()> {
        let Some(index) = config.registries.iter().position(|r| r.name == name) else {
            return Err(DuckrowError::RegistryNotFound {
                name: name.to_string(),
            });
        };
        let registry = config.registries.remove(index);
        let dir = self.registry_dir(&registry);
        remove_path(&dir).map_err(|e| fs_err::write_failed(&dir, e))?;
        Ok(())
    }

    /// Re-clone one registry, or all of them. Returns the refreshed names.
    pub fn refresh(&self, config: &Config, name: Option<&str>) -> Result<Vec<String>> {
        let selected: Vec<&RegistryConfig> = match name {
            Some(name) => vec![config.registry(name).ok_or_else(|| DuckrowError::RegistryNotFound {
                name: name.to_string(),
            })?],
            None => config.registries.iter().collect(),
        };
        let mut refreshed = Vec::new();
        for registry in selected {
            self.fetch(registry)?;
            refreshed.push(registry.name.clone());
        }
        Ok(refreshed)
    }

    /// Manifest of `registry`, cloning it first if there is no local copy
    pub fn manifest(&self, registry: &RegistryConfig) -> Result<Manifest> {
        let path = self.registry_dir(registry).join(MANIFEST_FILE);
        if !path.is_file() {
            self.fetch(registry)?;
        }
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DuckrowError::ManifestParseFailed {
                registry: registry.name.clone(),
                reason: format!("no {MANIFEST_FILE} at the repository root"),
            },
            _ => fs_err::read_failed(&path, e),
        })?;
        parse_manifest(&registry.name, &content, self.handlers)
    }

    /// First entry named `name` of `kind`, searching registries in config order
    pub fn find_entry(
        &self,
        config: &Config,
        kind: &str,
        name: &str,
    ) -> Result<(RegistryConfig, RegistryEntry)> {
        for registry in &config.registries {
            match self.manifest(registry) {
                Ok(manifest) => {
                    if let Some(entry) = manifest.find(kind, name) {
                        return Ok((registry.clone(), entry.clone()));
                    }
                }
                Err(e) => tracing::warn!("skipping registry {}: {e}", registry.name),
            }
        }
        Err(DuckrowError::RegistryEntryNotFound {
            name: name.to_string(),
        })
    }

    /// `source -> commit` for every registry entry of `kind` with a known
    /// commit: the pinned one, else the hydrated one.
    pub fn commit_map(&self, config: &Config, kind: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for registry in &config.registries {
            let manifest = match self.manifest(registry) {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::warn!("skipping registry {}: {e}", registry.name);
                    continue;
                }
            };
            let hydrated = self.hydrated_commits(registry);
            for entry in manifest.of_kind(kind).iter().filter(|e| !e.source.is_empty()) {
                let source = canonical_source(&entry.source);
                let commit = entry
                    .commit
                    .clone()
                    .or_else(|| hydrated.get(&source).cloned());
                if let Some(commit) = commit {
                    map.entry(source).or_insert(commit);
                }
            }
        }
        map
    }

    /// Resolve and cache the latest commit of every unpinned entry.
    ///
    /// Best effort: unreachable sources are logged and left out. Returns the
    /// number of commits cached.
    pub fn hydrate(&self, config: &Config) -> Result<usize> {
        let mut total = 0;
        for registry in &config.registries {
            let manifest = match self.manifest(registry) {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::warn!("not hydrating registry {}: {e}", registry.name);
                    continue;
                }
            };
            let requests: Vec<CommitRequest> = manifest
                .entries
                .values()
                .flatten()
                .filter(|e| e.commit.is_none() && !e.source.is_empty())
                .map(|e| CommitRequest {
                    source: canonical_source(&e.source),
                    git_ref: None,
                })
                .collect();
            if requests.is_empty() {
                continue;
            }

            let resolved: BTreeMap<String, String> =
                resolve_latest_commits(&requests, &self.clone_url_overrides, self.git)
                    .into_iter()
                    .collect();
            tracing::debug!(
                "registry {}: hydrated {} of {} entries",
                registry.name,
                resolved.len(),
                requests.len()
            );
            total += resolved.len();

            let path = self.registry_dir(registry).join(COMMITS_FILE);
            let mut json = serde_json::to_string_pretty(&resolved)?;
            json.push('\n');
            write_atomic(&path, json.as_bytes())?;
        }
        Ok(total)
    }

    fn hydrated_commits(&self, registry: &RegistryConfig) -> HashMap<String, String> {
        let path = self.registry_dir(registry).join(COMMITS_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return HashMap::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring invalid {}: {e}", path.display());
            HashMap::new()
        })
    }

    /// Clone `registry` into its directory, replacing any previous copy
    fn fetch(&self, registry: &RegistryConfig) -> Result<()> {
        let url = self.clone_url(&registry.repo);
        tracing::debug!("fetching registry {} from {url}", registry.name);
        let checkout = self.git.clone_shallow(&url, None)?;

        let dir = self.registry_dir(registry);
        remove_path(&dir).map_err(|e| fs_err::write_failed(&dir, e))?;
        copy_dir_recursive(checkout.path(), &dir).map_err(|e| fs_err::write_failed(&dir, e))?;
        Ok(())
    }

    /// Clone URL for a registry repo given as a source or a plain URL
    fn clone_url(&self, repo: &str) -> String {
        match SourceDescriptor::parse(repo) {
            Ok(mut descriptor) => {
                descriptor.apply_clone_url_override(&self.clone_url_overrides);
                descriptor.clone_url
            }
            Err(_) => repo.to_string(),
        }
    }
}
