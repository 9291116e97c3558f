//! MCP server handler
//!
//! MCP servers are declared in `mcp.json` / `.mcp.json` files as
//! `{"mcpServers": {"<name>": {...}}}`. They are not file-based: installing
//! one patches each target system's MCP config rather than copying files.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

use super::{
    Asset, AssetHandler, AssetMeta, DiscoverOptions, InstallInfo, KIND_MCP, REGISTRY_SOURCE_PREFIX,
    RegistryEntry, is_skipped_dir, sanitize_name,
};
use crate::error::{DuckrowError, Result};
use crate::hash::hash_bytes;
use crate::lockfile::LockedAsset;

/// File names scanned for server declarations
pub const MCP_FILES: &[&str] = &["mcp.json", ".mcp.json"];

/// Lock data key for the config hash
pub const DATA_CONFIG_HASH: &str = "configHash";

/// Lock data key for referenced environment variables
pub const DATA_REQUIRED_ENV: &str = "requiredEnv";

/// Lock data key for the full config of a registry-defined server
pub const DATA_CONFIG: &str = "config";

/// Functional configuration of one MCP server.
///
/// Either `command` (stdio) or `url` (remote) is set, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl McpServerConfig {
    /// Hash over the functional fields only; `name` and `description` do not
    /// participate, so equal hashes mean equivalent servers.
    pub fn config_hash(&self) -> String {
        let canonical = serde_json::json!({
            "command": self.command,
            "args": self.args,
            "env": self.env,
            "url": self.url,
            "type": self.transport,
            "headers": self.headers,
        });
        hash_bytes(canonical.to_string().as_bytes())
    }

    /// Sorted names of `${VAR}` / `$VAR` references in env and header values
    pub fn required_env(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for value in self.env.values().chain(self.headers.values()) {
            collect_env_refs(value, &mut names);
        }
        names.into_iter().collect()
    }

    fn has_command(&self) -> bool {
        self.command.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

fn collect_env_refs(value: &str, out: &mut BTreeSet<String>) {
    let mut rest = value;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let (candidate, braced) = match rest.strip_prefix('{') {
            Some(inner) => (inner, true),
            None => (rest, false),
        };
        let len = candidate
            .char_indices()
            .find(|&(i, c)| !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit())))
            .map_or(candidate.len(), |(i, _)| i);
        if len == 0 || (braced && !candidate[len..].starts_with('}')) {
            continue;
        }
        out.insert(candidate[..len].to_string());
        rest = &candidate[len..];
    }
}

#[derive(Debug, Deserialize)]
struct McpDeclaration {
    #[serde(default)]
    description: String,
    #[serde(flatten)]
    config: McpServerConfig,
}

#[derive(Debug, Deserialize)]
struct McpFile {
    #[serde(rename = "mcpServers", default)]
    servers: BTreeMap<String, McpDeclaration>,
}

#[derive(Debug, Deserialize)]
struct ManifestMcp {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    commit: Option<String>,
    #[serde(flatten)]
    config: McpServerConfig,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct McpHandler;

impl AssetHandler for McpHandler {
    fn kind(&self) -> &'static str {
        KIND_MCP
    }

    fn display_name(&self) -> &'static str {
        "MCP servers"
    }

    fn is_file_based(&self) -> bool {
        false
    }

    fn discover(&self, base: &Path, options: &DiscoverOptions) -> Result<Vec<Asset>> {
        let scope = options.scope(base);
        if !scope.is_dir() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut assets = Vec::new();
        let walker = WalkDir::new(&scope)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));

        for entry in walker.filter_map(std::result::Result::ok) {
            let is_mcp_file = entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| MCP_FILES.contains(&n));
            if !is_mcp_file {
                continue;
            }

            let parsed = fs::read_to_string(entry.path())
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<McpFile>(&c).map_err(|e| e.to_string()));
            let file = match parsed {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", entry.path().display());
                    continue;
                }
            };

            let dir = entry.path().parent().unwrap_or(&scope);
            for (raw_name, declaration) in file.servers {
                let name = sanitize_name(&raw_name);
                if !options.matches_name(&name) && !options.matches_name(&raw_name) {
                    continue;
                }
                if !seen.insert(name.clone()) {
                    continue;
                }
                assets.push(Asset {
                    kind: KIND_MCP.to_string(),
                    name,
                    description: declaration.description,
                    source: String::new(),
                    prepared_path: Some(dir.to_path_buf()),
                    meta: AssetMeta::Mcp(declaration.config),
                });
            }
        }

        Ok(assets)
    }

    fn validate(&self, asset: &Asset) -> Result<()> {
        let fail = |reason: &str| DuckrowError::AssetValidationFailed {
            kind: KIND_MCP.to_string(),
            name: asset.name.clone(),
            reason: reason.to_string(),
        };

        let AssetMeta::Mcp(config) = &asset.meta else {
            return Err(fail("not an MCP server"));
        };
        match (config.has_command(), config.has_url()) {
            (true, true) => Err(fail("declares both 'command' and 'url'")),
            (false, false) => Err(fail("needs either 'command' or 'url'")),
            _ => Ok(()),
        }
    }

    fn parse_manifest_entries(&self, raw: &Value) -> Result<Vec<RegistryEntry>> {
        let servers: Vec<ManifestMcp> = serde_json::from_value(raw.clone())?;
        Ok(servers
            .into_iter()
            .map(|s| RegistryEntry {
                name: s.name,
                description: s.description,
                source: s.source,
                commit: s.commit.filter(|c| !c.is_empty()),
                meta: AssetMeta::Mcp(s.config),
            })
            .collect())
    }

    fn asset_from_entry(&self, entry: &RegistryEntry) -> Option<Asset> {
        let AssetMeta::Mcp(config) = &entry.meta else {
            return None;
        };
        if !config.has_command() && !config.has_url() {
            return None;
        }
        Some(Asset {
            kind: KIND_MCP.to_string(),
            name: sanitize_name(&entry.name),
            description: entry.description.clone(),
            source: String::new(),
            prepared_path: None,
            meta: AssetMeta::Mcp(config.clone()),
        })
    }

    fn asset_from_lock(&self, locked: &LockedAsset) -> Option<Asset> {
        if !locked.source.starts_with(REGISTRY_SOURCE_PREFIX) {
            return None;
        }
        let config: McpServerConfig = serde_json::from_value(locked.data.get(DATA_CONFIG)?.clone()).ok()?;
        Some(Asset {
            kind: KIND_MCP.to_string(),
            name: locked.name.clone(),
            description: String::new(),
            source: locked.source.clone(),
            prepared_path: None,
            meta: AssetMeta::Mcp(config),
        })
    }

    fn lock_data(&self, asset: &Asset, info: &InstallInfo) -> LockedAsset {
        let mut data = BTreeMap::new();
        if let AssetMeta::Mcp(config) = &asset.meta {
            data.insert(DATA_CONFIG_HASH.to_string(), Value::String(config.config_hash()));
            let required = config.required_env();
            if !required.is_empty() {
                data.insert(
                    DATA_REQUIRED_ENV.to_string(),
                    Value::Array(required.into_iter().map(Value::String).collect()),
                );
            }
            // No tree to re-clone from, so the lock carries the definition
            if info.source.starts_with(REGISTRY_SOURCE_PREFIX) {
                if let Ok(value) = serde_json::to_value(config) {
                    data.insert(DATA_CONFIG.to_string(), value);
                }
            }
        }
        LockedAsset {
            kind: KIND_MCP.to_string(),
            name: asset.name.clone(),
            source: info.source.clone(),
            commit: info.commit.clone(),
            git_ref: info.git_ref.clone(),
            data,
        }
    }
}
