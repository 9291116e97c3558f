//! Data-driven agent definitions

use std::fs;
use std::path::{Path, PathBuf};

use super::link::{LinkKind, link_or_copy, relative_target};
use super::{
    CANONICAL_SKILLS_DIR, InstalledAsset, System, SystemInstallOptions, canonical_skill_dir,
    mcp_config,
};
use crate::asset::skill::SKILL_FILE;
use crate::asset::{Asset, AssetMeta, KIND_MCP, KIND_SKILL};
use crate::common::fs::remove_path;
use crate::error::{DuckrowError, Result, fs as fs_err};

/// Where a system reads MCP servers from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpTarget {
    /// Config file relative to the project
    pub file: String,
    /// Dotted key path of the servers object
    pub key: String,
}

/// A coding agent described by its directory conventions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSystem {
    pub name: String,
    pub display_name: String,
    /// Reads skills from the canonical location directly
    pub universal: bool,
    /// Paths whose presence marks the system as in use
    pub detection: Vec<String>,
    /// Skills directory for non-universal systems (symlink targets)
    pub skills_dir: Option<String>,
    pub mcp: Option<McpTarget>,
}

impl AgentSystem {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            universal: false,
            detection: Vec::new(),
            skills_dir: None,
            mcp: None,
        }
    }

    /// Mark as reading `.agents/skills` directly
    pub fn universal(mut self) -> Self {
        self.universal = true;
        self
    }

    pub fn with_detection(mut self, pattern: impl Into<String>) -> Self {
        self.detection.push(pattern.into());
        self
    }

    pub fn with_skills_dir(mut self, dir: impl Into<String>) -> Self {
        self.skills_dir = Some(dir.into());
        self
    }

    pub fn with_mcp(mut self, file: impl Into<String>, key: impl Into<String>) -> Self {
        self.mcp = Some(McpTarget {
            file: file.into(),
            key: key.into(),
        });
        self
    }

    fn skills_dir_path(&self, project_dir: &Path) -> PathBuf {
        match &self.skills_dir {
            Some(dir) if !self.universal => project_dir.join(dir),
            _ => project_dir.join(CANONICAL_SKILLS_DIR),
        }
    }

    fn install_failed(&self, asset_name: &str, reason: impl Into<String>) -> DuckrowError {
        DuckrowError::SystemInstallFailed {
            system: self.name.clone(),
            name: asset_name.to_string(),
            reason: reason.into(),
        }
    }

    fn install_skill(&self, asset: &Asset, project_dir: &Path, copy: bool) -> Result<()> {
        let canonical = canonical_skill_dir(project_dir, &asset.name);
        if !canonical.join(SKILL_FILE).is_file() {
            return Err(self.install_failed(
                &asset.name,
                format!("canonical copy missing at {}", canonical.display()),
            ));
        }
        let Some(dir) = self.skills_dir.as_deref().filter(|_| !self.universal) else {
            return Ok(());
        };

        let link = project_dir.join(dir).join(&asset.name);
        let relative = relative_target(dir, CANONICAL_SKILLS_DIR, &asset.name);
        let kind = link_or_copy(&canonical, &link, &relative, copy)?;
        if kind == LinkKind::Copy && !copy {
            tracing::debug!("{}: copied {} (symlink unavailable)", self.name, asset.name);
        }
        Ok(())
    }

    fn scan_skills(&self, project_dir: &Path) -> Result<Vec<InstalledAsset>> {
        let dir = self.skills_dir_path(project_dir);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(fs_err::read_failed(&dir, e)),
        };

        let mut found: Vec<InstalledAsset> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().join(SKILL_FILE).is_file())
            .map(|e| InstalledAsset {
                kind: KIND_SKILL.to_string(),
                name: e.file_name().to_string_lossy().into_owned(),
                system: self.name.clone(),
                path: e.path(),
            })
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }
}

impl System for AgentSystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn is_universal(&self) -> bool {
        self.universal
    }

    fn supports(&self, kind: &str) -> bool {
        match kind {
            KIND_SKILL => self.universal || self.skills_dir.is_some(),
            KIND_MCP => self.mcp.is_some(),
            _ => false,
        }
    }

    /// Detected by its marker files; universal systems also count as in use
    /// once the canonical skills directory exists
    fn is_active(&self, project_dir: &Path) -> bool {
        self.detection
            .iter()
            .any(|pattern| project_dir.join(pattern).exists())
            || (self.universal && project_dir.join(CANONICAL_SKILLS_DIR).is_dir())
    }

    fn install(
        &self,
        asset: &Asset,
        project_dir: &Path,
        options: &SystemInstallOptions,
    ) -> Result<()> {
        tracing::debug!("{}: installing {} {}", self.name, asset.kind, asset.name);
        match (&asset.meta, &self.mcp) {
            (AssetMeta::Skill { .. }, _) if self.supports(KIND_SKILL) => {
                self.install_skill(asset, project_dir, options.copy)
            }
            (AssetMeta::Mcp(config), Some(target)) => {
                mcp_config::upsert_server(&project_dir.join(&target.file), &target.key, &asset.name, config)
            }
            _ => Err(self.install_failed(
                &asset.name,
                format!("{} does not support {}", self.display_name, asset.kind),
            )),
        }
    }

    fn remove(&self, kind: &str, name: &str, project_dir: &Path) -> Result<bool> {
        match kind {
            KIND_SKILL => match self.skills_dir.as_deref().filter(|_| !self.universal) {
                Some(dir) => {
                    let link = project_dir.join(dir).join(name);
                    remove_path(&link).map_err(|e| fs_err::write_failed(&link, e))
                }
                // The canonical copy is owned by the orchestrator
                None => Ok(false),
            },
            KIND_MCP => match &self.mcp {
                Some(target) => {
                    mcp_config::remove_server(&project_dir.join(&target.file), &target.key, name)
                }
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    fn scan(&self, kind: &str, project_dir: &Path) -> Result<Vec<InstalledAsset>> {
        match kind {
            KIND_SKILL if self.supports(KIND_SKILL) => self.scan_skills(project_dir),
            KIND_MCP => match &self.mcp {
                Some(target) => {
                    let path = project_dir.join(&target.file);
                    Ok(mcp_config::list_servers(&path, &target.key)?
                        .into_iter()
                        .map(|name| InstalledAsset {
                            kind: KIND_MCP.to_string(),
                            name,
                            system: self.name.clone(),
                            path: path.clone(),
                        })
                        .collect())
                }
                None => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
    }
}
