//! Skill handler
//!
//! A skill is a directory containing a `SKILL.md` whose frontmatter carries
//! `name` and `description`. Skills are file-based: their directory is copied
//! to the canonical location on install.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use walkdir::WalkDir;

use super::frontmatter;
use super::{
    Asset, AssetHandler, AssetMeta, DiscoverOptions, InstallInfo, KIND_SKILL, MAX_NAME_LEN,
    RegistryEntry, is_skipped_dir, sanitize_name,
};
use crate::error::{DuckrowError, Result, fs as fs_err};
use crate::lockfile::LockedAsset;

/// Manifest file marking a skill directory
pub const SKILL_FILE: &str = "SKILL.md";

#[derive(Debug, Clone, Copy, Default)]
pub struct SkillHandler;

#[derive(Debug, Deserialize)]
struct ManifestSkill {
    name: String,
    #[serde(default)]
    description: String,
    source: String,
    #[serde(default)]
    commit: Option<String>,
}

impl SkillHandler {
    fn load(skill_file: &Path, scope: &Path) -> Result<Asset> {
        let content = fs::read_to_string(skill_file).map_err(|e| fs_err::read_failed(skill_file, e))?;
        let fm = frontmatter::parse_skill(&content).map_err(|e| DuckrowError::AssetValidationFailed {
            kind: KIND_SKILL.to_string(),
            name: skill_file.display().to_string(),
            reason: format!("invalid frontmatter: {e}"),
        })?;

        let dir = skill_file.parent().unwrap_or(scope);
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw_name = fm
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&dir_name);

        Ok(Asset {
            kind: KIND_SKILL.to_string(),
            name: sanitize_name(raw_name),
            description: fm.description.clone().unwrap_or_default().trim().to_string(),
            source: String::new(),
            prepared_path: Some(dir.to_path_buf()),
            meta: AssetMeta::Skill {
                internal: fm.is_internal(),
            },
        })
    }
}

/// Sanitized name of the directory holding `skill_file`
fn dir_name_of(skill_file: &Path) -> String {
    skill_file
        .parent()
        .and_then(Path::file_name)
        .map(|n| sanitize_name(&n.to_string_lossy()))
        .unwrap_or_default()
}

impl AssetHandler for SkillHandler {
    fn kind(&self) -> &'static str {
        KIND_SKILL
    }

    fn display_name(&self) -> &'static str {
        "skills"
    }

    fn is_file_based(&self) -> bool {
        true
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
            if !entry.file_type().is_file() || entry.file_name() != SKILL_FILE {
                continue;
            }
            let asset = match Self::load(entry.path(), &scope) {
                Ok(asset) => asset,
                // Unreadable siblings do not block a filtered install
                Err(e) if !options.matches_name(&dir_name_of(entry.path())) => {
                    tracing::debug!("skipping {}: {e}", entry.path().display());
                    continue;
                }
                Err(e) => return Err(e),
            };
            if matches!(asset.meta, AssetMeta::Skill { internal: true }) && !options.include_internal {
                tracing::debug!("skipping internal skill {}", asset.name);
                continue;
            }
            if !options.matches_name(&asset.name) {
                continue;
            }
            if seen.insert(asset.name.clone()) {
                assets.push(asset);
            } else {
                tracing::debug!(
                    "duplicate skill {} at {}, keeping first",
                    asset.name,
                    entry.path().display()
                );
            }
        }

        Ok(assets)
    }

    fn validate(&self, asset: &Asset) -> Result<()> {
        let fail = |reason: &str| DuckrowError::AssetValidationFailed {
            kind: KIND_SKILL.to_string(),
            name: asset.name.clone(),
            reason: reason.to_string(),
        };

        if asset.name.is_empty() || asset.name.len() > MAX_NAME_LEN {
            return Err(fail("name must be 1-255 characters"));
        }
        if asset.description.is_empty() {
            return Err(fail("missing description in SKILL.md frontmatter"));
        }
        match &asset.prepared_path {
            Some(path) if path.join(SKILL_FILE).is_file() => Ok(()),
            _ => Err(fail("skill directory has no SKILL.md")),
        }
    }

    fn parse_manifest_entries(&self, raw: &serde_json::Value) -> Result<Vec<RegistryEntry>> {
        let skills: Vec<ManifestSkill> = serde_json::from_value(raw.clone())?;
        Ok(skills
            .into_iter()
            .map(|s| RegistryEntry {
                name: s.name,
                description: s.description,
                source: s.source,
                commit: s.commit.filter(|c| !c.is_empty()),
                meta: AssetMeta::Skill { internal: false },
            })
            .collect())
    }

    fn lock_data(&self, asset: &Asset, info: &InstallInfo) -> LockedAsset {
        LockedAsset {
            kind: KIND_SKILL.to_string(),
            name: asset.name.clone(),
            source: info.source.clone(),
            commit: info.commit.clone(),
            git_ref: info.git_ref.clone(),
            data: std::collections::BTreeMap::new(),
        }
    }
}
