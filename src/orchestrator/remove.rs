//! Uninstall

use std::path::Path;

use super::Orchestrator;
use crate::common::fs::{prune_empty_parents, remove_path};
use crate::error::{DuckrowError, Result, fs as fs_err};
use crate::lockfile;
use crate::system::canonical_asset_dir;

impl Orchestrator<'_> {
    /// Remove an asset from every known system supporting its kind, then
    /// delete the canonical copy and the lock entry.
    ///
    /// Every known system is swept, not only the active ones, so artifacts
    /// of a system no longer in use are cleaned up too. Returns the systems
    /// that had an artifact.
    pub fn remove_asset(&self, kind: &str, name: &str, project_dir: &Path) -> Result<Vec<String>> {
        let handler = self.handler(kind)?;
        let not_installed = || DuckrowError::AssetNotInstalled {
            kind: kind.to_string(),
            name: name.to_string(),
        };

        let canonical = handler
            .is_file_based()
            .then(|| canonical_asset_dir(project_dir, kind, name));
        if let Some(canonical) = &canonical {
            if std::fs::symlink_metadata(canonical).is_err() {
                return Err(not_installed());
            }
        }

        let mut removed_from = Vec::new();
        for system in self.systems.all().filter(|s| s.supports(kind)) {
            if system.remove(kind, name, project_dir)? {
                tracing::debug!("removed {kind} {name} from {}", system.name());
                removed_from.push(system.name().to_string());
            }
        }

        if let Some(canonical) = &canonical {
            remove_path(canonical).map_err(|e| fs_err::write_failed(canonical, e))?;
            if let Some(parent) = canonical.parent() {
                prune_empty_parents(parent, project_dir);
            }
        }

        let was_locked = lockfile::remove(project_dir, kind, name)?;
        if canonical.is_none() && removed_from.is_empty() && !was_locked {
            return Err(not_installed());
        }
        Ok(removed_from)
    }
}
