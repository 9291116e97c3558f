//! Per-asset install transaction
//!
//! Installing one asset touches several places: the canonical copy and every
//! target system. The transaction records each step so that a failure part
//! way through can undo the steps already taken.
//!
//! On a reinstall the previous canonical copy is moved aside rather than
//! deleted, and systems that already had the asset are not asked to remove
//! it, so a failed reinstall leaves the earlier install usable.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tx = InstallTransaction::new(&asset, project_dir, options.rollback_on_failure);
//! tx.track_canonical_created(canonical);
//! for system in targets {
//!     system.install(&asset, project_dir, &opts)?; // early return rolls back
//!     tx.track_system(system);
//! }
//! tx.commit();
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::asset::Asset;
use crate::common::fs::{prune_empty_parents, remove_path};
use crate::system::System;

/// Undo log for installing one asset
pub struct InstallTransaction<'a> {
    kind: String,
    name: String,
    project_dir: PathBuf,

    /// Systems that completed `install`, in order, and whether the asset
    /// was new to them (only those are undone)
    installed: Vec<(&'a dyn System, bool)>,

    /// Canonical copy created by this transaction (not one that pre-existed)
    created_canonical: Option<PathBuf>,

    /// Canonical copy that replaced an earlier one, and where the earlier one waits
    replaced_canonical: Option<(PathBuf, TempDir)>,

    committed: bool,

    /// When false, a failed install leaves completed steps in place
    rollback_enabled: bool,
}

impl<'a> InstallTransaction<'a> {
    pub fn new(asset: &Asset, project_dir: &Path, rollback_enabled: bool) -> Self {
        Self {
            kind: asset.kind.clone(),
            name: asset.name.clone(),
            project_dir: project_dir.to_path_buf(),
            installed: Vec::new(),
            created_canonical: None,
            replaced_canonical: None,
            committed: false,
            rollback_enabled,
        }
    }

    /// Track a canonical copy that did not exist before this install
    pub fn track_canonical_created(&mut self, path: impl Into<PathBuf>) {
        self.created_canonical = Some(path.into());
    }

    /// Move an existing canonical copy aside so a rollback can put it back.
    ///
    /// The copy is kept in a hidden temp directory next to it until the
    /// transaction ends.
    pub fn stage_canonical_replacement(&mut self, canonical: &Path) -> std::io::Result<()> {
        let parent = canonical.parent().unwrap_or(&self.project_dir);
        let backup = tempfile::Builder::new()
            .prefix(".duckrow-prev-")
            .tempdir_in(parent)?;
        std::fs::rename(canonical, backup.path().join(&self.name))?;
        self.replaced_canonical = Some((canonical.to_path_buf(), backup));
        Ok(())
    }

    /// Track a system whose `install` succeeded
    pub fn track_system(&mut self, system: &'a dyn System) {
        self.installed.push((system, true));
    }

    /// Track a system that already had the asset before this install
    pub fn track_system_reinstalled(&mut self, system: &'a dyn System) {
        self.installed.push((system, false));
    }

    /// Names of the systems installed so far
    pub fn system_names(&self) -> Vec<String> {
        self.installed
            .iter()
            .map(|(s, _)| s.name().to_string())
            .collect()
    }

    /// Commit the transaction (prevent rollback). A replaced canonical copy
    /// is discarded.
    pub fn commit(mut self) {
        self.committed = true;
        if let Some((_, backup)) = self.replaced_canonical.take() {
            let path = backup.path().to_path_buf();
            if let Err(e) = backup.close() {
                tracing::warn!("failed to remove {}: {e}", path.display());
            }
        }
    }

    /// Undo completed steps, newest first. Failures are logged, not returned.
    pub fn rollback(&mut self) {
        if self.committed {
            return;
        }

        for (system, _) in self.installed.drain(..).rev().filter(|(_, new)| *new) {
            match system.remove(&self.kind, &self.name, &self.project_dir) {
                Ok(_) => tracing::debug!("rolled back {} {} on {}", self.kind, self.name, system.name()),
                Err(e) => tracing::warn!(
                    "failed to roll back {} {} on {}: {e}",
                    self.kind,
                    self.name,
                    system.name()
                ),
            }
        }

        if let Some((canonical, backup)) = self.replaced_canonical.take() {
            if let Err(e) = remove_path(&canonical) {
                tracing::warn!("failed to remove {}: {e}", canonical.display());
            }
            if let Err(e) = std::fs::rename(backup.path().join(&self.name), &canonical) {
                tracing::warn!("failed to restore {}: {e}", canonical.display());
            }
        }

        if let Some(canonical) = self.created_canonical.take() {
            if let Err(e) = remove_path(&canonical) {
                tracing::warn!("failed to remove {}: {e}", canonical.display());
            }
            if let Some(parent) = canonical.parent() {
                prune_empty_parents(parent, &self.project_dir);
            }
        }
    }
}

impl Drop for InstallTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed && self.rollback_enabled {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetMeta;
    use crate::system::SystemInstallOptions;
    use crate::test_fixtures::{RecordingSystem, create_temp_dir};

    fn asset() -> Asset {
        Asset {
            kind: "skill".to_string(),
            name: "lint".to_string(),
            description: "d".to_string(),
            source: String::new(),
            prepared_path: None,
            meta: AssetMeta::Skill { internal: false },
        }
    }

    fn install(system: &RecordingSystem, project: &Path) {
        system
            .install(&asset(), project, &SystemInstallOptions::default())
            .unwrap();
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let temp = create_temp_dir();
        let canonical = temp.path().join(".agents/skills/lint");
        std::fs::create_dir_all(&canonical).unwrap();
        let a = RecordingSystem::new("a");
        let b = RecordingSystem::new("b");
        install(&a, temp.path());
        install(&b, temp.path());

        {
            let mut tx = InstallTransaction::new(&asset(), temp.path(), true);
            tx.track_canonical_created(&canonical);
            tx.track_system(&a);
            tx.track_system(&b);
            assert_eq!(tx.system_names(), vec!["a", "b"]);
        }

        assert!(!a.has("skill", "lint"));
        assert!(!b.has("skill", "lint"));
        assert!(!canonical.exists());
        assert!(!temp.path().join(".agents").exists());
    }

    #[test]
    fn test_commit_keeps_everything() {
        let temp = create_temp_dir();
        let a = RecordingSystem::new("a");
        install(&a, temp.path());

        let mut tx = InstallTransaction::new(&asset(), temp.path(), true);
        tx.track_system(&a);
        tx.commit();

        assert!(a.has("skill", "lint"));
        assert_eq!(a.remove_count(), 0);
    }

    #[test]
    fn test_rollback_restores_replaced_canonical() {
        let temp = create_temp_dir();
        let canonical = temp.path().join(".agents/skills/lint");
        std::fs::create_dir_all(&canonical).unwrap();
        std::fs::write(canonical.join("SKILL.md"), "old").unwrap();
        let before = RecordingSystem::new("before");
        let fresh = RecordingSystem::new("fresh");
        install(&before, temp.path());
        install(&fresh, temp.path());

        {
            let mut tx = InstallTransaction::new(&asset(), temp.path(), true);
            tx.stage_canonical_replacement(&canonical).unwrap();
            assert!(!canonical.exists());
            std::fs::create_dir_all(&canonical).unwrap();
            std::fs::write(canonical.join("SKILL.md"), "new").unwrap();
            tx.track_system_reinstalled(&before);
            tx.track_system(&fresh);
        }

        assert_eq!(std::fs::read_to_string(canonical.join("SKILL.md")).unwrap(), "old");
        assert!(before.has("skill", "lint"));
        assert_eq!(before.remove_count(), 0);
        assert!(!fresh.has("skill", "lint"));
        let leftovers: Vec<_> = std::fs::read_dir(temp.path().join(".agents/skills"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec!["lint"]);
    }

    #[test]
    fn test_commit_discards_replaced_canonical() {
        let temp = create_temp_dir();
        let canonical = temp.path().join(".agents/skills/lint");
        std::fs::create_dir_all(&canonical).unwrap();
        std::fs::write(canonical.join("SKILL.md"), "old").unwrap();

        let mut tx = InstallTransaction::new(&asset(), temp.path(), true);
        tx.stage_canonical_replacement(&canonical).unwrap();
        std::fs::create_dir_all(&canonical).unwrap();
        std::fs::write(canonical.join("SKILL.md"), "new").unwrap();
        tx.commit();

        assert_eq!(std::fs::read_to_string(canonical.join("SKILL.md")).unwrap(), "new");
        assert_eq!(std::fs::read_dir(temp.path().join(".agents/skills")).unwrap().count(), 1);
    }

    #[test]
    fn test_rollback_disabled_leaves_artifacts() {
        let temp = create_temp_dir();
        let a = RecordingSystem::new("a");
        install(&a, temp.path());

        {
            let mut tx = InstallTransaction::new(&asset(), temp.path(), false);
            tx.track_system(&a);
        }

        assert!(a.has("skill", "lint"));
    }
}
