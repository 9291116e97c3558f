//! Installed-asset scan

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::Orchestrator;
use crate::error::Result;
use crate::system::InstalledAsset;

impl Orchestrator<'_> {
    /// Assets installed in `project_dir`, per kind, across the active systems.
    ///
    /// An asset present for several systems is reported once, by the first
    /// system (catalog order) that has it.
    pub fn scan_folder(&self, project_dir: &Path) -> Result<BTreeMap<String, Vec<InstalledAsset>>> {
        let active = self.systems.detect_active(project_dir);
        let mut by_kind = BTreeMap::new();

        for kind in self.handlers.kinds() {
            let mut seen = HashSet::new();
            let mut found = Vec::new();
            for system in active.iter().filter(|s| s.supports(kind)) {
                for asset in system.scan(kind, project_dir)? {
                    if seen.insert(asset.name.clone()) {
                        found.push(asset);
                    }
                }
            }
            by_kind.insert(kind.to_string(), found);
        }

        Ok(by_kind)
    }

    /// Whether `(kind, name)` is present on disk
    pub(super) fn is_present(
        &self,
        kind: &str,
        name: &str,
        project_dir: &Path,
        scanned: &BTreeMap<String, Vec<InstalledAsset>>,
    ) -> bool {
        let file_based = self.handlers.get(kind).is_some_and(|h| h.is_file_based());
        if file_based {
            return crate::system::canonical_asset_dir(project_dir, kind, name).exists();
        }
        scanned
            .get(kind)
            .is_some_and(|assets| assets.iter().any(|a| a.name == name))
    }
}
