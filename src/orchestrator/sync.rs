//! Reinstall from the lock file

use std::path::PathBuf;

use super::{InstallOptions, InstallResult, Orchestrator};
use crate::error::{DuckrowError, Result};
use crate::lockfile::{LockFile, LockedAsset};
use crate::source::{ParsedSource, parse_source};

/// Options for [`Orchestrator::sync_from_lock`]
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub project_dir: PathBuf,
    /// Reinstall assets that already look present
    pub force: bool,
    pub systems: Option<Vec<String>>,
    pub copy: bool,
}

impl SyncOptions {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            force: false,
            systems: None,
            copy: false,
        }
    }
}

/// A locked asset that could not be synced
#[derive(Debug)]
pub struct SyncError {
    pub kind: String,
    pub name: String,
    pub error: DuckrowError,
}

/// Outcome of a sync; per-asset failures are collected, not raised
#[derive(Debug, Default)]
pub struct SyncResult {
    pub installed: usize,
    pub skipped: usize,
    pub errors: Vec<SyncError>,
}

impl Orchestrator<'_> {
    /// Reinstall every locked asset that is missing (or all, with `force`),
    /// pinned to its locked commit, into the systems it was installed into.
    pub fn sync_from_lock(&self, lock: &LockFile, options: &SyncOptions) -> Result<SyncResult> {
        let scanned = self.scan_folder(&options.project_dir)?;
        let mut result = SyncResult::default();

        for entry in &lock.assets {
            if !options.force && self.is_present(&entry.kind, &entry.name, &options.project_dir, &scanned) {
                tracing::debug!("{} {} already present, skipping", entry.kind, entry.name);
                result.skipped += 1;
                continue;
            }

            let install_options = InstallOptions {
                systems: options.systems.clone(),
                copy: options.copy,
                ..InstallOptions::new(&options.project_dir)
            };
            let commit = Some(entry.commit.as_str()).filter(|c| !c.is_empty());
            match self.install_locked(entry, commit, &install_options) {
                Ok(_) => result.installed += 1,
                Err(error) => {
                    tracing::warn!("failed to sync {} {}: {error}", entry.kind, entry.name);
                    result.errors.push(SyncError {
                        kind: entry.kind.clone(),
                        name: entry.name.clone(),
                        error,
                    });
                }
            }
        }

        Ok(result)
    }

    /// Known systems the lock entry was installed into. `None` when nothing
    /// usable was recorded, so the universal defaults apply.
    fn recorded_systems(&self, entry: &LockedAsset) -> Option<Vec<String>> {
        let known: Vec<String> = entry
            .systems()?
            .into_iter()
            .filter(|name| {
                let found = self.systems.get(name).is_some();
                if !found {
                    tracing::debug!("{} {}: recorded system {name} is unknown", entry.kind, entry.name);
                }
                found
            })
            .collect();
        (!known.is_empty()).then_some(known)
    }

    /// Reinstall one locked asset from its recorded source, at `commit` when
    /// given. Without explicit systems it goes back to the recorded ones.
    pub fn install_locked(
        &self,
        entry: &LockedAsset,
        commit: Option<&str>,
        options: &InstallOptions,
    ) -> Result<Vec<InstallResult>> {
        let handler = self.handler(&entry.kind)?;
        let systems = options.systems.clone().or_else(|| self.recorded_systems(entry));
        if let Some(asset) = handler.asset_from_lock(entry) {
            let options = InstallOptions {
                systems,
                ..options.clone()
            };
            return Ok(vec![self.install_declared(handler, asset, entry.source.clone(), &options)?]);
        }

        let mut source = parse_source(&entry.source, self.source_policy)?;
        if let ParsedSource::Git(descriptor) = &mut source {
            descriptor.git_ref.clone_from(&entry.git_ref);
        }

        let options = InstallOptions {
            systems,
            commit: commit.map(str::to_string),
            name_filter: Some(entry.name.clone()),
            include_internal: true,
            ..options.clone()
        };
        self.install_from_source(&source, &entry.kind, &options)
    }
}
