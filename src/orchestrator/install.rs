//! Install from a parsed source

use std::path::{Path, PathBuf};

use super::{InstallOptions, InstallResult, Orchestrator};
use crate::asset::{Asset, AssetHandler, DiscoverOptions, InstallInfo, RegistryEntry, registry_source};
use crate::common::fs::copy_dir_recursive;
use crate::error::{DuckrowError, Result, fs as fs_err};
use crate::git::Checkout;
use crate::lockfile;
use crate::source::ParsedSource;
use crate::system::{System, SystemInstallOptions, canonical_asset_dir};
use crate::transaction::InstallTransaction;

/// Where discovered content lives for the duration of an install
enum Tree {
    /// A clone; removed when dropped
    Cloned(Checkout),
    Local(PathBuf),
}

impl Tree {
    fn root(&self) -> &Path {
        match self {
            Tree::Cloned(checkout) => checkout.path(),
            Tree::Local(path) => path,
        }
    }
}

impl Orchestrator<'_> {
    /// Clone `source`, discover and validate assets of `kind`, install each
    /// one into every compatible target system, and record it in the lock file.
    ///
    /// Nothing is installed if discovery finds nothing or any asset fails
    /// validation. A system failure aborts the install of that asset; with
    /// `rollback_on_failure` the systems already done are undone first.
    pub fn install_from_source(
        &self,
        source: &ParsedSource,
        kind: &str,
        options: &InstallOptions,
    ) -> Result<Vec<InstallResult>> {
        let handler = self.handler(kind)?;
        let tree = self.fetch(source, options)?;
        let root = tree.root();

        let (sub_path, source_filter, git_ref) = match source {
            ParsedSource::Git(d) => (d.sub_path.clone(), d.name_filter.clone(), d.git_ref.clone()),
            ParsedSource::Local(_) => (String::new(), None, None),
        };
        let discover_options = DiscoverOptions {
            sub_path,
            name_filter: options.name_filter.clone().or(source_filter),
            include_internal: options.include_internal,
        };

        let assets = handler.discover(root, &discover_options)?;
        if assets.is_empty() {
            return Err(DuckrowError::NoAssetsFound {
                kind: handler.display_name().to_string(),
                source_desc: describe(source),
            });
        }
        for asset in &assets {
            handler.validate(asset)?;
        }

        let targets = self.resolve_targets(kind, options.systems.as_deref())?;

        let mut results = Vec::with_capacity(assets.len());
        for mut asset in assets {
            let rel_path = relative_path(root, asset.prepared_path.as_deref());
            if asset.source.is_empty() {
                asset.source = backfill_source(source, root, &rel_path);
            }
            let commit = self.resolve_commit(source, root, &rel_path, options)?;
            let info = InstallInfo {
                source: asset.source.clone(),
                commit: commit.clone(),
                git_ref: git_ref.clone(),
            };
            let systems = self.install_asset(handler, &asset, &targets, &info, options)?;
            results.push(InstallResult {
                source: info.source,
                asset,
                systems,
                commit,
            });
        }

        Ok(results)
    }

    /// Install an asset a registry defines inline (no source to clone).
    ///
    /// The lock entry records `registry:<registry>/<name>` and carries the
    /// definition so that sync can restore it.
    pub fn install_registry_entry(
        &self,
        kind: &str,
        registry: &str,
        entry: &RegistryEntry,
        options: &InstallOptions,
    ) -> Result<InstallResult> {
        let handler = self.handler(kind)?;
        let asset = handler
            .asset_from_entry(entry)
            .ok_or_else(|| DuckrowError::SourceParseFailed {
                input: entry.name.clone(),
                reason: format!("registry '{registry}' lists neither a source nor a definition for it"),
            })?;
        self.install_declared(handler, asset, registry_source(registry, &entry.name), options)
    }

    /// Validate and install one asset that needs no clone
    pub(super) fn install_declared(
        &self,
        handler: &dyn AssetHandler,
        mut asset: Asset,
        source: String,
        options: &InstallOptions,
    ) -> Result<InstallResult> {
        handler.validate(&asset)?;
        let targets = self.resolve_targets(&asset.kind, options.systems.as_deref())?;
        asset.source.clone_from(&source);
        let info = InstallInfo {
            source,
            commit: String::new(),
            git_ref: None,
        };
        let systems = self.install_asset(handler, &asset, &targets, &info, options)?;
        Ok(InstallResult {
            asset,
            systems,
            commit: info.commit,
            source: info.source,
        })
    }

    fn fetch(&self, source: &ParsedSource, options: &InstallOptions) -> Result<Tree> {
        match source {
            ParsedSource::Local(path) => {
                let path = dunce::canonicalize(path).map_err(|_| DuckrowError::FileNotFound {
                    path: path.display().to_string(),
                })?;
                Ok(Tree::Local(path))
            }
            ParsedSource::Git(descriptor) => {
                let mut descriptor = descriptor.clone();
                if descriptor.apply_clone_url_override(&self.clone_url_overrides) {
                    tracing::debug!("using clone URL override {}", descriptor.clone_url);
                }
                tracing::debug!("cloning {}", descriptor.clone_url);
                let checkout = match options.commit.as_deref() {
                    Some(commit) => self.git.clone_pinned(&descriptor.clone_url, commit)?,
                    None => self
                        .git
                        .clone_shallow(&descriptor.clone_url, descriptor.git_ref.as_deref())?,
                };
                Ok(Tree::Cloned(checkout))
            }
        }
    }

    /// Pinned commit, else the latest commit touching the asset's path
    fn resolve_commit(
        &self,
        source: &ParsedSource,
        root: &Path,
        rel_path: &str,
        options: &InstallOptions,
    ) -> Result<String> {
        if let Some(commit) = &options.commit {
            return Ok(commit.clone());
        }
        match source {
            ParsedSource::Git(_) => self.git.latest_commit(root, rel_path),
            ParsedSource::Local(_) => Ok(String::new()),
        }
    }

    /// Canonical copy, fan-out to every target, lock entry. All or nothing.
    fn install_asset(
        &self,
        handler: &dyn AssetHandler,
        asset: &Asset,
        targets: &[&dyn System],
        info: &InstallInfo,
        options: &InstallOptions,
    ) -> Result<Vec<String>> {
        let project_dir = &options.project_dir;
        let mut tx = InstallTransaction::new(asset, project_dir, options.rollback_on_failure);
        let had_asset: Vec<bool> = targets
            .iter()
            .map(|system| has_asset(*system, asset, project_dir))
            .collect();

        if handler.is_file_based() {
            let canonical = canonical_asset_dir(project_dir, &asset.kind, &asset.name);
            let prepared = asset.prepared_path.as_deref().ok_or_else(|| {
                DuckrowError::AssetValidationFailed {
                    kind: asset.kind.clone(),
                    name: asset.name.clone(),
                    reason: "no content to install".to_string(),
                }
            })?;
            if std::fs::symlink_metadata(&canonical).is_ok() {
                tx.stage_canonical_replacement(&canonical)
                    .map_err(|e| fs_err::write_failed(&canonical, e))?;
            } else {
                tx.track_canonical_created(&canonical);
            }
            copy_dir_recursive(prepared, &canonical)
                .map_err(|e| fs_err::write_failed(&canonical, e))?;
        }

        let system_options = SystemInstallOptions { copy: options.copy };
        for (system, had) in targets.iter().zip(had_asset) {
            tracing::debug!("installing {} {} into {}", asset.kind, asset.name, system.name());
            system.install(asset, project_dir, &system_options)?;
            if had {
                tx.track_system_reinstalled(*system);
            } else {
                tx.track_system(*system);
            }
        }

        let systems = tx.system_names();
        let mut entry = handler.lock_data(asset, info);
        entry.set_systems(&systems);
        lockfile::upsert(project_dir, entry)?;

        tx.commit();
        Ok(systems)
    }
}

/// Whether `system` already reports the asset as installed
fn has_asset(system: &dyn System, asset: &Asset, project_dir: &Path) -> bool {
    system
        .scan(&asset.kind, project_dir)
        .is_ok_and(|found| found.iter().any(|a| a.name == asset.name))
}

/// `path` relative to `root`, with forward slashes ("" for the root itself)
fn relative_path(root: &Path, path: Option<&Path>) -> String {
    path.and_then(|p| p.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

fn backfill_source(source: &ParsedSource, root: &Path, rel_path: &str) -> String {
    match source {
        ParsedSource::Git(d) => d.canonical_for(rel_path),
        ParsedSource::Local(_) => {
            let path = if rel_path.is_empty() {
                root.to_path_buf()
            } else {
                root.join(rel_path)
            };
            path.display().to_string()
        }
    }
}

fn describe(source: &ParsedSource) -> String {
    match source {
        ParsedSource::Git(d) => match &d.name_filter {
            Some(name) => format!("{}@{name}", d.canonical()),
            None => d.canonical(),
        },
        ParsedSource::Local(path) => path.display().to_string(),
    }
}
