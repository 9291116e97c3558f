//! Install, remove, scan, and sync orchestration
//!
//! The orchestrator composes the source parser, the asset handler registry,
//! the git client, and the system catalog. It never inspects kind-specific
//! asset data; everything kind-specific goes through the [`AssetHandler`].
//!
//! ## Module Organization
//!
//! - `install.rs`: install from a parsed source (all-or-nothing per asset)
//! - `remove.rs`: uninstall from every system and the canonical location
//! - `scan.rs`: report what is installed in a folder
//! - `sync.rs`: reinstall from the lock file (best effort, partial success)
//!
//! [`AssetHandler`]: crate::asset::AssetHandler

mod install;
mod remove;
mod scan;
mod sync;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::asset::{Asset, AssetHandler, HandlerRegistry};
use crate::error::{DuckrowError, Result};
use crate::git::GitClient;
use crate::source::SourcePolicy;
use crate::system::{System, SystemCatalog};

pub use sync::{SyncError, SyncOptions, SyncResult};

/// Options for [`Orchestrator::install_from_source`]
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub project_dir: PathBuf,
    /// Explicit target systems; `None` targets the universal systems
    pub systems: Option<Vec<String>>,
    /// Install exactly this commit
    pub commit: Option<String>,
    /// Only install the asset with this name
    pub name_filter: Option<String>,
    /// Include assets marked internal
    pub include_internal: bool,
    /// Undo completed systems when a later one fails
    pub rollback_on_failure: bool,
    /// Copy instead of symlinking into non-universal systems
    pub copy: bool,
}

impl InstallOptions {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            systems: None,
            commit: None,
            name_filter: None,
            include_internal: false,
            rollback_on_failure: true,
            copy: false,
        }
    }
}

/// Outcome of installing one asset
#[derive(Debug, Clone)]
pub struct InstallResult {
    pub asset: Asset,
    /// Systems the asset was installed into
    pub systems: Vec<String>,
    pub commit: String,
    /// Canonical source recorded in the lock file
    pub source: String,
}

pub struct Orchestrator<'a> {
    handlers: &'a HandlerRegistry,
    systems: &'a SystemCatalog,
    git: &'a dyn GitClient,
    clone_url_overrides: HashMap<String, String>,
    source_policy: SourcePolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(handlers: &'a HandlerRegistry, systems: &'a SystemCatalog, git: &'a dyn GitClient) -> Self {
        Self {
            handlers,
            systems,
            git,
            clone_url_overrides: HashMap::new(),
            source_policy: SourcePolicy::default(),
        }
    }

    /// Clone URL overrides keyed by `owner/repo`
    pub fn with_clone_url_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.clone_url_overrides = overrides;
        self
    }

    /// Policy applied when re-parsing lock file sources
    pub fn with_source_policy(mut self, policy: SourcePolicy) -> Self {
        self.source_policy = policy;
        self
    }

    fn handler(&self, kind: &str) -> Result<&'a dyn AssetHandler> {
        self.handlers
            .get(kind)
            .ok_or_else(|| DuckrowError::UnknownAssetKind {
                kind: kind.to_string(),
            })
    }

    /// Explicit systems (validated) or the universal ones, filtered to `kind`
    fn resolve_targets(&self, kind: &str, explicit: Option<&[String]>) -> Result<Vec<&'a dyn System>> {
        let candidates: Vec<&'a dyn System> = match explicit {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|name| {
                    self.systems
                        .get(name)
                        .ok_or_else(|| DuckrowError::SystemNotFound { name: name.clone() })
                })
                .collect::<Result<_>>()?,
            _ => self.systems.universal(),
        };

        let targets: Vec<_> = candidates.into_iter().filter(|s| s.supports(kind)).collect();
        if targets.is_empty() {
            return Err(DuckrowError::NoCompatibleSystems {
                kind: kind.to_string(),
            });
        }
        Ok(targets)
    }
}
