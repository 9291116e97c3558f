//! Command helper utilities

use std::path::{Path, PathBuf};

use console::Style;

use crate::asset::HandlerRegistry;
use crate::config::{self, Config};
use crate::error::{DuckrowError, Result};
use crate::git::CommandGit;
use crate::lockfile::{self, LockFile};
use crate::orchestrator::Orchestrator;
use crate::registry::RegistryManager;
use crate::system::SystemCatalog;

/// Resolve project path from optional argument
///
/// If a project path is provided, use it. Otherwise,
/// resolve to the current directory.
pub fn resolve_project_path(project: Option<PathBuf>) -> Result<PathBuf> {
    match project {
        Some(path) => Ok(path),
        None => std::env::current_dir().map_err(|e| DuckrowError::IoError {
            message: format!("Failed to get current directory: {e}"),
        }),
    }
}

/// Everything a command needs, built once per invocation
pub struct Context {
    pub project_dir: PathBuf,
    pub config: Config,
    pub handlers: HandlerRegistry,
    pub systems: SystemCatalog,
    pub git: CommandGit,
}

impl Context {
    pub fn load(project: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            project_dir: resolve_project_path(project)?,
            config: Config::load()?,
            handlers: HandlerRegistry::new(),
            systems: SystemCatalog::default(),
            git: CommandGit::new(),
        })
    }

    pub fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator::new(&self.handlers, &self.systems, &self.git)
            .with_clone_url_overrides(self.config.clone_url_overrides())
            .with_source_policy(self.config.source_policy())
    }

    pub fn registries(&self) -> RegistryManager<'_> {
        RegistryManager::new(&config::duckrow_home(), &self.handlers, &self.git)
            .with_clone_url_overrides(self.config.clone_url_overrides())
    }

    /// Fail early on kinds without a handler
    pub fn check_kind(&self, kind: &str) -> Result<()> {
        if self.handlers.get(kind).is_none() {
            return Err(DuckrowError::UnknownAssetKind {
                kind: kind.to_string(),
            });
        }
        Ok(())
    }

    /// The project's lock file; missing reads as empty
    pub fn lock(&self) -> Result<LockFile> {
        Ok(lockfile::read(&self.project_dir)?.unwrap_or_default())
    }

    /// Remember the project folder in the user config; failures only warn
    pub fn track_folder(&mut self) {
        if self.config.add_folder(&self.project_dir) {
            if let Err(e) = self.config.save() {
                tracing::warn!("could not record {} in config: {e}", self.project_dir.display());
            }
        }
    }
}

/// First seven characters of a commit, or "-" when unknown
pub fn short_commit(commit: &str) -> &str {
    if commit.is_empty() {
        return "-";
    }
    commit.get(..7).unwrap_or(commit)
}

pub fn success(message: &str) {
    println!("{} {message}", Style::new().green().bold().apply_to("✓"));
}

pub fn failure(message: &str) {
    eprintln!("{} {message}", Style::new().red().bold().apply_to("✗"));
}

pub fn dim(text: &str) -> String {
    Style::new().dim().apply_to(text).to_string()
}

pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
