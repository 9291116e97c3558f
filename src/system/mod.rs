//! Target systems (AI coding agents) and their file-layout conventions
//!
//! This module handles:
//! - The [`System`] trait the orchestrator fans installs out to
//! - Data-driven agent definitions ([`AgentSystem`]) and the default catalog
//! - The canonical skill location universal systems read from
//! - Symlinking (with copy fallback) and MCP config patching

pub mod agent;
pub mod catalog;
pub mod link;
pub mod mcp_config;

use std::path::{Path, PathBuf};

use crate::asset::{Asset, KIND_SKILL};
use crate::error::Result;

pub use agent::{AgentSystem, McpTarget};
pub use catalog::SystemCatalog;

/// Canonical location of file-based skills, relative to the project
pub const CANONICAL_SKILLS_DIR: &str = ".agents/skills";

/// Canonical directory of skill `name` in `project_dir`
pub fn canonical_skill_dir(project_dir: &Path, name: &str) -> PathBuf {
    project_dir.join(CANONICAL_SKILLS_DIR).join(name)
}

/// Canonical directory of a file-based asset of any kind
pub fn canonical_asset_dir(project_dir: &Path, kind: &str, name: &str) -> PathBuf {
    if kind == KIND_SKILL {
        canonical_skill_dir(project_dir, name)
    } else {
        project_dir.join(".agents").join(kind).join(name)
    }
}

/// Per-system install options
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInstallOptions {
    /// Copy skill directories instead of symlinking them
    pub copy: bool,
}

/// An asset found in a system's layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledAsset {
    pub kind: String,
    pub name: String,
    /// System that reported it
    pub system: String,
    pub path: PathBuf,
}

/// An AI coding agent with its own conventions for consuming assets
pub trait System {
    /// Stable identifier, e.g. `claude-code`
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Reads skills straight from the canonical location
    fn is_universal(&self) -> bool;

    fn supports(&self, kind: &str) -> bool;

    /// Whether the project shows signs of this system being used
    fn is_active(&self, project_dir: &Path) -> bool;

    fn install(&self, asset: &Asset, project_dir: &Path, options: &SystemInstallOptions)
    -> Result<()>;

    /// Remove this system's artifact for the asset. `Ok(false)` when there was none.
    fn remove(&self, kind: &str, name: &str, project_dir: &Path) -> Result<bool>;

    fn scan(&self, kind: &str, project_dir: &Path) -> Result<Vec<InstalledAsset>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_skill_dir() {
        let dir = canonical_skill_dir(Path::new("/work/project"), "lint");
        assert_eq!(dir, PathBuf::from("/work/project/.agents/skills/lint"));
        assert_eq!(
            canonical_asset_dir(Path::new("/p"), "agent", "reviewer"),
            PathBuf::from("/p/.agents/agent/reviewer")
        );
    }
}
