//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - uninstall: Uninstall command arguments
//! - list: List command arguments
//! - sync: Sync command arguments
//! - update: Outdated and update command arguments
//! - registry: Registry command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod install;
pub mod list;
pub mod registry;
pub mod sync;
pub mod uninstall;
pub mod update;

pub use completions::CompletionsArgs;
pub use install::InstallArgs;
pub use list::ListArgs;
pub use registry::{RegistryArgs, RegistrySubcommand};
pub use sync::SyncArgs;
pub use uninstall::UninstallArgs;
pub use update::{OutdatedArgs, UpdateArgs};

/// Duckrow - skills and MCP servers for AI coding agents
#[derive(Parser, Debug)]
#[command(
    name = "duckrow",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Package manager for skills and MCP servers used by AI coding agents",
    long_about = "Duckrow installs skills and MCP server configurations from git repositories \
                  into every AI coding agent used in a project (Claude Code, Cursor, Codex, ...) \
                  and pins them to exact commits in duckrow.lock.json.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  duckrow install acme/skills              \x1b[90m# Install every skill in a repository\x1b[0m\n   \
                  duckrow install acme/skills@lint         \x1b[90m# Install one skill\x1b[0m\n   \
                  duckrow install acme/mcp --kind mcp      \x1b[90m# Install MCP servers\x1b[0m\n   \
                  duckrow sync                             \x1b[90m# Reinstall what the lock file pins\x1b[0m\n   \
                  duckrow outdated                         \x1b[90m# Check for newer commits\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(long, short = 'C', global = true, env = "DUCKROW_PROJECT")]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install assets from a source or registry
    Install(InstallArgs),

    /// Remove an installed asset
    Uninstall(UninstallArgs),

    /// List installed assets
    List(ListArgs),

    /// Install everything pinned in the lock file
    Sync(SyncArgs),

    /// Show locked assets with newer commits available
    Outdated(OutdatedArgs),

    /// Reinstall locked assets at their newest commits
    Update(UpdateArgs),

    /// Manage registries
    Registry(RegistryArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
