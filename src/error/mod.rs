//! Error types and handling for duckrow
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//! Clone failures carry their own classified type ([`CloneError`]) so the
//! remediation hints travel with them.

pub mod fs;

use miette::Diagnostic;
use thiserror::Error;

pub use crate::git::error::{CloneError, CloneErrorKind};

/// Main error type for duckrow operations
#[derive(Error, Diagnostic, Debug)]
pub enum DuckrowError {
    // Source errors
    #[error("Unrecognized source format: {input}: {reason}")]
    #[diagnostic(
        code(duckrow::source::parse_failed),
        help(
            "Valid formats: owner/repo, owner/repo@skill, owner/repo/path, host/owner/repo/path, \
             https://host/owner/repo, git@host:owner/repo.git, ./local/path"
        )
    )]
    SourceParseFailed { input: String, reason: String },

    #[error("Local path sources are disabled: {path}")]
    #[diagnostic(
        code(duckrow::source::local_not_allowed),
        help("Set settings.allowLocalSources to true in the duckrow config to allow them")
    )]
    LocalSourceNotAllowed { path: String },

    // Asset errors
    #[error("Unknown asset kind: {kind}")]
    #[diagnostic(code(duckrow::asset::unknown_kind), help("Known kinds: skill, mcp"))]
    UnknownAssetKind { kind: String },

    #[error("No {kind} found in {source_desc}")]
    #[diagnostic(
        code(duckrow::asset::none_found),
        help("Check the sub-path and name filter of the source")
    )]
    NoAssetsFound { kind: String, source_desc: String },

    #[error("Invalid {kind} '{name}': {reason}")]
    #[diagnostic(code(duckrow::asset::validation_failed))]
    AssetValidationFailed {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("{kind} '{name}' is not installed")]
    #[diagnostic(
        code(duckrow::asset::not_installed),
        help("Run 'duckrow list' to see installed assets")
    )]
    AssetNotInstalled { kind: String, name: String },

    // System errors
    #[error("Unknown system: {name}")]
    #[diagnostic(
        code(duckrow::system::not_found),
        help(
            "Supported systems: codex, opencode, cursor, github-copilot, claude-code, windsurf, gemini-cli"
        )
    )]
    SystemNotFound { name: String },

    #[error("No target system supports {kind}")]
    #[diagnostic(code(duckrow::system::none_compatible))]
    NoCompatibleSystems { kind: String },

    #[error("Failed to install '{name}' for {system}: {reason}")]
    #[diagnostic(code(duckrow::system::install_failed))]
    SystemInstallFailed {
        system: String,
        name: String,
        reason: String,
    },

    // Git errors
    #[error(transparent)]
    #[diagnostic(transparent)]
    Clone(#[from] CloneError),

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(duckrow::git::operation_failed))]
    GitOperationFailed { message: String },

    #[error("Failed to resolve latest commit for '{path}': {reason}")]
    #[diagnostic(code(duckrow::git::commit_resolve_failed))]
    CommitResolveFailed { path: String, reason: String },

    // Lockfile errors
    #[error("Failed to parse lock file: {path}: {reason}")]
    #[diagnostic(
        code(duckrow::lockfile::parse_failed),
        help("Fix or delete the lock file, then run 'duckrow sync'")
    )]
    LockfileParseFailed { path: String, reason: String },

    // Configuration errors
    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(duckrow::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // Registry errors
    #[error("Registry '{name}' not found")]
    #[diagnostic(
        code(duckrow::registry::not_found),
        help("Run 'duckrow registry list' to see configured registries")
    )]
    RegistryNotFound { name: String },

    #[error("Registry '{name}' already exists")]
    #[diagnostic(code(duckrow::registry::duplicate))]
    RegistryExists { name: String },

    #[error("Invalid registry manifest for '{registry}': {reason}")]
    #[diagnostic(code(duckrow::registry::manifest_invalid))]
    ManifestParseFailed { registry: String, reason: String },

    #[error("No registry entry named '{name}'")]
    #[diagnostic(code(duckrow::registry::entry_not_found))]
    RegistryEntryNotFound { name: String },

    // Batch errors
    #[error("{failed} asset(s) failed to {action}")]
    #[diagnostic(
        code(duckrow::batch::incomplete),
        help("Run with --verbose for details")
    )]
    Incomplete { action: String, failed: usize },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(duckrow::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(duckrow::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(duckrow::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(duckrow::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for DuckrowError {
    fn from(err: std::io::Error) -> Self {
        DuckrowError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for DuckrowError {
    fn from(err: serde_yaml::Error) -> Self {
        DuckrowError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DuckrowError {
    fn from(err: serde_json::Error) -> Self {
        DuckrowError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<git2::Error> for DuckrowError {
    fn from(err: git2::Error) -> Self {
        DuckrowError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

impl From<inquire::InquireError> for DuckrowError {
    fn from(err: inquire::InquireError) -> Self {
        DuckrowError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, DuckrowError>;
