//! Asset source handling
//!
//! This module parses user-supplied source strings into structured
//! descriptors. Recognized forms, in precedence order:
//! - Local paths: `./skills/lint`, `../shared`, `/abs/path`, `~/skills`
//! - SCP-style SSH: `git@github.com:owner/repo.git` (host aliases kept verbatim)
//! - URLs: `https://host/owner/repo`, `https://github.com/owner/repo/tree/<ref>/<path>`
//! - Filter syntax: `owner/repo@skill-name`
//! - Canonical cross-host form: `host/owner/repo/path/to/asset`
//! - GitHub shorthand: `owner/repo/path/to/asset`, `owner/repo`
//!
//! ## Module Organization
//!
//! - `parser.rs`: the per-form parsers
//! - this file: `SourceDescriptor`, canonical source strings, clone-URL overrides

mod parser;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{DuckrowError, Result};

/// Host assumed by shorthand forms
pub const DEFAULT_HOST: &str = "github.com";

/// A parsed git source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub host: String,
    pub owner: String,
    pub repo: String,
    /// Fetchable URL. Literal git URLs from the input are kept verbatim.
    pub clone_url: String,
    /// Branch or tag, when the source names one
    pub git_ref: Option<String>,
    /// Path of the asset inside the repository ("" for the root)
    pub sub_path: String,
    /// Single-asset selector from `owner/repo@name`
    pub name_filter: Option<String>,
}

/// Result of parsing a source string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSource {
    Local(PathBuf),
    Git(SourceDescriptor),
}

/// Whether local-path sources are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePolicy {
    pub allow_local: bool,
}

impl Default for SourcePolicy {
    fn default() -> Self {
        Self { allow_local: true }
    }
}

impl SourcePolicy {
    pub fn git_only() -> Self {
        Self { allow_local: false }
    }
}

/// Parse `input` under `policy`
pub fn parse_source(input: &str, policy: SourcePolicy) -> Result<ParsedSource> {
    parser::parse(input, policy)
}

/// Canonical `host/owner/repo[/sub_path]` string used in lock files.
pub fn normalize_source(host: &str, owner: &str, repo: &str, sub_path: &str) -> String {
    let sub = sub_path.replace('\\', "/");
    let sub = sub.trim_matches('/');
    if sub.is_empty() || sub == "." {
        format!("{host}/{owner}/{repo}")
    } else {
        format!("{host}/{owner}/{repo}/{sub}")
    }
}

impl SourceDescriptor {
    /// Build a descriptor with a synthesized `https://host/owner/repo.git` clone URL
    pub fn new(host: &str, owner: &str, repo: &str, sub_path: &str) -> Self {
        Self {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            clone_url: format!("https://{host}/{owner}/{repo}.git"),
            git_ref: None,
            sub_path: sub_path.trim_matches('/').to_string(),
            name_filter: None,
        }
    }

    /// Parse a git source; local paths are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        match parse_source(input, SourcePolicy::git_only())? {
            ParsedSource::Git(descriptor) => Ok(descriptor),
            ParsedSource::Local(path) => Err(DuckrowError::LocalSourceNotAllowed {
                path: path.display().to_string(),
            }),
        }
    }

    /// Lowercase `owner/repo`, or "" when either part is unset
    pub fn repo_key(&self) -> String {
        if self.owner.is_empty() || self.repo.is_empty() {
            return String::new();
        }
        format!("{}/{}", self.owner, self.repo).to_lowercase()
    }

    /// Canonical source string for this descriptor
    pub fn canonical(&self) -> String {
        normalize_source(&self.host, &self.owner, &self.repo, &self.sub_path)
    }

    /// Canonical source string for a path inside this repository
    pub fn canonical_for(&self, repo_path: &str) -> String {
        normalize_source(&self.host, &self.owner, &self.repo, repo_path)
    }

    /// Replace `clone_url` with a configured override for this repository.
    ///
    /// Returns whether a substitution happened.
    pub fn apply_clone_url_override(&mut self, overrides: &HashMap<String, String>) -> bool {
        let key = self.repo_key();
        if key.is_empty() || overrides.is_empty() {
            return false;
        }
        let found = overrides.get(&key).or_else(|| {
            overrides
                .iter()
                .find(|(k, _)| k.to_lowercase() == key)
                .map(|(_, v)| v)
        });
        match found {
            Some(url) if !url.trim().is_empty() => {
                self.clone_url = url.trim().to_string();
                true
            }
            _ => false,
        }
    }
}
