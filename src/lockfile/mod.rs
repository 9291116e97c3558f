//! Lock file (duckrow.lock.json)
//!
//! The lock file pins every installed asset to the exact source commit it was
//! installed from. It is keyed by `(kind, name)` and always written sorted by
//! that key so that diffs stay stable under version control.
//!
//! ## Format
//!
//! ```json
//! {
//!   "lockVersion": 2,
//!   "assets": [
//!     { "kind": "skill", "name": "lint", "source": "github.com/acme/skills/lint", "commit": "..." }
//!   ]
//! }
//! ```
//!
//! The older flat `{"skills": [...], "mcps": [...]}` layout is migrated in
//! memory on read (see [`legacy`]). Reading never rewrites the file.

mod legacy;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::fs::write_atomic;
use crate::error::{DuckrowError, Result, fs as fs_err};

/// Lock file name inside a project directory
pub const LOCK_FILE_NAME: &str = "duckrow.lock.json";

/// Schema version written by this build
pub const LOCK_VERSION: u32 = 2;

/// One installed asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedAsset {
    pub kind: String,
    pub name: String,
    /// Canonical `host/owner/repo[/subpath]`
    pub source: String,
    /// Full commit SHA pinned at install time
    #[serde(default)]
    pub commit: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// Kind-specific data, e.g. an MCP config hash
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
}

/// `data` key holding the systems an asset was installed into
pub const DATA_SYSTEMS: &str = "systems";

impl LockedAsset {
    fn key(&self) -> (&str, &str) {
        (&self.kind, &self.name)
    }

    /// Systems recorded at install time, if any
    pub fn systems(&self) -> Option<Vec<String>> {
        let names: Vec<String> = self
            .data
            .get(DATA_SYSTEMS)?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        (!names.is_empty()).then_some(names)
    }

    pub fn set_systems(&mut self, systems: &[String]) {
        self.data.insert(
            DATA_SYSTEMS.to_string(),
            serde_json::Value::Array(systems.iter().cloned().map(serde_json::Value::String).collect()),
        );
    }
}

/// The lock file aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    pub lock_version: u32,
    #[serde(default)]
    pub assets: Vec<LockedAsset>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            lock_version: LOCK_VERSION,
            assets: Vec::new(),
        }
    }
}

impl LockFile {
    /// Parse lock file JSON, migrating the flat legacy layout when present
    pub fn from_json(json: &str) -> std::result::Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let Some(object) = value.as_object() else {
            return Err("expected a JSON object".to_string());
        };

        if legacy::is_legacy(object) {
            let legacy: legacy::LegacyLockFile =
                serde_json::from_value(value).map_err(|e| e.to_string())?;
            return Ok(legacy.migrate());
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    /// Serialize with the current schema version, sorted, 2-space indented,
    /// trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut normalized = self.clone();
        normalized.lock_version = LOCK_VERSION;
        normalized.sort();
        let mut json = serde_json::to_string_pretty(&normalized)?;
        json.push('\n');
        Ok(json)
    }

    /// Sort entries by `(kind, name)`
    pub fn sort(&mut self) {
        self.assets.sort_by(|a, b| a.key().cmp(&b.key()));
    }

    pub fn find(&self, kind: &str, name: &str) -> Option<&LockedAsset> {
        self.assets.iter().find(|a| a.key() == (kind, name))
    }

    /// Entries of one kind, in file order
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a LockedAsset> + 'a {
        self.assets.iter().filter(move |a| a.kind == kind)
    }

    /// Replace the entry with the same `(kind, name)` or append
    pub fn upsert(&mut self, entry: LockedAsset) {
        match self.assets.iter_mut().find(|a| a.key() == entry.key()) {
            Some(existing) => *existing = entry,
            None => self.assets.push(entry),
        }
    }

    /// Remove the entry with `(kind, name)`; returns whether one existed
    pub fn remove(&mut self, kind: &str, name: &str) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| a.key() != (kind, name));
        self.assets.len() != before
    }
}

/// Path of the lock file in `dir`
pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE_NAME)
}

/// Read the lock file in `dir`. A missing file is `Ok(None)`.
pub fn read(dir: &Path) -> Result<Option<LockFile>> {
    let path = lock_path(dir);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(fs_err::read_failed(&path, e)),
    };

    LockFile::from_json(&content)
        .map(Some)
        .map_err(|reason| DuckrowError::LockfileParseFailed {
            path: path.display().to_string(),
            reason,
        })
}

/// Atomically write `lock` to `dir`
pub fn write(dir: &Path, lock: &LockFile) -> Result<()> {
    let json = lock.to_json()?;
    write_atomic(&lock_path(dir), json.as_bytes())
}

/// Read-modify-write: insert or replace the entry keyed by `(kind, name)`
pub fn upsert(dir: &Path, entry: LockedAsset) -> Result<()> {
    let mut lock = read(dir)?.unwrap_or_default();
    lock.upsert(entry);
    write(dir, &lock)
}

/// Read-modify-write: drop the entry keyed by `(kind, name)`.
///
/// Returns whether an entry was removed. No file is created when none existed.
pub fn remove(dir: &Path, kind: &str, name: &str) -> Result<bool> {
    let Some(mut lock) = read(dir)? else {
        return Ok(false);
    };
    if !lock.remove(kind, name) {
        return Ok(false);
    }
    write(dir, &lock)?;
    Ok(true)
}
