//! User configuration (`~/.duckrow/config.json`)
//!
//! Holds the tracked project folders, the configured registries, and global
//! settings such as clone URL overrides. The directory can be moved with
//! `DUCKROW_HOME`.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::fs::write_atomic;
use crate::error::{DuckrowError, Result, fs as fs_err};
use crate::source::SourcePolicy;

/// Environment variable overriding the duckrow home directory
pub const HOME_ENV: &str = "DUCKROW_HOME";

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A configured registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub name: String,
    /// Clone URL or source of the registry repository
    pub repo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Clone URLs keyed by `owner/repo`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub clone_url_overrides: HashMap<String, String>,

    #[serde(default = "default_true")]
    pub allow_local_sources: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clone_url_overrides: HashMap::new(),
            allow_local_sources: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Project folders duckrow has installed into
    #[serde(default)]
    pub folders: Vec<String>,

    #[serde(default)]
    pub registries: Vec<RegistryConfig>,

    #[serde(default)]
    pub settings: Settings,
}

/// `$DUCKROW_HOME`, else `~/.duckrow`
pub fn duckrow_home() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".duckrow")
}

pub fn config_path() -> PathBuf {
    duckrow_home().join(CONFIG_FILE_NAME)
}

impl Config {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(fs_err::read_failed(path, e)),
        };
        serde_json::from_str(&content).map_err(|e| DuckrowError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        write_atomic(path, json.as_bytes())
    }

    /// Track `folder`. Returns false if it was already tracked.
    pub fn add_folder(&mut self, folder: &Path) -> bool {
        let folder = dunce::canonicalize(folder)
            .unwrap_or_else(|_| folder.to_path_buf())
            .display()
            .to_string();
        if self.folders.contains(&folder) {
            return false;
        }
        self.folders.push(folder);
        self.folders.sort();
        true
    }

    pub fn registry(&self, name: &str) -> Option<&RegistryConfig> {
        self.registries.iter().find(|r| r.name == name)
    }

    /// Clone URL overrides with lowercase `owner/repo` keys
    pub fn clone_url_overrides(&self) -> HashMap<String, String> {
        self.settings
            .clone_url_overrides
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect()
    }

    pub fn source_policy(&self) -> SourcePolicy {
        SourcePolicy {
            allow_local: self.settings.allow_local_sources,
        }
    }
}
