//! Flat lock file layout (`skills` / `mcps` arrays) and its migration

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{LOCK_VERSION, LockFile, LockedAsset};
use crate::asset::{KIND_MCP, KIND_SKILL};

#[derive(Debug, Deserialize)]
pub(super) struct LegacyLockFile {
    #[serde(default)]
    skills: Vec<LegacySkill>,
    #[serde(default)]
    mcps: Vec<LegacyMcp>,
}

#[derive(Debug, Deserialize)]
struct LegacySkill {
    name: String,
    source: String,
    #[serde(default)]
    commit: String,
    #[serde(rename = "ref", default)]
    git_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMcp {
    name: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    commit: String,
    #[serde(rename = "ref", default)]
    git_ref: Option<String>,
    #[serde(default)]
    config_hash: Option<String>,
    #[serde(default)]
    required_env: Vec<String>,
}

/// A document is legacy when it has the flat arrays and no `assets` list
pub(super) fn is_legacy(object: &Map<String, Value>) -> bool {
    !object.contains_key("assets") && (object.contains_key("skills") || object.contains_key("mcps"))
}

impl LegacyLockFile {
    pub(super) fn migrate(self) -> LockFile {
        let skills = self.skills.into_iter().map(|s| LockedAsset {
            kind: KIND_SKILL.to_string(),
            name: s.name,
            source: s.source,
            commit: s.commit,
            git_ref: s.git_ref,
            data: BTreeMap::new(),
        });

        let mcps = self.mcps.into_iter().map(|m| {
            let mut data = BTreeMap::new();
            if let Some(hash) = m.config_hash {
                data.insert("configHash".to_string(), Value::String(hash));
            }
            if !m.required_env.is_empty() {
                data.insert(
                    "requiredEnv".to_string(),
                    Value::Array(m.required_env.into_iter().map(Value::String).collect()),
                );
            }
            LockedAsset {
                kind: KIND_MCP.to_string(),
                name: m.name,
                source: m.source,
                commit: m.commit,
                git_ref: m.git_ref,
                data,
            }
        });

        let mut lock = LockFile {
            lock_version: LOCK_VERSION,
            assets: skills.chain(mcps).collect(),
        };
        lock.sort();
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"{
  "lockVersion": 1,
  "skills": [
    { "name": "lint", "source": "github.com/acme/skills/lint", "commit": "aaa", "ref": "main" }
  ],
  "mcps": [
    {
      "name": "search",
      "source": "github.com/acme/mcp",
      "commit": "bbb",
      "configHash": "blake3:123",
      "requiredEnv": ["API_KEY"]
    }
  ]
}"#;

    #[test]
    fn test_migrates_flat_layout() {
        let lock = LockFile::from_json(LEGACY).unwrap();
        assert_eq!(lock.lock_version, LOCK_VERSION);
        assert_eq!(lock.assets.len(), 2);

        let skill = lock.find(KIND_SKILL, "lint").unwrap();
        assert_eq!(skill.source, "github.com/acme/skills/lint");
        assert_eq!(skill.commit, "aaa");
        assert_eq!(skill.git_ref.as_deref(), Some("main"));

        let mcp = lock.find(KIND_MCP, "search").unwrap();
        assert_eq!(mcp.commit, "bbb");
        assert_eq!(mcp.data["configHash"], "blake3:123");
        assert_eq!(mcp.data["requiredEnv"], serde_json::json!(["API_KEY"]));
    }

    #[test]
    fn test_current_layout_is_not_legacy() {
        let value: Value = serde_json::from_str(r#"{"lockVersion":2,"assets":[]}"#).unwrap();
        assert!(!is_legacy(value.as_object().unwrap()));

        let value: Value = serde_json::from_str(r#"{"skills":[]}"#).unwrap();
        assert!(is_legacy(value.as_object().unwrap()));
    }
}
