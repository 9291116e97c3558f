//! Patching MCP server entries into a system's JSON config file
//!
//! The file is parsed into a document tree, the object at a dotted key path
//! (e.g. `mcpServers`) is located or created, one server key is set or
//! removed, and the document is written back atomically. Unrelated keys are
//! kept; comments in JSONC files are not.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};

use crate::asset::McpServerConfig;
use crate::common::fs::write_atomic;
use crate::error::{DuckrowError, Result, fs as fs_err};

fn load(path: &Path) -> Result<Map<String, Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(fs_err::read_failed(path, e)),
    };
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let parse_failed = |reason: String| DuckrowError::ConfigParseFailed {
        path: path.display().to_string(),
        reason,
    };
    match serde_json::from_str(&content).map_err(|e| parse_failed(e.to_string()))? {
        Value::Object(map) => Ok(map),
        _ => Err(parse_failed("expected a JSON object".to_string())),
    }
}

fn save(path: &Path, document: &Map<String, Value>) -> Result<()> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Walk `key_path`, creating empty objects as needed
fn object_at<'a>(document: &'a mut Map<String, Value>, key_path: &str) -> Option<&'a mut Map<String, Value>> {
    let mut current = document;
    for segment in key_path.split('.') {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = slot.as_object_mut()?;
    }
    Some(current)
}

fn find_object<'a>(document: &'a Map<String, Value>, key_path: &str) -> Option<&'a Map<String, Value>> {
    let mut current = document;
    for segment in key_path.split('.') {
        current = current.get(segment)?.as_object()?;
    }
    Some(current)
}

/// Set server `name` under `key_path` in the JSON file at `path`
pub fn upsert_server(path: &Path, key_path: &str, name: &str, config: &McpServerConfig) -> Result<()> {
    let mut document = load(path)?;
    let servers = object_at(&mut document, key_path).ok_or_else(|| DuckrowError::ConfigParseFailed {
        path: path.display().to_string(),
        reason: format!("'{key_path}' is not an object"),
    })?;
    servers.insert(name.to_string(), serde_json::to_value(config)?);
    save(path, &document)
}

/// Remove server `name`; returns whether it was present
pub fn remove_server(path: &Path, key_path: &str, name: &str) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let mut document = load(path)?;
    if find_object(&document, key_path).is_none_or(|servers| !servers.contains_key(name)) {
        return Ok(false);
    }
    if let Some(servers) = object_at(&mut document, key_path) {
        servers.remove(name);
    }
    save(path, &document)?;
    Ok(true)
}

/// Server names under `key_path`, sorted
pub fn list_servers(path: &Path, key_path: &str) -> Result<Vec<String>> {
    let document = load(path)?;
    let mut names: Vec<String> = find_object(&document, key_path)
        .map(|servers| servers.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::create_temp_dir;

    fn config() -> McpServerConfig {
        McpServerConfig {
            command: Some("npx".to_string()),
            args: vec!["-y".to_string(), "search".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_creates_file_and_keeps_other_keys() {
        let temp = create_temp_dir();
        let path = temp.path().join(".cursor/mcp.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"other": 1, "mcpServers": {"existing": {"url": "x"}}}"#).unwrap();

        upsert_server(&path, "mcpServers", "search", &config()).unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["other"], 1);
        assert_eq!(value["mcpServers"]["existing"]["url"], "x");
        assert_eq!(value["mcpServers"]["search"]["command"], "npx");
        assert!(value["mcpServers"]["search"].get("env").is_none());
    }

    #[test]
    fn test_nested_key_path() {
        let temp = create_temp_dir();
        let path = temp.path().join("settings.json");
        upsert_server(&path, "mcp.servers", "search", &config()).unwrap();
        assert_eq!(list_servers(&path, "mcp.servers").unwrap(), vec!["search"]);
        assert!(list_servers(&path, "mcpServers").unwrap().is_empty());
    }

    #[test]
    fn test_remove_server() {
        let temp = create_temp_dir();
        let path = temp.path().join(".mcp.json");
        assert!(!remove_server(&path, "mcpServers", "search").unwrap());

        upsert_server(&path, "mcpServers", "search", &config()).unwrap();
        assert!(remove_server(&path, "mcpServers", "search").unwrap());
        assert!(!remove_server(&path, "mcpServers", "search").unwrap());
        assert!(list_servers(&path, "mcpServers").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let temp = create_temp_dir();
        let path = temp.path().join(".mcp.json");
        std::fs::write(&path, "// comment\n{").unwrap();
        assert!(matches!(
            upsert_server(&path, "mcpServers", "search", &config()),
            Err(DuckrowError::ConfigParseFailed { .. })
        ));
    }
}
