//! YAML frontmatter of asset manifest files (`SKILL.md`)

use serde::Deserialize;
use serde_yaml::Value;

/// Fields duckrow reads from a skill's frontmatter
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SkillFrontmatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl SkillFrontmatter {
    /// `metadata.internal: true` marks a skill hidden from default discovery
    pub fn is_internal(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("internal"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Split content into YAML frontmatter (between the first two `---` lines)
/// and body. Returns `None` if the delimiters are missing or the block is not
/// a mapping.
pub fn split_frontmatter(content: &str) -> Option<(Value, String)> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 2 || lines[0].trim() != "---" {
        return None;
    }
    let end_idx = lines[1..].iter().position(|l| l.trim() == "---")? + 1;
    let frontmatter_str = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..].join("\n");
    let value: Value = serde_yaml::from_str(&frontmatter_str).ok()?;
    if value.as_mapping().is_none() && !value.is_null() {
        return None;
    }
    Some((value, body))
}

/// Parse a skill's frontmatter; content without frontmatter yields defaults
pub fn parse_skill(content: &str) -> std::result::Result<SkillFrontmatter, serde_yaml::Error> {
    match split_frontmatter(content) {
        Some((Value::Null, _)) | None => Ok(SkillFrontmatter::default()),
        Some((value, _)) => serde_yaml::from_value(value),
    }
}
