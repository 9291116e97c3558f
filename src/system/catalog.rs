//! The catalog of known systems

use std::path::Path;

use super::{AgentSystem, System};

/// Built-in agent definitions
pub fn default_systems() -> Vec<AgentSystem> {
    vec![
        AgentSystem::new("codex", "Codex")
            .universal()
            .with_detection(".codex")
            .with_detection("AGENTS.md"),
        AgentSystem::new("opencode", "OpenCode")
            .universal()
            .with_detection(".opencode")
            .with_detection("opencode.json"),
        AgentSystem::new("cursor", "Cursor")
            .universal()
            .with_detection(".cursor")
            .with_mcp(".cursor/mcp.json", "mcpServers"),
        AgentSystem::new("github-copilot", "GitHub Copilot")
            .universal()
            .with_detection(".github/copilot-instructions.md")
            .with_detection(".vscode")
            .with_mcp(".vscode/mcp.json", "servers"),
        AgentSystem::new("claude-code", "Claude Code")
            .with_detection(".claude")
            .with_detection("CLAUDE.md")
            .with_skills_dir(".claude/skills")
            .with_mcp(".mcp.json", "mcpServers"),
        AgentSystem::new("windsurf", "Windsurf")
            .with_detection(".windsurf")
            .with_skills_dir(".windsurf/skills"),
        AgentSystem::new("gemini-cli", "Gemini CLI")
            .with_detection(".gemini")
            .with_detection("GEMINI.md")
            .with_skills_dir(".gemini/skills")
            .with_mcp(".gemini/settings.json", "mcpServers"),
    ]
}

/// All systems duckrow can install into
pub struct SystemCatalog {
    systems: Vec<Box<dyn System>>,
}

impl Default for SystemCatalog {
    fn default() -> Self {
        Self::new(
            default_systems()
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn System>)
                .collect(),
        )
    }
}

impl SystemCatalog {
    pub fn new(systems: Vec<Box<dyn System>>) -> Self {
        Self { systems }
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn System> {
        self.systems.iter().map(|s| &**s)
    }

    pub fn get(&self, name: &str) -> Option<&dyn System> {
        self.all().find(|s| s.name() == name)
    }

    /// Systems reading the canonical location; the default install targets
    pub fn universal(&self) -> Vec<&dyn System> {
        self.all().filter(|s| s.is_universal()).collect()
    }

    /// Systems showing signs of use in `project_dir`
    pub fn detect_active(&self, project_dir: &Path) -> Vec<&dyn System> {
        self.all().filter(|s| s.is_active(project_dir)).collect()
    }
}
