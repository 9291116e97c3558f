//! Common test utilities for duckrow integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A project directory, a separate source tree, and an isolated duckrow home
pub struct TestWorkspace {
    pub temp: TempDir,
    /// Project the CLI installs into
    pub path: PathBuf,
    /// Local directory used as an install source
    pub sources: PathBuf,
    /// `DUCKROW_HOME` for the CLI under test
    pub home: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = dunce::canonicalize(temp.path()).expect("Failed to canonicalize temp dir");
        let path = root.join("project");
        let sources = root.join("sources");
        let home = root.join("home");
        for dir in [&path, &sources, &home] {
            std::fs::create_dir_all(dir).expect("Failed to create directory");
        }
        Self {
            temp,
            path,
            sources,
            home,
        }
    }

    /// The duckrow binary, pointed at this workspace
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("duckrow").expect("Failed to find duckrow binary");
        cmd.env("DUCKROW_HOME", &self.home)
            .env_remove("DUCKROW_PROJECT")
            .env_remove("DUCKROW_LOG")
            .env("GIT_TERMINAL_PROMPT", "0")
            .arg("-C")
            .arg(&self.path);
        cmd
    }

    /// Write `sources/<rel_dir>/SKILL.md`
    pub fn write_skill(&self, rel_dir: &str, name: &str, description: &str) -> PathBuf {
        let dir = self.sources.join(rel_dir);
        std::fs::create_dir_all(&dir).expect("Failed to create skill directory");
        std::fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
        )
        .expect("Failed to write SKILL.md");
        dir
    }

    /// Write a file relative to the sources directory
    pub fn write_source_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.sources.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn file_exists(&self, rel: &str) -> bool {
        self.path.join(rel).exists()
    }

    pub fn read_file(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path.join(rel)).expect("Failed to read file")
    }

    pub fn lock_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.read_file("duckrow.lock.json")).expect("Invalid lock file")
    }
}

pub fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
