//! Test fixtures and utilities for reducing test setup duplication.
//!
//! This module provides helper functions to create common test environments
//! (temp directories, git repos, skill trees) and in-crate test doubles:
//!
//! - [`FakeGit`]: a [`GitClient`] that "clones" local fixture trees and counts clones
//! - [`RecordingSystem`]: a [`System`] that records installs and can be told to fail
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{create_git_repo, commit_all, FakeGit};
//!
//! let (temp, repo_path) = create_git_repo();
//! std::fs::write(repo_path.join("a.txt"), "a").unwrap();
//! let sha = commit_all(&repo_path, "add a");
//!
//! let git = FakeGit::new().with_repo("https://github.com/acme/skills.git", &repo_path);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use crate::asset::Asset;
use crate::common::fs::copy_dir_recursive;
use crate::error::{DuckrowError, Result};
use crate::git::{CloneError, GitClient};
use crate::system::{InstalledAsset, System, SystemInstallOptions};

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::temp_dir_base()).expect("Failed to create temp directory")
}

/// Create a temp directory with a git repository initialized.
///
/// Returns the `TempDir` (which cleans up on drop) and the path to the repo.
///
/// # Panics
///
/// Panics if the temp directory or git repository cannot be created.
#[must_use]
pub fn create_git_repo() -> (TempDir, PathBuf) {
    let temp = create_temp_dir();
    let path = temp.path().to_path_buf();
    git2::Repository::init(&path).expect("Failed to init git repository");
    (temp, path)
}

/// Stage everything in the work tree and commit it. Returns the commit SHA.
///
/// # Panics
///
/// Panics if any git operation fails.
pub fn commit_all(repo_path: &Path, message: &str) -> String {
    let repo = git2::Repository::open(repo_path).expect("Failed to open repository");
    let mut index = repo.index().expect("Failed to get index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = git2::Signature::now("Test", "test@example.com").expect("Failed to build signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit")
        .to_string()
}

/// Write `<root>/<rel_dir>/SKILL.md` with the given frontmatter fields.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_skill(root: &Path, rel_dir: &str, name: &str, description: &str) -> PathBuf {
    let dir = root.join(rel_dir);
    std::fs::create_dir_all(&dir).expect("Failed to create skill directory");
    std::fs::write(
        dir.join("SKILL.md"),
        format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
    )
    .expect("Failed to write SKILL.md");
    dir
}

/// A [`GitClient`] serving local directories in place of remote repositories
#[derive(Default)]
pub struct FakeGit {
    repos: HashMap<String, PathBuf>,
    commits: HashMap<String, String>,
    failing: HashSet<String>,
    clones: Cell<usize>,
    cloned_urls: RefCell<Vec<String>>,
}

/// Commit reported for paths without an explicit entry
pub const FAKE_HEAD: &str = "0000000000000000000000000000000000000000";

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `tree` for clones of `url`
    pub fn with_repo(mut self, url: &str, tree: &Path) -> Self {
        self.repos.insert(url.to_string(), tree.to_path_buf());
        self
    }

    /// Report `commit` as the latest commit touching `path`
    pub fn with_commit(mut self, path: &str, commit: &str) -> Self {
        self.commits
            .insert(path.trim_matches('/').to_string(), commit.to_string());
        self
    }

    /// Make clones of `url` fail as if the repository did not exist
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn clone_count(&self) -> usize {
        self.clones.get()
    }

    pub fn cloned_urls(&self) -> Vec<String> {
        self.cloned_urls.borrow().clone()
    }

    fn serve(&self, url: &str, dest: &Path) -> std::result::Result<(), CloneError> {
        self.clones.set(self.clones.get() + 1);
        self.cloned_urls.borrow_mut().push(url.to_string());
        let command = format!("git clone {url}");
        if self.failing.contains(url) {
            return Err(CloneError::from_output(
                url,
                &command,
                "fatal: repository not found",
            ));
        }
        let Some(tree) = self.repos.get(url) else {
            return Err(CloneError::from_output(
                url,
                &command,
                "fatal: repository not found",
            ));
        };
        copy_dir_recursive(tree, dest)
            .map_err(|e| CloneError::from_output(url, &command, &e.to_string()))
    }
}

impl GitClient for FakeGit {
    fn clone_shallow_into(
        &self,
        url: &str,
        _git_ref: Option<&str>,
        dest: &Path,
    ) -> std::result::Result<(), CloneError> {
        self.serve(url, dest)
    }

    fn clone_full_into(
        &self,
        url: &str,
        _git_ref: Option<&str>,
        dest: &Path,
    ) -> std::result::Result<(), CloneError> {
        self.serve(url, dest)
    }

    fn clone_pinned_into(
        &self,
        url: &str,
        _commit: &str,
        dest: &Path,
    ) -> std::result::Result<(), CloneError> {
        self.serve(url, dest)
    }

    fn latest_commit(&self, _repo_dir: &Path, path: &str) -> Result<String> {
        Ok(self
            .commits
            .get(path.trim_matches('/'))
            .cloned()
            .unwrap_or_else(|| FAKE_HEAD.to_string()))
    }
}

#[derive(Default)]
struct Recording {
    installed: RefCell<BTreeSet<(String, String)>>,
    installs: Cell<usize>,
    removes: Cell<usize>,
}

/// A [`System`] that records what it was asked to do.
///
/// Clones share their recording, so a test can keep one handle while the
/// catalog owns another.
#[derive(Clone)]
pub struct RecordingSystem {
    name: String,
    universal: bool,
    supported: bool,
    fail: bool,
    fail_after: Option<usize>,
    recording: Rc<Recording>,
}

impl RecordingSystem {
    /// A universal system supporting every kind
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            universal: true,
            supported: true,
            fail: false,
            fail_after: None,
            recording: Rc::default(),
        }
    }

    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Succeeds for the first `installs` calls, then fails
    pub fn failing_after(mut self, installs: usize) -> Self {
        self.fail_after = Some(installs);
        self
    }

    pub fn non_universal(mut self) -> Self {
        self.universal = false;
        self
    }

    /// Boxed clone for building a [`SystemCatalog`](crate::system::SystemCatalog)
    pub fn boxed(&self) -> Box<dyn System> {
        Box::new(self.clone())
    }

    pub fn install_count(&self) -> usize {
        self.recording.installs.get()
    }

    pub fn remove_count(&self) -> usize {
        self.recording.removes.get()
    }

    pub fn has(&self, kind: &str, name: &str) -> bool {
        self.recording
            .installed
            .borrow()
            .contains(&(kind.to_string(), name.to_string()))
    }
}

impl System for RecordingSystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_universal(&self) -> bool {
        self.universal
    }

    fn supports(&self, _kind: &str) -> bool {
        self.supported
    }

    fn is_active(&self, _project_dir: &Path) -> bool {
        true
    }

    fn install(
        &self,
        asset: &Asset,
        _project_dir: &Path,
        _options: &SystemInstallOptions,
    ) -> Result<()> {
        let rec = &self.recording;
        rec.installs.set(rec.installs.get() + 1);
        if self.fail || self.fail_after.is_some_and(|n| rec.installs.get() > n) {
            return Err(DuckrowError::SystemInstallFailed {
                system: self.name.clone(),
                name: asset.name.clone(),
                reason: "simulated failure".to_string(),
            });
        }
        rec.installed
            .borrow_mut()
            .insert((asset.kind.clone(), asset.name.clone()));
        Ok(())
    }

    fn remove(&self, kind: &str, name: &str, _project_dir: &Path) -> Result<bool> {
        let rec = &self.recording;
        rec.removes.set(rec.removes.get() + 1);
        Ok(rec
            .installed
            .borrow_mut()
            .remove(&(kind.to_string(), name.to_string())))
    }

    fn scan(&self, kind: &str, project_dir: &Path) -> Result<Vec<InstalledAsset>> {
        Ok(self
            .recording
            .installed
            .borrow()
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(k, n)| InstalledAsset {
                kind: k.clone(),
                name: n.clone(),
                system: self.name.clone(),
                path: project_dir.join(n),
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_git_repo() {
        let (temp, path) = create_git_repo();
        assert!(path.join(".git").exists());
        assert!(temp.path().exists());
    }

    #[test]
    fn test_commit_all_chains_parents() {
        let (_temp, path) = create_git_repo();
        std::fs::write(path.join("a.txt"), "a").unwrap();
        let first = commit_all(&path, "first");
        std::fs::write(path.join("b.txt"), "b").unwrap();
        let second = commit_all(&path, "second");

        let repo = git2::Repository::open(&path).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.id().to_string(), second);
        assert_eq!(head.parent(0).unwrap().id().to_string(), first);
    }

    #[test]
    fn test_fake_git_serves_tree_and_counts() {
        let temp = create_temp_dir();
        write_skill(temp.path(), "skills/lint", "lint", "d");
        let git = FakeGit::new()
            .with_repo("https://x/a/b.git", temp.path())
            .failing("https://x/bad/repo.git");

        let checkout = git.clone_shallow("https://x/a/b.git", None).unwrap();
        assert!(checkout.path().join("skills/lint/SKILL.md").is_file());
        assert!(git.clone_full("https://x/bad/repo.git", None).is_err());
        assert_eq!(git.clone_count(), 2);
    }

    #[test]
    fn test_recording_system() {
        let system = RecordingSystem::new("rec");
        let asset = Asset {
            kind: "skill".to_string(),
            name: "lint".to_string(),
            description: String::new(),
            source: String::new(),
            prepared_path: None,
            meta: crate::asset::AssetMeta::Skill { internal: false },
        };
        system
            .install(&asset, Path::new("."), &SystemInstallOptions::default())
            .unwrap();
        assert!(system.has("skill", "lint"));
        assert_eq!(system.scan("skill", Path::new(".")).unwrap().len(), 1);
        assert!(system.remove("skill", "lint", Path::new(".")).unwrap());
        assert!(!system.has("skill", "lint"));
    }
}
