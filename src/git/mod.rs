//! Git operations for fetching asset sources
//!
//! This module handles:
//! - Shallow, full, and pinned-commit clones into process-unique temp dirs
//! - Resolving the most recent commit that touched a path
//! - Classifying clone failures (see [`error`])
//!
//! Network operations shell out to the `git` binary so that the user's SSH
//! config, host aliases, and credential helpers apply unchanged. History
//! inspection of an existing clone uses `git2`.

pub mod command;
pub mod error;
pub mod url;

use std::path::{Path, PathBuf};
use std::time::Duration;

use git2::{Commit, Oid, Repository};
use tempfile::TempDir;

use crate::error::{DuckrowError, Result};
use command::Outcome;
pub use error::CloneError;

/// Timeout for clone-class operations
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for lightweight operations (init, remote add, checkout)
pub const LIGHT_TIMEOUT: Duration = Duration::from_secs(15);

/// A cloned repository in a temp directory. Dropping it removes the directory.
#[derive(Debug)]
pub struct Checkout {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Checkout {
    /// Create an empty, process-unique clone directory
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("duckrow-clone-")
            .tempdir_in(crate::temp::temp_dir_base())
            .map_err(|e| DuckrowError::IoError {
                message: format!("Failed to create temp directory: {e}"),
            })?;
        let path = dir.path().to_path_buf();
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                tracing::warn!("failed to remove clone dir {}: {e}", self.path.display());
            }
        }
    }
}

/// The git operations duckrow needs
pub trait GitClient {
    /// `git clone --depth 1 [--branch <ref>] <url> <dest>`
    fn clone_shallow_into(
        &self,
        url: &str,
        git_ref: Option<&str>,
        dest: &Path,
    ) -> std::result::Result<(), CloneError>;

    /// Full-history clone, needed for per-path commit resolution
    fn clone_full_into(
        &self,
        url: &str,
        git_ref: Option<&str>,
        dest: &Path,
    ) -> std::result::Result<(), CloneError>;

    /// Fetch exactly `commit` (depth 1) and check it out
    fn clone_pinned_into(
        &self,
        url: &str,
        commit: &str,
        dest: &Path,
    ) -> std::result::Result<(), CloneError>;

    /// Most recent commit touching `path` in the repository at `repo_dir`
    fn latest_commit(&self, repo_dir: &Path, path: &str) -> Result<String>;

    fn clone_shallow(&self, url: &str, git_ref: Option<&str>) -> Result<Checkout> {
        let checkout = Checkout::create()?;
        self.clone_shallow_into(url, git_ref, checkout.path())?;
        Ok(checkout)
    }

    fn clone_full(&self, url: &str, git_ref: Option<&str>) -> Result<Checkout> {
        let checkout = Checkout::create()?;
        self.clone_full_into(url, git_ref, checkout.path())?;
        Ok(checkout)
    }

    fn clone_pinned(&self, url: &str, commit: &str) -> Result<Checkout> {
        let checkout = Checkout::create()?;
        self.clone_pinned_into(url, commit, checkout.path())?;
        Ok(checkout)
    }
}

/// [`GitClient`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct CommandGit {
    clone_timeout: Duration,
    light_timeout: Duration,
}

impl Default for CommandGit {
    fn default() -> Self {
        Self {
            clone_timeout: CLONE_TIMEOUT,
            light_timeout: LIGHT_TIMEOUT,
        }
    }
}

impl CommandGit {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(
        &self,
        url: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> std::result::Result<(), CloneError> {
        let shown = command::display_command(args);
        tracing::debug!("running {shown}");
        match command::run(args, cwd, timeout) {
            Ok(Outcome::Completed { success: true, .. }) => Ok(()),
            Ok(Outcome::Completed { output, .. }) => {
                Err(CloneError::from_output(url, &shown, &output))
            }
            Ok(Outcome::TimedOut) => Err(CloneError::timeout(url, &shown, timeout.as_secs())),
            Err(e) => Err(CloneError::from_output(
                url,
                &shown,
                &format!("failed to run git: {e}"),
            )),
        }
    }

    fn clone_with_depth(
        &self,
        url: &str,
        git_ref: Option<&str>,
        dest: &Path,
        shallow: bool,
    ) -> std::result::Result<(), CloneError> {
        let dest = dest.to_string_lossy();
        let mut args = vec!["clone"];
        if shallow {
            args.extend(["--depth", "1"]);
        }
        if let Some(r) = git_ref {
            args.extend(["--branch", r]);
        }
        args.extend([url, dest.as_ref()]);
        self.run(url, &args, None, self.clone_timeout)
    }
}

impl GitClient for CommandGit {
    fn clone_shallow_into(
        &self,
        url: &str,
        git_ref: Option<&str>,
        dest: &Path,
    ) -> std::result::Result<(), CloneError> {
        self.clone_with_depth(url, git_ref, dest, true)
    }

    fn clone_full_into(
        &self,
        url: &str,
        git_ref: Option<&str>,
        dest: &Path,
    ) -> std::result::Result<(), CloneError> {
        self.clone_with_depth(url, git_ref, dest, false)
    }

    fn clone_pinned_into(
        &self,
        url: &str,
        commit: &str,
        dest: &Path,
    ) -> std::result::Result<(), CloneError> {
        self.run(url, &["init", "--quiet"], Some(dest), self.light_timeout)?;
        self.run(
            url,
            &["remote", "add", "origin", url],
            Some(dest),
            self.light_timeout,
        )?;
        self.run(
            url,
            &["fetch", "--depth", "1", "origin", commit],
            Some(dest),
            self.clone_timeout,
        )?;
        self.run(
            url,
            &["checkout", "--quiet", "FETCH_HEAD"],
            Some(dest),
            self.light_timeout,
        )
    }

    /// Deepens a shallow clone first; a depth-1 HEAD would otherwise look
    /// like the last change to every path.
    fn latest_commit(&self, repo_dir: &Path, path: &str) -> Result<String> {
        self.unshallow(repo_dir)?;
        latest_commit_for_path(repo_dir, path)
    }
}

impl CommandGit {
    fn unshallow(&self, repo_dir: &Path) -> Result<()> {
        let repo = Repository::open(repo_dir)?;
        if !repo.is_shallow() {
            return Ok(());
        }
        let url = repo
            .find_remote("origin")
            .ok()
            .and_then(|remote| remote.url().map(str::to_string))
            .unwrap_or_default();
        tracing::debug!("fetching full history of {url}");
        self.run(
            &url,
            &["fetch", "--quiet", "--unshallow", "origin"],
            Some(repo_dir),
            self.clone_timeout,
        )?;
        Ok(())
    }
}

/// Resolve the most recent commit reachable from HEAD that changed `path`.
///
/// An empty path resolves to HEAD. The root commit (or the boundary of a
/// shallow clone) counts as touching every path that exists in it.
pub fn latest_commit_for_path(repo_dir: &Path, path: &str) -> Result<String> {
    let resolve_failed = |reason: String| DuckrowError::CommitResolveFailed {
        path: path.to_string(),
        reason,
    };

    let repo = Repository::open(repo_dir).map_err(|e| resolve_failed(e.message().to_string()))?;
    let head = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .map_err(|e| resolve_failed(e.message().to_string()))?;

    let rel = path.trim_matches('/');
    if rel.is_empty() || rel == "." {
        return Ok(head.id().to_string());
    }
    let rel = Path::new(rel);

    let mut walk = repo.revwalk()?;
    walk.push(head.id())?;
    walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

    for oid in walk {
        let commit = repo.find_commit(oid?)?;
        let Some(entry) = tree_entry_id(&commit, rel) else {
            continue;
        };
        let unchanged_in_parent = (0..commit.parent_count()).any(|i| {
            commit
                .parent(i)
                .ok()
                .and_then(|parent| tree_entry_id(&parent, rel))
                == Some(entry)
        });
        if !unchanged_in_parent {
            return Ok(commit.id().to_string());
        }
    }

    Err(resolve_failed("path not found in history".to_string()))
}

fn tree_entry_id(commit: &Commit<'_>, path: &Path) -> Option<Oid> {
    commit.tree().ok()?.get_path(path).ok().map(|e| e.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{commit_all, create_git_repo};

    #[test]
    fn test_latest_commit_tracks_path_not_head() {
        let (_temp, repo_path) = create_git_repo();
        std::fs::create_dir_all(repo_path.join("skills/a")).unwrap();
        std::fs::write(repo_path.join("skills/a/SKILL.md"), "a1").unwrap();
        let first = commit_all(&repo_path, "add a");

        std::fs::create_dir_all(repo_path.join("skills/b")).unwrap();
        std::fs::write(repo_path.join("skills/b/SKILL.md"), "b1").unwrap();
        let second = commit_all(&repo_path, "add b");

        assert_eq!(latest_commit_for_path(&repo_path, "skills/a").unwrap(), first);
        assert_eq!(latest_commit_for_path(&repo_path, "skills/b").unwrap(), second);
        assert_eq!(latest_commit_for_path(&repo_path, "").unwrap(), second);
    }

    #[test]
    fn test_latest_commit_sees_modification() {
        let (_temp, repo_path) = create_git_repo();
        std::fs::create_dir_all(repo_path.join("tools/lint")).unwrap();
        std::fs::write(repo_path.join("tools/lint/SKILL.md"), "v1").unwrap();
        commit_all(&repo_path, "v1");
        std::fs::write(repo_path.join("README.md"), "readme").unwrap();
        commit_all(&repo_path, "unrelated");
        std::fs::write(repo_path.join("tools/lint/SKILL.md"), "v2").unwrap();
        let third = commit_all(&repo_path, "v2");
        std::fs::write(repo_path.join("README.md"), "readme 2").unwrap();
        commit_all(&repo_path, "unrelated again");

        assert_eq!(
            latest_commit_for_path(&repo_path, "/tools/lint/").unwrap(),
            third
        );
    }

    #[test]
    fn test_shallow_clone_resolves_path_commit_not_head() {
        let (_temp, repo_path) = create_git_repo();
        std::fs::create_dir_all(repo_path.join("skills/lint")).unwrap();
        std::fs::write(repo_path.join("skills/lint/SKILL.md"), "v1").unwrap();
        let skill_commit = commit_all(&repo_path, "add lint");
        std::fs::write(repo_path.join("README.md"), "readme").unwrap();
        let head = commit_all(&repo_path, "docs");

        let git = CommandGit::new();
        let url = format!("file://{}", repo_path.display());
        let checkout = git.clone_shallow(&url, None).unwrap();
        assert!(Repository::open(checkout.path()).unwrap().is_shallow());

        let resolved = git.latest_commit(checkout.path(), "skills/lint").unwrap();
        assert_eq!(resolved, skill_commit);
        assert_ne!(resolved, head);
        assert_eq!(git.latest_commit(checkout.path(), "").unwrap(), head);
    }

    #[test]
    fn test_latest_commit_missing_path() {
        let (_temp, repo_path) = create_git_repo();
        std::fs::write(repo_path.join("a.txt"), "a").unwrap();
        commit_all(&repo_path, "a");
        let result = latest_commit_for_path(&repo_path, "nope");
        assert!(matches!(
            result,
            Err(DuckrowError::CommitResolveFailed { .. })
        ));
    }

    #[test]
    fn test_checkout_removed_on_drop() {
        let checkout = Checkout::create().unwrap();
        let path = checkout.path().to_path_buf();
        assert!(path.exists());
        drop(checkout);
        assert!(!path.exists());
    }

    #[test]
    fn test_checkouts_are_unique() {
        let a = Checkout::create().unwrap();
        let b = Checkout::create().unwrap();
        assert_ne!(a.path(), b.path());
    }
}
