//! Update checking
//!
//! Compares each locked asset's commit against the newest commit available
//! for its source. Registry-known commits are used when present (no network);
//! everything else is resolved by cloning, once per `(repository, ref)` group.
//! A repository that cannot be reached reports "no update" for its assets
//! rather than failing the whole check.

use std::collections::{BTreeMap, HashMap};

use crate::git::GitClient;
use crate::lockfile::LockFile;
use crate::source::SourceDescriptor;

/// Update status of one locked asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub kind: String,
    pub name: String,
    pub source: String,
    pub installed_commit: String,
    pub available_commit: String,
    pub has_update: bool,
}

/// A source whose latest commit should be resolved
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub source: String,
    pub git_ref: Option<String>,
}

/// Check every locked asset of `kind` for a newer commit.
///
/// Results follow lock file order.
pub fn check_for_updates(
    lock: &LockFile,
    kind: &str,
    clone_url_overrides: &HashMap<String, String>,
    registry_commits: &HashMap<String, String>,
    git: &dyn GitClient,
) -> Vec<UpdateInfo> {
    let locked: Vec<_> = lock.of_kind(kind).collect();
    let index = CommitIndex::new(registry_commits);

    let mut known = HashMap::new();
    let mut pending = Vec::new();
    for entry in &locked {
        match index.lookup(&entry.source) {
            Some(commit) => {
                known.insert(entry.source.clone(), commit.to_string());
            }
            None => pending.push(CommitRequest {
                source: entry.source.clone(),
                git_ref: entry.git_ref.clone(),
            }),
        }
    }
    tracing::debug!(
        "{} of {} {kind} sources resolved from registries",
        known.len(),
        locked.len()
    );
    known.extend(resolve_latest_commits(&pending, clone_url_overrides, git));

    locked
        .into_iter()
        .map(|entry| {
            let available = known
                .get(&entry.source)
                .cloned()
                .unwrap_or_else(|| entry.commit.clone());
            UpdateInfo {
                kind: entry.kind.clone(),
                name: entry.name.clone(),
                source: entry.source.clone(),
                installed_commit: entry.commit.clone(),
                has_update: available != entry.commit,
                available_commit: available,
            }
        })
        .collect()
}

/// Resolve the latest commit of each requested source.
///
/// Requests sharing a repository and ref share one full clone. Sources that
/// cannot be parsed, cloned, or resolved are left out of the result.
pub fn resolve_latest_commits(
    requests: &[CommitRequest],
    clone_url_overrides: &HashMap<String, String>,
    git: &dyn GitClient,
) -> HashMap<String, String> {
    let mut groups: BTreeMap<(String, Option<String>), Vec<(String, SourceDescriptor)>> =
        BTreeMap::new();
    for request in requests {
        match SourceDescriptor::parse(&request.source) {
            Ok(descriptor) => groups
                .entry((descriptor.repo_key(), request.git_ref.clone()))
                .or_default()
                .push((request.source.clone(), descriptor)),
            Err(e) => tracing::debug!("not checking {}: {e}", request.source),
        }
    }

    let mut resolved = HashMap::new();
    for ((repo_key, git_ref), members) in groups {
        let Some((_, first)) = members.first() else {
            continue;
        };
        let mut descriptor = SourceDescriptor::new(&first.host, &first.owner, &first.repo, "");
        descriptor.apply_clone_url_override(clone_url_overrides);

        let checkout = match git.clone_full(&descriptor.clone_url, git_ref.as_deref()) {
            Ok(checkout) => checkout,
            Err(e) => {
                tracing::warn!("could not check {repo_key} for updates: {e}");
                continue;
            }
        };
        for (source, member) in &members {
            match git.latest_commit(checkout.path(), &member.sub_path) {
                Ok(commit) => {
                    resolved.insert(source.clone(), commit);
                }
                Err(e) => tracing::warn!("could not resolve latest commit for {source}: {e}"),
            }
        }
    }
    resolved
}

/// Registry commits, looked up exactly or ignoring the host segment
struct CommitIndex<'a> {
    exact: &'a HashMap<String, String>,
    by_path: HashMap<&'a str, &'a str>,
}

impl<'a> CommitIndex<'a> {
    /// When sources differ only by host, the lexicographically first wins
    fn new(exact: &'a HashMap<String, String>) -> Self {
        let mut sorted: Vec<_> = exact.iter().collect();
        sorted.sort();
        let mut by_path = HashMap::new();
        for (source, commit) in sorted {
            if let Some(path) = strip_host(source) {
                by_path.entry(path).or_insert(commit.as_str());
            }
        }
        Self { exact, by_path }
    }

    fn lookup(&self, source: &str) -> Option<&'a str> {
        if let Some(commit) = self.exact.get(source) {
            return Some(commit.as_str());
        }
        strip_host(source).and_then(|path| self.by_path.get(path).copied())
    }
}

/// `host/owner/repo/...` without its host segment
fn strip_host(source: &str) -> Option<&str> {
    source.split_once('/').map(|(_, rest)| rest).filter(|rest| !rest.is_empty())
}
