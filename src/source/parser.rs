//! Per-form source string parsers

use std::path::PathBuf;

use super::{DEFAULT_HOST, ParsedSource, SourceDescriptor, SourcePolicy};
use crate::error::{DuckrowError, Result};

const LOCAL_PREFIXES: &[&str] = &["./", "../", "/", "~/"];

fn parse_failed(input: &str, reason: &str) -> DuckrowError {
    DuckrowError::SourceParseFailed {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn parse(input: &str, policy: SourcePolicy) -> Result<ParsedSource> {
    let input = input.trim();
    if input.is_empty() {
        return Err(parse_failed(input, "empty source"));
    }

    if LOCAL_PREFIXES.iter().any(|p| input.starts_with(p)) {
        if !policy.allow_local {
            return Err(DuckrowError::LocalSourceNotAllowed {
                path: input.to_string(),
            });
        }
        return Ok(ParsedSource::Local(expand_home(input)));
    }

    let descriptor = if let Some(rest) = input.strip_prefix("git@") {
        parse_scp(input, rest)?
    } else if input.starts_with("https://")
        || input.starts_with("http://")
        || input.starts_with("ssh://")
    {
        parse_url(input)?
    } else if let Some(descriptor) = parse_name_filter(input) {
        descriptor
    } else {
        parse_path_form(input)?
    };
    Ok(ParsedSource::Git(descriptor))
}

fn expand_home(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(input)
}

/// Characters allowed in owner and repository names
fn is_name_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn is_owner_repo(s: &str) -> bool {
    matches!(s.split_once('/'), Some((owner, repo)) if is_name_token(owner) && is_name_token(repo))
}

fn strip_git_suffix(repo: &str) -> &str {
    repo.strip_suffix(".git").unwrap_or(repo)
}

/// `git@host:owner/repo.git`; the clone URL is the input, untouched.
fn parse_scp(input: &str, rest: &str) -> Result<SourceDescriptor> {
    let (host, path) = rest
        .split_once(':')
        .ok_or_else(|| parse_failed(input, "SSH source is missing ':'"))?;
    let (owner, repo) = path
        .trim_start_matches('/')
        .split_once('/')
        .ok_or_else(|| parse_failed(input, "SSH source is missing owner/repo"))?;
    let repo = strip_git_suffix(repo.trim_end_matches('/'));
    if host.is_empty() || owner.is_empty() || repo.is_empty() {
        return Err(parse_failed(input, "SSH source is missing host, owner, or repo"));
    }

    let mut descriptor = SourceDescriptor::new(host, owner, repo, "");
    descriptor.clone_url = input.to_string();
    Ok(descriptor)
}

/// `https://host/owner/repo[.git]` or `.../owner/repo/tree/<ref>/<path>`
fn parse_url(input: &str) -> Result<SourceDescriptor> {
    let (scheme, rest) = input
        .split_once("://")
        .ok_or_else(|| parse_failed(input, "malformed URL"))?;
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = if scheme == "ssh" {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if host.is_empty() || segments.len() < 2 {
        return Err(parse_failed(input, "URL must contain owner and repository"));
    }

    let owner = segments[0];
    let repo = strip_git_suffix(segments[1]);
    let mut descriptor = SourceDescriptor::new(host, owner, repo, "");

    if segments.len() >= 4 && matches!(segments[2], "tree" | "blob") {
        descriptor.git_ref = Some(segments[3].to_string());
        descriptor.sub_path = segments[4..].join("/");
    } else if segments.len() > 2 {
        return Err(parse_failed(
            input,
            "expected https://host/owner/repo or https://host/owner/repo/tree/<ref>/<path>",
        ));
    }

    let literal_git_url = scheme == "ssh" || input.trim_end_matches('/').ends_with(".git");
    if literal_git_url {
        descriptor.clone_url = input.to_string();
    }
    Ok(descriptor)
}

/// `owner/repo@name`, only when the prefix is a strict owner/repo token
fn parse_name_filter(input: &str) -> Option<SourceDescriptor> {
    let (repo_part, name) = input.split_once('@')?;
    if !is_owner_repo(repo_part) || name.is_empty() {
        return None;
    }
    let (owner, repo) = repo_part.split_once('/')?;
    let mut descriptor = SourceDescriptor::new(DEFAULT_HOST, owner, strip_git_suffix(repo), "");
    descriptor.name_filter = Some(name.to_string());
    Some(descriptor)
}

/// `host/owner/repo/path...`, `owner/repo/path...`, or `owner/repo`
fn parse_path_form(input: &str) -> Result<SourceDescriptor> {
    let segments: Vec<&str> = input.trim_end_matches('/').split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(parse_failed(input, "empty path segment"));
    }

    let (host, rest) = if segments[0].contains('.') {
        if segments.len() < 3 {
            return Err(parse_failed(input, "expected host/owner/repo[/path]"));
        }
        (segments[0], &segments[1..])
    } else if segments.len() >= 2 {
        (DEFAULT_HOST, &segments[..])
    } else {
        return Err(parse_failed(input, "unrecognized source format"));
    };

    let owner = rest[0];
    let repo = strip_git_suffix(rest[1]);
    if !is_name_token(owner) || !is_name_token(repo) {
        return Err(parse_failed(input, "invalid owner or repository name"));
    }
    Ok(SourceDescriptor::new(host, owner, repo, &rest[2..].join("/")))
}

#[cfg(test)]
mod tests {
    use super::super::{SourceDescriptor, SourcePolicy, parse_source};
    use super::*;

    fn git(input: &str) -> SourceDescriptor {
        match parse_source(input, SourcePolicy::default()).unwrap() {
            ParsedSource::Git(d) => d,
            ParsedSource::Local(p) => panic!("expected git source, got {}", p.display()),
        }
    }

    #[test]
    fn test_owner_repo() {
        let d = git("acme/widgets");
        assert_eq!(d.host, "github.com");
        assert_eq!(d.owner, "acme");
        assert_eq!(d.repo, "widgets");
        assert_eq!(d.clone_url, "https://github.com/acme/widgets.git");
        assert_eq!(d.sub_path, "");
        assert_eq!(d.git_ref, None);
    }

    #[test]
    fn test_owner_repo_path() {
        let d = git("acme/widgets/tools/lint");
        assert_eq!(d.host, "github.com");
        assert_eq!(d.sub_path, "tools/lint");
        assert_eq!(d.canonical(), "github.com/acme/widgets/tools/lint");
    }

    #[test]
    fn test_canonical_cross_host() {
        let d = git("gitlab.example.com/team/assets/skills/review");
        assert_eq!(d.host, "gitlab.example.com");
        assert_eq!(d.owner, "team");
        assert_eq!(d.repo, "assets");
        assert_eq!(d.sub_path, "skills/review");
        assert_eq!(d.clone_url, "https://gitlab.example.com/team/assets.git");
    }

    #[test]
    fn test_canonical_host_alias() {
        let d = git("github.com-work/org/repo/skill-a");
        assert_eq!(d.host, "github.com-work");
        assert_eq!(d.repo_key(), "org/repo");
        assert_eq!(d.sub_path, "skill-a");
    }

    #[test]
    fn test_ssh_alias_preserved() {
        let d = git("git@github.com-work:acme/widgets.git");
        assert_eq!(d.clone_url, "git@github.com-work:acme/widgets.git");
        assert_eq!(d.host, "github.com-work");
        assert_eq!(d.owner, "acme");
        assert_eq!(d.repo, "widgets");
    }

    #[test]
    fn test_https_tree_url() {
        let d = git("https://github.com/acme/widgets/tree/main/skills/lint");
        assert_eq!(d.git_ref.as_deref(), Some("main"));
        assert_eq!(d.sub_path, "skills/lint");
        assert_eq!(d.clone_url, "https://github.com/acme/widgets.git");
    }

    #[test]
    fn test_https_git_url_verbatim() {
        let d = git("https://git.example.com/acme/widgets.git");
        assert_eq!(d.clone_url, "https://git.example.com/acme/widgets.git");
        assert_eq!(d.repo, "widgets");
    }

    #[test]
    fn test_https_plain_url_synthesized() {
        let d = git("https://github.com/acme/widgets/");
        assert_eq!(d.clone_url, "https://github.com/acme/widgets.git");
    }

    #[test]
    fn test_name_filter() {
        let d = git("acme/widgets@lint-fix");
        assert_eq!(d.owner, "acme");
        assert_eq!(d.repo, "widgets");
        assert_eq!(d.name_filter.as_deref(), Some("lint-fix"));
        assert_eq!(d.sub_path, "");
    }

    #[test]
    fn test_email_like_is_not_name_filter() {
        let result = parse_source("someone@example.com", SourcePolicy::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_local_paths() {
        for input in ["./skills", "../shared", "/abs/skills"] {
            let parsed = parse_source(input, SourcePolicy::default()).unwrap();
            assert_eq!(parsed, ParsedSource::Local(PathBuf::from(input)));
        }
    }

    #[test]
    fn test_local_path_rejected_by_policy() {
        let result = parse_source("./skills", SourcePolicy::git_only());
        assert!(matches!(
            result,
            Err(DuckrowError::LocalSourceNotAllowed { .. })
        ));
    }

    #[test]
    fn test_unrecognized() {
        for input in ["", "widgets", "acme//widgets", "example.com/acme", "https://github.com/acme"] {
            let result = parse_source(input, SourcePolicy::default());
            assert!(
                matches!(result, Err(DuckrowError::SourceParseFailed { .. })),
                "expected parse error for {input:?}"
            );
        }
    }
}
