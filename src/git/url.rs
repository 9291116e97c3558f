//! URL rewriting used for remediation hints
//!
//! This module handles:
//! - Turning SCP-style SSH URLs into their HTTPS equivalent
//! - Turning HTTPS URLs into their SCP-style SSH equivalent
//!
//! These are suggestions only; clone URLs are never rewritten.

/// Convert `git@host:owner/repo.git` into `https://host/owner/repo.git`.
///
/// SSH host aliases (`github.com-work`) are mapped back to the real host.
pub fn ssh_to_https(url: &str) -> Option<String> {
    let rest = url.strip_prefix("git@")?;
    let (host, path) = rest.split_once(':')?;
    let host = strip_host_alias(host);
    let path = path.trim_start_matches('/');
    if host.is_empty() || path.is_empty() {
        return None;
    }
    let path = if path.ends_with(".git") {
        path.to_string()
    } else {
        format!("{path}.git")
    };
    Some(format!("https://{host}/{path}"))
}

/// Convert `https://host/owner/repo[.git]` into `git@host:owner/repo.git`.
pub fn https_to_ssh(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let (host, path) = rest.split_once('/')?;
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if host.is_empty() || segments.len() < 2 {
        return None;
    }
    let owner = segments[0];
    let repo = segments[1].trim_end_matches(".git");
    Some(format!("git@{host}:{owner}/{repo}.git"))
}

/// `github.com-work` -> `github.com`. Hosts without a dot before the dash are kept.
fn strip_host_alias(host: &str) -> &str {
    match host.split_once('-') {
        Some((base, _)) if base.contains('.') => base,
        _ => host,
    }
}
