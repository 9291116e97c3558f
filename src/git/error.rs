//! Git clone error classification
//!
//! This module handles:
//! - Categorizing failed git invocations by matching their combined output
//! - Producing remediation hints for each category
//!
//! Classification is plain substring matching. Output that matches nothing is
//! `Unknown`; it never fails.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use super::url::{https_to_ssh, ssh_to_https};

/// Closed set of clone failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneErrorKind {
    AuthRequired,
    RepoNotFound,
    NetworkUnreachable,
    SshKeyRejected,
    SshHostKeyMismatch,
    Timeout,
    Unknown,
}

impl CloneErrorKind {
    fn code(self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::RepoNotFound => "repo_not_found",
            Self::NetworkUnreachable => "network_unreachable",
            Self::SshKeyRejected => "ssh_key_rejected",
            Self::SshHostKeyMismatch => "ssh_host_key_mismatch",
            Self::Timeout => "timeout",
            Self::Unknown => "clone_failed",
        }
    }
}

impl fmt::Display for CloneErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AuthRequired => "authentication required",
            Self::RepoNotFound => "repository not found",
            Self::NetworkUnreachable => "network unreachable",
            Self::SshKeyRejected => "SSH key rejected",
            Self::SshHostKeyMismatch => "SSH host key verification failed",
            Self::Timeout => "timed out",
            Self::Unknown => "git command failed",
        };
        f.write_str(text)
    }
}

type OutputCheck = fn(&str) -> bool;

// Order matters: more specific patterns first.
const CLASSIFICATIONS: &[(OutputCheck, CloneErrorKind)] = &[
    (
        |out| {
            out.contains("host key verification failed")
                || out.contains("remote host identification has changed")
        },
        CloneErrorKind::SshHostKeyMismatch,
    ),
    (
        |out| {
            out.contains("permission denied (publickey")
                || out.contains("no supported authentication methods")
                || out.contains("sign_and_send_pubkey")
        },
        CloneErrorKind::SshKeyRejected,
    ),
    (
        |out| {
            out.contains("could not read username")
                || out.contains("could not read password")
                || out.contains("terminal prompts disabled")
                || out.contains("authentication failed")
                || out.contains("invalid username or password")
                || out.contains("the requested url returned error: 401")
                || out.contains("the requested url returned error: 403")
        },
        CloneErrorKind::AuthRequired,
    ),
    (
        |out| {
            out.contains("repository not found")
                || out.contains("does not appear to be a git repository")
                || out.contains("the requested url returned error: 404")
                || (out.contains("project") && out.contains("not found"))
        },
        CloneErrorKind::RepoNotFound,
    ),
    (
        |out| {
            out.contains("could not resolve host")
                || out.contains("could not resolve hostname")
                || out.contains("connection refused")
                || out.contains("connection timed out")
                || out.contains("network is unreachable")
                || out.contains("failed to connect")
                || out.contains("operation timed out")
        },
        CloneErrorKind::NetworkUnreachable,
    ),
];

/// Classify the combined stdout/stderr of a failed git command
pub fn classify_output(output: &str) -> CloneErrorKind {
    let lowered = output.to_lowercase();
    CLASSIFICATIONS
        .iter()
        .find(|(check, _)| check(&lowered))
        .map_or(CloneErrorKind::Unknown, |(_, kind)| *kind)
}

/// A failed clone/fetch, with the command that was run and its output
#[derive(Error, Debug, Clone)]
#[error("Failed to clone {url}: {kind}")]
pub struct CloneError {
    pub kind: CloneErrorKind,
    pub url: String,
    pub command: String,
    pub output: String,
}

impl CloneError {
    /// Build an error from the output of a failed command
    pub fn from_output(url: &str, command: &str, output: &str) -> Self {
        Self {
            kind: classify_output(output),
            url: url.to_string(),
            command: command.to_string(),
            output: output.trim().to_string(),
        }
    }

    pub fn timeout(url: &str, command: &str, seconds: u64) -> Self {
        Self {
            kind: CloneErrorKind::Timeout,
            url: url.to_string(),
            command: command.to_string(),
            output: format!("killed after {seconds}s"),
        }
    }

    /// Remediation hints for this failure
    pub fn hints(&self) -> Vec<String> {
        let mut hints = Vec::new();
        match self.kind {
            CloneErrorKind::AuthRequired => {
                hints.push(
                    "The repository may be private; configure a git credential helper or use SSH"
                        .to_string(),
                );
                if let Some(ssh) = https_to_ssh(&self.url) {
                    hints.push(format!("Try the SSH URL instead: {ssh}"));
                }
            }
            CloneErrorKind::RepoNotFound => {
                hints.push("Check the owner and repository name".to_string());
                hints.push(
                    "Private repositories report 'not found' when credentials are missing"
                        .to_string(),
                );
                if let Some(ssh) = https_to_ssh(&self.url) {
                    hints.push(format!("If it is private, try the SSH URL: {ssh}"));
                }
            }
            CloneErrorKind::SshKeyRejected => {
                hints.push(
                    "Check that your SSH key is loaded (ssh-add -l) and registered with the host"
                        .to_string(),
                );
                if let Some(https) = ssh_to_https(&self.url) {
                    hints.push(format!("Or use the HTTPS URL instead: {https}"));
                }
            }
            CloneErrorKind::SshHostKeyMismatch => {
                hints.push(
                    "Verify the host's key fingerprint and update ~/.ssh/known_hosts".to_string(),
                );
            }
            CloneErrorKind::NetworkUnreachable => {
                hints.push("Check your network connection and proxy settings".to_string());
            }
            CloneErrorKind::Timeout => {
                hints.push("The git command took too long; retry or check connectivity".to_string());
            }
            CloneErrorKind::Unknown => {}
        }
        hints
    }
}

impl Diagnostic for CloneError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("duckrow::git::{}", self.kind.code())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let mut lines = vec![format!("command: {}", self.command)];
        if !self.output.is_empty() {
            lines.push(format!("output: {}", self.output));
        }
        lines.extend(self.hints());
        Some(Box::new(lines.join("\n")))
    }
}
