//! Linking a system's skill directory to the canonical copy

use std::path::{Path, PathBuf};

use crate::common::fs::{copy_dir_recursive, remove_path};
use crate::error::{Result, fs as fs_err};

/// How a skill ended up in a system's directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Symlink,
    Copy,
}

/// Relative path from `<project>/<link_dir>/<name>` to `<project>/<canonical_dir>/<name>`
pub fn relative_target(link_dir: &str, canonical_dir: &str, name: &str) -> PathBuf {
    let depth = Path::new(link_dir).components().count();
    let mut rel = PathBuf::new();
    for _ in 0..depth {
        rel.push("..");
    }
    rel.push(canonical_dir);
    rel.push(name);
    rel
}

/// Point `link` at `canonical`, replacing whatever was there.
///
/// `relative` is the link text used for the symlink. Falls back to a copy
/// when symlinks cannot be created or `copy` is set.
pub fn link_or_copy(canonical: &Path, link: &Path, relative: &Path, copy: bool) -> Result<LinkKind> {
    remove_path(link).map_err(|e| fs_err::write_failed(link, e))?;
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent).map_err(|e| fs_err::write_failed(parent, e))?;
    }

    if !copy {
        match symlink_dir(relative, link) {
            Ok(()) => return Ok(LinkKind::Symlink),
            Err(e) => tracing::debug!(
                "symlink {} failed ({e}), copying instead",
                link.display()
            ),
        }
    }

    copy_dir_recursive(canonical, link).map_err(|e| fs_err::write_failed(link, e))?;
    Ok(LinkKind::Copy)
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_dir(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks not supported",
    ))
}
