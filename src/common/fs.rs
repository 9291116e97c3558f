//! Common file system operations with unified error handling

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, fs as fs_err};

/// Directory names never copied into an installed asset
const COPY_EXCLUDES: &[&str] = &[".git"];

/// Copy a directory recursively, skipping `.git`
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let entry_path = entry.path();
        let file_name = entry.file_name();

        if COPY_EXCLUDES
            .iter()
            .any(|excluded| file_name.to_str() == Some(excluded))
        {
            continue;
        }

        let dst_path = dst.join(&file_name);

        if entry_path.is_dir() {
            copy_dir_recursive(&entry_path, &dst_path)?;
        } else {
            fs::copy(&entry_path, &dst_path)?;
        }
    }

    Ok(())
}

/// Write `contents` to `path` via a sibling temp file and rename.
///
/// Readers observe either the old file or the new one, never a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| fs_err::write_failed(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| fs_err::write_failed(path, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| fs_err::write_failed(path, e))?;
    tmp.persist(path)
        .map_err(|e| fs_err::write_failed(path, e.error))?;
    Ok(())
}

/// Remove a file, symlink, or directory tree at `path`.
///
/// Returns `false` when nothing was there. Symlinks are removed without
/// following them.
pub fn remove_path(path: &Path) -> std::io::Result<bool> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(false);
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        // Directory symlinks on Windows need remove_dir
        if fs::remove_file(path).is_err() {
            fs::remove_dir(path)?;
        }
    }
    Ok(true)
}

/// Remove empty directories from `start` upwards, stopping at `stop` (exclusive)
pub fn prune_empty_parents(start: &Path, stop: &Path) {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == stop || !dir.starts_with(stop) {
            break;
        }
        let is_empty = fs::read_dir(dir)
            .map(|mut d| d.next().is_none())
            .unwrap_or(false);
        if !is_empty || fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::create_temp_dir;

    #[test]
    fn test_copy_dir_recursive_skips_git() {
        let temp = create_temp_dir();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::create_dir_all(src.join(".git")).unwrap();
        fs::write(src.join("SKILL.md"), "skill").unwrap();
        fs::write(src.join("nested/notes.md"), "notes").unwrap();
        fs::write(src.join(".git/HEAD"), "ref").unwrap();

        let dst = temp.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("SKILL.md")).unwrap(), "skill");
        assert!(dst.join("nested/notes.md").exists());
        assert!(!dst.join(".git").exists());
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let temp = create_temp_dir();
        let path = temp.path().join("sub/file.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("sub"))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_remove_path() {
        let temp = create_temp_dir();
        let dir = temp.path().join("d");
        fs::create_dir_all(dir.join("x")).unwrap();
        let file = temp.path().join("f");
        fs::write(&file, "f").unwrap();

        assert!(remove_path(&dir).unwrap());
        assert!(remove_path(&file).unwrap());
        assert!(!remove_path(&file).unwrap());
        assert!(!dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_path_does_not_follow_symlink() {
        let temp = create_temp_dir();
        let target = temp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.md"), "keep").unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(remove_path(&link).unwrap());
        assert!(target.join("keep.md").exists());
    }

    #[test]
    fn test_prune_empty_parents() {
        let temp = create_temp_dir();
        let deep = temp.path().join(".agents/skills/lint");
        fs::create_dir_all(&deep).unwrap();
        fs::write(temp.path().join(".agents/keep.txt"), "k").unwrap();

        prune_empty_parents(&deep, temp.path());

        assert!(!temp.path().join(".agents/skills").exists());
        assert!(temp.path().join(".agents").exists());
    }
}
