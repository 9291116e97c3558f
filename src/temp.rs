//! Base directory for clone and staging temp dirs.
//!
//! A relative `TMPDIR` (e.g. `TMPDIR=tmp`) would otherwise put clones under
//! the project being installed into.

use std::env;
use std::path::PathBuf;

/// Absolute directory to create temp dirs in.
pub fn temp_dir_base() -> PathBuf {
    let dir = env::temp_dir();
    if dir.is_absolute() {
        return dir;
    }
    #[cfg(windows)]
    {
        env::var("TEMP")
            .or_else(|_| env::var("TMP"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/tmp")
    }
}
