//! File system error constructors

use std::path::Path;

use super::DuckrowError;

/// Creates a read failure error for `path`
pub fn read_failed(path: &Path, err: impl std::fmt::Display) -> DuckrowError {
    DuckrowError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a write failure error for `path`
pub fn write_failed(path: &Path, err: impl std::fmt::Display) -> DuckrowError {
    DuckrowError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
