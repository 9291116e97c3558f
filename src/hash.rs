//! BLAKE3 hashing utilities for config change detection and on-disk keys

use blake3::Hasher;

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Length of the hex prefix used for directory keys
const DIR_KEY_LEN: usize = 16;

/// Calculate the prefixed BLAKE3 hash of `bytes`
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex())
}

/// Short, filesystem-safe key derived from `value`.
///
/// Used for registry clone directories so that two registries never share a
/// directory even when their display names collide.
pub fn dir_key(value: &str) -> String {
    let hex = blake3::hash(value.as_bytes()).to_hex();
    hex.as_str()[..DIR_KEY_LEN].to_string()
}
