//! Deterministic key/value fixtures. The mapping from an index to its key and
//! value is invertible, so scenarios can verify round trips without carrying
//! the index separately.

/// Zero-padded 9-digit decimal key for `index`.
pub fn entry_key(index: u64) -> String {
    format!("{index:09}")
}

/// Zero-padded 10-digit decimal value bytes for `index`.
pub fn entry_value(index: u64) -> Vec<u8> {
    format!("{index:010}").into_bytes()
}

/// Inverse of [`entry_key`]. `None` if `key` was not produced by it.
pub fn index_of_key(key: &str) -> Option<u64> {
    if key.len() != 9 {
        return None;
    }
    key.parse().ok()
}

/// Inverse of [`entry_value`]. `None` if `value` was not produced by it.
pub fn index_of_value(value: &[u8]) -> Option<u64> {
    if value.len() != 10 {
        return None;
    }
    core::str::from_utf8(value).ok()?.parse().ok()
}
