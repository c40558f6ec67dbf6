// hasher.rs — SHA-256 helpers for the audit chain.
//
// Hashes are 64-character lowercase hex strings, the same encoding the
// policy manifest digest uses, so the two can be compared by eye.

use sha2::{Digest, Sha256};

/// Lowercase-hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Lowercase-hex SHA-256 of a UTF-8 string (one serialized log line).
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}
