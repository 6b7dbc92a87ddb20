// hasher.rs — SHA-256 helpers for the ledger chain.
//
// Chain hashes are SHA-256 over the raw JSON line text, hex-encoded
// lowercase. Hashing the raw line (not a re-serialized struct) is what
// makes verification independent of field ordering.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}
