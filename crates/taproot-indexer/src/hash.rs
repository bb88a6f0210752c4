//! Deterministic content hashing for extracted symbols
//!
//! Hashes are a pure function of the normalized content: whitespace runs
//! collapse to a single space so formatting-only edits keep the hash (and
//! with it every derived cache entry) stable. Structural context is
//! deliberately not mixed in; whether it should be is a normalization
//! policy of the producer, not of the hash.

use taproot_core::ContentHash;

/// Collapses whitespace runs and trims, the canonical form fed to the
/// hasher.
pub fn normalize(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_gap = false;
    for ch in content.trim().chars() {
        if ch.is_whitespace() {
            in_gap = true;
        } else {
            if in_gap && !out.is_empty() {
                out.push(' ');
            }
            in_gap = false;
            out.push(ch);
        }
    }
    out
}

/// Blake3 digest of the normalized content.
pub fn content_hash(content: &str) -> ContentHash {
    ContentHash(*blake3::hash(normalize(content).as_bytes()).as_bytes())
}
