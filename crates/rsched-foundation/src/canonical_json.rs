//! Canonical JSON encoding and SHA-256 hashing.
//!
//! Every hash in the workspace — approval-chain record hashes, solution
//! cache problem hashes, `applicable_weeks_hash` — must be computed over the
//! same byte-for-byte representation regardless of which crate produces it.
//! `serde_json::Value` already sorts object keys when it is backed by the
//! `preserve_order` feature disabled (the default, and the one this
//! workspace uses), so `to_canonical_string` only needs to forbid
//! insignificant whitespace; [`sha256_hex`] does the rest.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Render a serializable value as canonical JSON: UTF-8, object keys sorted
/// lexicographically at every level, no insignificant whitespace.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String> {
    let v = serde_json::to_value(value)?;
    Ok(canonical_value_to_string(&v))
}

fn canonical_value_to_string(value: &Value) -> String {
    // `serde_json::Value`'s `Map` is a `BTreeMap` by default (no
    // `preserve_order` feature enabled anywhere in this workspace), so
    // `to_string` already serializes object keys in sorted order. Compact
    // `to_string` also produces no insignificant whitespace.
    value.to_string()
}

/// SHA-256 hex digest of a canonical JSON string.
pub fn sha256_hex(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

/// Convenience: canonicalize and hash in one step.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String> {
    let canonical = to_canonical_string(value)?;
    Ok(sha256_hex(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_at_every_level() {
        let a = json!({"b": 1, "a": {"z": 1, "y": 2}});
        let b = json!({"a": {"y": 2, "z": 1}, "b": 1});
        assert_eq!(
            canonical_value_to_string(&a),
            canonical_value_to_string(&b)
        );
    }

    #[test]
    fn no_insignificant_whitespace() {
        let s = to_canonical_string(&json!({"a": 1})).unwrap();
        assert_eq!(s, "{\"a\":1}");
    }

    #[test]
    fn hash_is_deterministic() {
        let v = json!({"x": [1, 2, 3], "y": "z"});
        let h1 = canonical_hash(&v).unwrap();
        let h2 = canonical_hash(&v).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_changes_with_content() {
        let h1 = canonical_hash(&json!({"x": 1})).unwrap();
        let h2 = canonical_hash(&json!({"x": 2})).unwrap();
        assert_ne!(h1, h2);
    }
}
