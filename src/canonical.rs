//! Canonical serialization for deterministic fingerprints.
//!
//! Snapshots and configs are hashed through their JSON form. Callers must
//! only pass values whose serialization order is fixed: sorted `Vec`s,
//! `BTreeMap`/`BTreeSet`, structs (fields serialize in declaration order).
//! Never pass a `HashMap` or `HashSet`.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes.
///
/// Every type hashed by this crate is plain data with derived `Serialize`,
/// for which JSON encoding cannot fail.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute the xxh64 hash of a value's canonical bytes.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Compute the canonical hash and format it as 16 hex digits.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
