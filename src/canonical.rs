//! Canonical serialization for deterministic hashing.
//!
//! Used to fingerprint graph versions so two versions can be compared
//! without walking them side by side.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use BTreeMap/BTreeSet for collections in hashed data

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::error::GraphError;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, GraphError> {
    serde_json::to_vec(value).map_err(GraphError::from_serde)
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64, GraphError> {
    let bytes = to_canonical_bytes(value)?;
    Ok(xxh64(&bytes, 0))
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, GraphError> {
    Ok(format!("{:016x}", canonical_hash(value)?))
}
