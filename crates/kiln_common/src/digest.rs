//! Deterministic digests of structured cache keys.
//!
//! A cache key is any `Serialize` value. It is first canonicalized into a JSON
//! tree whose object keys are sorted, then hashed together with
//! [`DIGEST_VERSION`]. Two keys that serialize to the same tree always produce
//! the same digest, regardless of map insertion order.
//!
//! JSON objects are string-keyed, so a map keyed by `1u32` digests the same
//! as one keyed by `"1"`. Non-finite floats have no JSON form and are
//! rejected rather than collapsed into `null`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::finite::ensure_finite;
use crate::hash::ContentHash;

/// Version of the key canonicalization scheme. Mixed into every key digest so
/// that a change to the encoding can never alias digests from an older scheme.
pub const DIGEST_VERSION: u32 = 1;

/// Computes the digest of a structured cache key.
///
/// Fails when `key` has no faithful JSON representation: a map whose keys
/// are sequences, or a NaN or infinite float.
pub fn digest_key<K: Serialize + ?Sized>(key: &K) -> Result<ContentHash, serde_json::Error> {
    ensure_finite(key)?;
    let tree = canonicalize(serde_json::to_value(key)?);
    let mut bytes = format!("v{DIGEST_VERSION}\0").into_bytes();
    serde_json::to_writer(&mut bytes, &tree)?;
    Ok(ContentHash::from_bytes(&bytes))
}

/// Rebuilds `value` with every object's entries in sorted key order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k, canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
