use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// Stable digest of a config map payload.
///
/// Entries are hashed in key order with length prefixes, so the result does
/// not depend on map iteration order and distinct payloads cannot collide by
/// concatenation.
pub fn fingerprint(data: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&str, &str> = data
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let mut hasher = Sha256::new();
    for (key, value) in sorted {
        hasher.update((key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
        hasher.update((value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}
