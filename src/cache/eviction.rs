//! Eviction Module
//!
//! Bounds the in-memory map. Victims are picked in the map's own iteration
//! order: there is no recency or frequency tracking, the only goal is to keep
//! memory bounded.

use std::collections::HashMap;

use crate::cache::MemoryLimit;

// == Pick Victim ==
/// Returns a key to evict, preferring any key other than `keep`.
///
/// `keep` is only returned when it is the sole entry.
pub fn pick_victim<V>(entries: &HashMap<String, V>, keep: &str) -> Option<String> {
    entries
        .keys()
        .find(|k| k.as_str() != keep)
        .or_else(|| entries.keys().next())
        .cloned()
}

// == Enforce Limit ==
/// Evicts entries until `entries` satisfies `limit`.
///
/// Returns the evicted keys. A single insert into a map that was within its
/// limit evicts exactly one entry.
pub fn enforce_limit<V>(
    entries: &mut HashMap<String, V>,
    limit: MemoryLimit,
    keep: &str,
) -> Vec<String> {
    let mut evicted = Vec::new();
    while limit.is_exceeded_by(entries.len()) {
        match pick_victim(entries, keep) {
            Some(victim) => {
                entries.remove(&victim);
                evicted.push(victim);
            }
            None => break,
        }
    }
    evicted
}
