//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check round trips, eviction bounds and delete semantics
//! over random operation sequences.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use tempfile::TempDir;

use crate::cache::{Cache, DynamicCache, MemoryLimit};

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}".prop_map(|s| s)
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,128}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a value and reading it back returns the same value.
    #[test]
    fn prop_roundtrip_memory(key in valid_key_strategy(), value in valid_value_strategy()) {
        let cache: Cache<String> = Cache::in_memory("prop");

        cache.set(&key, value.clone()).unwrap();

        prop_assert_eq!(cache.get(&key).unwrap(), value);
    }

    // Structured values survive a dynamic cache unchanged.
    #[test]
    fn prop_roundtrip_structured(
        key in valid_key_strategy(),
        list in prop::collection::vec(any::<i64>(), 0..16),
        map in prop::collection::hash_map("[a-z]{1,8}", any::<bool>(), 0..8)
    ) {
        let cache = DynamicCache::in_memory("prop");

        cache.set_as(&key, &(list.clone(), map.clone())).unwrap();

        let (got_list, got_map): (Vec<i64>, HashMap<String, bool>) = cache.get_as(&key).unwrap();
        prop_assert_eq!(got_list, list);
        prop_assert_eq!(got_map, map);
    }

    // The in-memory entry count never exceeds the limit.
    #[test]
    fn prop_memory_limit_enforced(
        entries in prop::collection::vec((valid_key_strategy(), valid_value_strategy()), 1..200)
    ) {
        let limit = 20;
        let cache: Cache<String> = Cache::in_memory("prop");
        cache.set_memory_limit(MemoryLimit::Entries(limit));

        for (key, value) in entries {
            cache.set(&key, value).unwrap();
            prop_assert!(cache.memory_len() <= limit);
            prop_assert!(cache.contains_in_memory(&key), "just-written key must stay in memory");
        }
    }

    // An unbounded in-memory cache behaves like a plain map.
    #[test]
    fn prop_matches_reference_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache: Cache<String> = Cache::in_memory("prop");
        cache.set_memory_limit(MemoryLimit::Unlimited);
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(&key, value.clone()).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    match model.get(&key) {
                        Some(expected) => {
                            prop_assert_eq!(&cache.get(&key).unwrap(), expected);
                        }
                        None => {
                            prop_assert!(cache.get(&key).unwrap_err().is_key_not_found());
                        }
                    }
                }
                CacheOp::Delete { key } => {
                    prop_assert!(cache.delete(&key).is_ok());
                    model.remove(&key);
                }
            }
        }

        let keys: HashSet<String> = cache.keys().unwrap().into_iter().collect();
        let expected: HashSet<String> = model.keys().cloned().collect();
        prop_assert_eq!(keys, expected);
    }
}

// Fewer cases for tests touching the filesystem
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Persisted entries stay resolvable after eviction from memory.
    #[test]
    fn prop_evicted_entries_resolve_from_disk(
        keys in prop::collection::hash_set(valid_key_strategy(), 2..12)
    ) {
        let dir = TempDir::new().unwrap();
        let cache: Cache<String> = Cache::new(dir.path(), "prop");
        let limit = keys.len() - 1;
        cache.set_memory_limit(MemoryLimit::Entries(limit));

        for key in &keys {
            cache.set(key, format!("value_{}", key)).unwrap();
        }

        prop_assert_eq!(cache.memory_len(), limit);
        prop_assert_eq!(cache.len().unwrap(), keys.len());

        for key in &keys {
            prop_assert_eq!(cache.get(key).unwrap(), format!("value_{}", key));
        }
    }

    // Delete removes an entry from every layer.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let dir = TempDir::new().unwrap();
        let cache: Cache<String> = Cache::new(dir.path(), "prop");

        cache.set(&key, value).unwrap();
        prop_assert!(cache.has(&key).unwrap());

        cache.delete(&key).unwrap();

        prop_assert!(!cache.has(&key).unwrap());
        prop_assert!(cache.get(&key).unwrap_err().is_key_not_found());
    }
}
