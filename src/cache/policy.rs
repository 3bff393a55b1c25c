//! Cache Policy Module
//!
//! Memory bound and persistence flags. Policies are plain values; the cache
//! keeps the current one behind a lock so it can be changed between calls.

use serde::{Deserialize, Serialize};

// == Memory Limit ==
/// Upper bound on the number of entries held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryLimit {
    Unlimited,
    Entries(usize),
}

impl MemoryLimit {
    /// Builds a limit from a signed count. Negative counts mean unlimited.
    pub fn from_count(count: i64) -> Self {
        if count < 0 {
            MemoryLimit::Unlimited
        } else {
            MemoryLimit::Entries(count as usize)
        }
    }

    /// Returns true if `len` entries exceed this limit.
    pub fn is_exceeded_by(&self, len: usize) -> bool {
        match self {
            MemoryLimit::Unlimited => false,
            MemoryLimit::Entries(max) => len > *max,
        }
    }
}

impl Default for MemoryLimit {
    fn default() -> Self {
        MemoryLimit::Entries(DEFAULT_MEMORY_ENTRIES)
    }
}

/// Default number of entries kept in memory
pub const DEFAULT_MEMORY_ENTRIES: usize = 100;

// == Cache Policy ==
/// Mutable behaviour of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Maximum number of entries kept in memory
    pub memory_limit: MemoryLimit,
    /// Serialize every operation under one per-cache lock
    pub thread_safe: bool,
    /// Write each entry to disk as soon as it is set
    pub persist_on_write: bool,
    /// Store all entries in one aggregate file instead of one file per key
    pub single_file: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            memory_limit: MemoryLimit::default(),
            thread_safe: false,
            persist_on_write: true,
            single_file: false,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default() {
        let policy = CachePolicy::default();
        assert_eq!(policy.memory_limit, MemoryLimit::Entries(100));
        assert!(!policy.thread_safe);
        assert!(policy.persist_on_write);
        assert!(!policy.single_file);
    }

    #[test]
    fn test_memory_limit_from_count() {
        assert_eq!(MemoryLimit::from_count(-1), MemoryLimit::Unlimited);
        assert_eq!(MemoryLimit::from_count(0), MemoryLimit::Entries(0));
        assert_eq!(MemoryLimit::from_count(25), MemoryLimit::Entries(25));
    }

    #[test]
    fn test_memory_limit_exceeded() {
        assert!(!MemoryLimit::Unlimited.is_exceeded_by(usize::MAX));
        assert!(!MemoryLimit::Entries(3).is_exceeded_by(3));
        assert!(MemoryLimit::Entries(3).is_exceeded_by(4));
        assert!(MemoryLimit::Entries(0).is_exceeded_by(1));
    }
}
