//! Cache Statistics Module
//!
//! Tracks memory hits, disk promotions, misses, evictions and disk writes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from memory
    pub hits: u64,
    /// Lookups answered from disk and promoted into memory
    pub disk_hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries dropped from memory to honour the memory limit
    pub evictions: u64,
    /// Entries written to disk
    pub writes: u64,
    /// Current number of entries in memory
    pub memory_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Fraction of lookups that found a value, in memory or on disk.
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let found = self.hits + self.disk_hits;
        let total = found + self.misses;
        if total == 0 {
            0.0
        } else {
            found as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the memory hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Disk Hit ==
    /// Increments the counter of lookups served from disk.
    pub fn record_disk_hit(&mut self) {
        self.disk_hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Write ==
    /// Increments the disk write counter.
    pub fn record_write(&mut self) {
        self.writes += 1;
    }
}
