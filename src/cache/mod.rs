//! Cache Module
//!
//! Provides the cache engine: bounded in-memory storage mirrored to disk.

mod builder;
mod eviction;
mod naming;
mod policy;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use builder::CacheBuilder;
pub use naming::{file_name, parse_key, AGGREGATE_KEY, CACHE_EXTENSION};
pub use policy::{CachePolicy, MemoryLimit, DEFAULT_MEMORY_ENTRIES};
pub use stats::CacheStats;
pub use store::{Cache, DynamicCache};
