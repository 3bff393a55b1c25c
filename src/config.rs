//! Configuration Module
//!
//! Loads cache configuration from environment variables for the `pstore`
//! binary and other process wiring.

use std::env;
use std::path::PathBuf;

use crate::cache::{CachePolicy, MemoryLimit, DEFAULT_MEMORY_ENTRIES};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding cache files
    pub directory: PathBuf,
    /// Namespace used as the cache file prefix
    pub namespace: String,
    /// Maximum entries kept in memory
    pub memory_limit: MemoryLimit,
    /// Serialize every operation under one lock
    pub thread_safe: bool,
    /// Write entries to disk as soon as they are set
    pub persist_on_write: bool,
    /// Keep all entries in one aggregate file
    pub single_file: bool,
    /// Never touch the filesystem
    pub in_memory: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PSTORE_DIR` - Storage directory (default: `.pstore`)
    /// - `PSTORE_NAMESPACE` - Cache namespace (default: `default`)
    /// - `PSTORE_MEMORY_LIMIT` - Entries kept in memory, negative for unlimited (default: 100)
    /// - `PSTORE_THREAD_SAFE` - `true`/`false` (default: false)
    /// - `PSTORE_PERSIST_ON_WRITE` - `true`/`false` (default: true)
    /// - `PSTORE_SINGLE_FILE` - `true`/`false` (default: false)
    /// - `PSTORE_IN_MEMORY` - `true`/`false` (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            directory: env::var("PSTORE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.directory),
            namespace: env::var("PSTORE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.namespace),
            memory_limit: env::var("PSTORE_MEMORY_LIMIT")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .map(MemoryLimit::from_count)
                .unwrap_or(defaults.memory_limit),
            thread_safe: env_flag("PSTORE_THREAD_SAFE").unwrap_or(defaults.thread_safe),
            persist_on_write: env_flag("PSTORE_PERSIST_ON_WRITE")
                .unwrap_or(defaults.persist_on_write),
            single_file: env_flag("PSTORE_SINGLE_FILE").unwrap_or(defaults.single_file),
            in_memory: env_flag("PSTORE_IN_MEMORY").unwrap_or(defaults.in_memory),
        }
    }

    /// Policy part of the configuration.
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            memory_limit: self.memory_limit,
            thread_safe: self.thread_safe,
            persist_on_write: self.persist_on_write,
            single_file: self.single_file,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".pstore"),
            namespace: "default".to_string(),
            memory_limit: MemoryLimit::Entries(DEFAULT_MEMORY_ENTRIES),
            thread_safe: false,
            persist_on_write: true,
            single_file: false,
            in_memory: false,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
