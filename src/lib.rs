//! PStore - An embeddable key-value cache
//!
//! Keeps values in memory and optionally mirrors them to one file per key on
//! disk, so a host process can reuse computed values across restarts.
//!
//! ```no_run
//! use pstore::Cache;
//!
//! let cache: Cache<String> = Cache::new("/tmp/pstore", "greetings");
//! cache.set("hello", "world".to_string())?;
//!
//! // A later instance over the same directory finds the value on disk.
//! let reopened: Cache<String> = Cache::new("/tmp/pstore", "greetings");
//! assert_eq!(reopened.get("hello")?, "world");
//! # Ok::<(), pstore::PStoreError>(())
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod storage;

pub use cache::{Cache, CacheBuilder, CachePolicy, CacheStats, DynamicCache, MemoryLimit};
pub use codec::{BincodeCodec, Codec, CodecError, JsonCodec};
pub use config::Config;
pub use error::{ErrorKind, PStoreError, Result};
pub use storage::{FileStore, LocalFileStore};
