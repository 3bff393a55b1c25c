//! Cache Builder
//!
//! Configures codec, file store and initial policy before building a [`Cache`].

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::{Cache, CachePolicy, MemoryLimit};
use crate::codec::{Codec, JsonCodec};
use crate::storage::{FileStore, LocalFileStore};

// == Cache Builder ==
/// Builder for [`Cache`].
///
/// Without a directory the built cache is in-memory only.
pub struct CacheBuilder<V, C = JsonCodec> {
    namespace: String,
    directory: Option<PathBuf>,
    policy: CachePolicy,
    codec: C,
    files: Arc<dyn FileStore>,
    _value: PhantomData<fn() -> V>,
}

impl<V> CacheBuilder<V, JsonCodec> {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            directory: None,
            policy: CachePolicy::default(),
            codec: JsonCodec,
            files: Arc::new(LocalFileStore),
            _value: PhantomData,
        }
    }
}

impl<V, C> CacheBuilder<V, C> {
    /// Mirrors entries to files in `directory`.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn memory_limit(mut self, limit: MemoryLimit) -> Self {
        self.policy.memory_limit = limit;
        self
    }

    pub fn thread_safe(mut self, thread_safe: bool) -> Self {
        self.policy.thread_safe = thread_safe;
        self
    }

    pub fn persist_on_write(mut self, persist_on_write: bool) -> Self {
        self.policy.persist_on_write = persist_on_write;
        self
    }

    pub fn single_file(mut self, single_file: bool) -> Self {
        self.policy.single_file = single_file;
        self
    }

    /// Replaces the filesystem used for cache files.
    pub fn file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = files;
        self
    }

    /// Replaces the codec used to encode values.
    pub fn codec<C2: Codec>(self, codec: C2) -> CacheBuilder<V, C2> {
        CacheBuilder {
            namespace: self.namespace,
            directory: self.directory,
            policy: self.policy,
            codec,
            files: self.files,
            _value: PhantomData,
        }
    }
}

impl<V, C> CacheBuilder<V, C>
where
    V: Serialize + DeserializeOwned + Clone,
    C: Codec,
{
    pub fn build(self) -> Cache<V, C> {
        Cache::from_parts(
            self.namespace,
            self.directory,
            self.policy,
            self.codec,
            self.files,
        )
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BincodeCodec;

    #[test]
    fn test_builder_defaults_to_in_memory() {
        let cache: Cache<i64> = CacheBuilder::new("ns").build();

        assert!(cache.is_in_memory());
        assert_eq!(cache.namespace(), "ns");
        assert_eq!(cache.policy(), CachePolicy::default());
    }

    #[test]
    fn test_builder_applies_policy() {
        let cache: Cache<i64, BincodeCodec> = CacheBuilder::new("ns")
            .directory("/tmp/pstore-builder")
            .memory_limit(MemoryLimit::Entries(5))
            .thread_safe(true)
            .persist_on_write(false)
            .single_file(true)
            .codec(BincodeCodec)
            .build();

        let policy = cache.policy();
        assert_eq!(policy.memory_limit, MemoryLimit::Entries(5));
        assert!(policy.thread_safe);
        assert!(!policy.persist_on_write);
        assert!(policy.single_file);
        assert_eq!(
            cache.directory(),
            Some(std::path::Path::new("/tmp/pstore-builder"))
        );
    }
}
