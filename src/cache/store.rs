//! Cache Store Module
//!
//! Main cache engine: an in-memory map bounded by a memory limit, mirrored to
//! one file per key (or one aggregate file) through a codec and a file store.

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::eviction::enforce_limit;
use crate::cache::naming::{self, AGGREGATE_KEY};
use crate::cache::{CacheBuilder, CachePolicy, CacheStats, MemoryLimit};
use crate::codec::{check_finite, Codec, CodecError, JsonCodec};
use crate::error::{PStoreError, Result};
use crate::storage::{FileStore, LocalFileStore};

// == Cache ==
/// Key-value cache with optional per-key disk mirroring.
///
/// A cache holds one value type. The default, `serde_json::Value`, lets a
/// single cache store heterogeneous shapes; see [`Cache::set_as`] and
/// [`Cache::get_as`].
///
/// With `thread_safe` enabled every public operation runs under one
/// per-instance lock, disk IO included. Without it the map stays consistent
/// but disk IO from concurrent calls may interleave.
pub struct Cache<V = serde_json::Value, C = JsonCodec> {
    /// Filename prefix, fixed at construction
    namespace: String,
    /// Storage directory, None for in-memory caches
    directory: Option<PathBuf>,
    /// Current policy, read at the start of each operation
    policy: RwLock<CachePolicy>,
    /// In-memory entries
    entries: Mutex<HashMap<String, V>>,
    /// Activity counters
    stats: Mutex<CacheStats>,
    /// Held for a whole operation when the policy is thread safe
    op_lock: Mutex<()>,
    codec: C,
    files: Arc<dyn FileStore>,
}

/// Cache holding heterogeneous JSON-shaped values.
///
/// Always JSON encoded; `BincodeCodec` cannot decode `serde_json::Value`.
pub type DynamicCache = Cache<serde_json::Value, JsonCodec>;

impl<V> Cache<V, JsonCodec>
where
    V: Serialize + DeserializeOwned + Clone,
{
    // == Constructors ==
    /// Creates a disk-backed cache storing files in `directory`.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(directory: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        CacheBuilder::new(namespace).directory(directory).build()
    }

    /// Creates a cache that never touches the filesystem.
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        CacheBuilder::new(namespace).build()
    }
}

impl<V, C> Cache<V, C>
where
    V: Serialize + DeserializeOwned + Clone,
    C: Codec,
{
    pub(crate) fn from_parts(
        namespace: String,
        directory: Option<PathBuf>,
        policy: CachePolicy,
        codec: C,
        files: Arc<dyn FileStore>,
    ) -> Self {
        info!(
            namespace = %namespace,
            directory = ?directory,
            ?policy,
            "Cache initialized"
        );

        Self {
            namespace,
            directory,
            policy: RwLock::new(policy),
            entries: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::new()),
            op_lock: Mutex::new(()),
            codec,
            files,
        }
    }

    // == Accessors ==
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Storage directory, or None for in-memory caches.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.directory.is_none()
    }

    // == Policy ==
    /// Returns a copy of the current policy.
    pub fn policy(&self) -> CachePolicy {
        *self.policy.read()
    }

    /// Replaces the policy. Takes effect on the next operation.
    pub fn set_policy(&self, policy: CachePolicy) {
        *self.policy.write() = policy;
    }

    pub fn set_memory_limit(&self, limit: MemoryLimit) {
        self.policy.write().memory_limit = limit;
    }

    pub fn set_thread_safe(&self, thread_safe: bool) {
        self.policy.write().thread_safe = thread_safe;
    }

    pub fn set_persist_on_write(&self, persist_on_write: bool) {
        self.policy.write().persist_on_write = persist_on_write;
    }

    pub fn set_single_file(&self, single_file: bool) {
        self.policy.write().single_file = single_file;
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// Accepts either a value or a reference to one; the cache always keeps
    /// its own copy. Persists immediately when `persist_on_write` is set.
    /// If the memory limit is exceeded afterwards, another entry is evicted
    /// from memory (its file, if any, stays on disk).
    pub fn set<B: Borrow<V>>(&self, key: &str, value: B) -> Result<()> {
        let (policy, _guard) = self.begin()?;
        self.check_key(key)?;

        let value = value.borrow().clone();
        debug!(namespace = %self.namespace, key, "set");

        if policy.persist_on_write {
            if let Some(dir) = self.directory.as_deref() {
                self.insert_bounded(&policy, key, value.clone());
                return self.persist(&policy, dir, [(key, &value)]);
            }
        }

        self.insert_bounded(&policy, key, value);
        Ok(())
    }

    // == Get ==
    /// Returns the value stored under `key`.
    ///
    /// On a memory miss the cache file is read, decoded and promoted into
    /// memory. In-memory caches fail with `KeyNotFound` straight away.
    pub fn get(&self, key: &str) -> Result<V> {
        let (policy, _guard) = self.begin()?;
        self.check_key(key)?;
        self.get_inner(&policy, key)
    }

    fn get_inner(&self, policy: &CachePolicy, key: &str) -> Result<V> {
        let cached = self.entries.lock().get(key).cloned();
        if let Some(value) = cached {
            self.stats.lock().record_hit();
            return Ok(value);
        }

        let Some(dir) = self.directory.as_deref() else {
            self.stats.lock().record_miss();
            return Err(self.key_not_found(key));
        };

        match self.read_from_disk(policy, dir, key) {
            Ok(value) => {
                debug!(namespace = %self.namespace, key, "promoting value from disk");
                self.stats.lock().record_disk_hit();
                self.insert_bounded(policy, key, value.clone());
                Ok(value)
            }
            Err(err) => {
                if err.is_key_not_found() {
                    self.stats.lock().record_miss();
                }
                Err(err)
            }
        }
    }

    // == Has ==
    /// Returns true if `key` is in memory or has a cache file.
    ///
    /// Never promotes a disk value into memory.
    pub fn has(&self, key: &str) -> Result<bool> {
        let (policy, _guard) = self.begin()?;
        self.check_key(key)?;

        if self.entries.lock().contains_key(key) {
            return Ok(true);
        }

        let Some(dir) = self.directory.as_deref() else {
            return Ok(false);
        };

        if policy.single_file {
            return Ok(self.load_aggregate(dir)?.contains_key(key));
        }

        let wanted = naming::file_name(&self.namespace, key);
        Ok(self.list_dir(dir)?.iter().any(|name| *name == wanted))
    }

    // == Delete ==
    /// Removes `key` from memory and from disk.
    ///
    /// Deleting a key that exists nowhere succeeds.
    pub fn delete(&self, key: &str) -> Result<()> {
        let (policy, _guard) = self.begin()?;
        self.check_key(key)?;

        self.entries.lock().remove(key);
        debug!(namespace = %self.namespace, key, "delete");

        let Some(dir) = self.directory.as_deref() else {
            return Ok(());
        };

        if policy.single_file {
            return self.delete_from_aggregate(dir, key);
        }

        match self.files.remove(&naming::file_path(dir, &self.namespace, key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PStoreError::Delete {
                namespace: self.namespace.clone(),
                key: key.to_string(),
                source,
            }),
        }
    }

    // == Keys ==
    /// Lists every key held in memory or on disk, in no particular order.
    ///
    /// Disk-backed caches report the union of keys found on disk and keys
    /// held in memory, so entries not yet saved are included. In-memory
    /// caches report memory only.
    pub fn keys(&self) -> Result<Vec<String>> {
        let (policy, _guard) = self.begin()?;
        self.keys_inner(&policy)
    }

    fn keys_inner(&self, policy: &CachePolicy) -> Result<Vec<String>> {
        let mut keys: BTreeSet<String> = self.entries.lock().keys().cloned().collect();

        if let Some(dir) = self.directory.as_deref() {
            if policy.single_file {
                keys.extend(self.load_aggregate(dir)?.into_keys());
            } else {
                keys.extend(
                    self.list_dir(dir)?
                        .iter()
                        .filter_map(|name| naming::parse_key(&self.namespace, name))
                        .map(str::to_string),
                );
            }
        }

        Ok(keys.into_iter().collect())
    }

    // == Length ==
    /// Number of keys reported by [`Cache::keys`].
    pub fn len(&self) -> Result<usize> {
        let (policy, _guard) = self.begin()?;
        Ok(self.keys_inner(&policy)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // == Save To Disk ==
    /// Writes every in-memory entry to disk.
    ///
    /// Does nothing when `persist_on_write` is set, since every set already
    /// persisted, or for in-memory caches. Stops at the first failure;
    /// entries written before it stay written.
    pub fn save_to_disk(&self) -> Result<()> {
        let (policy, _guard) = self.begin()?;

        if policy.persist_on_write {
            return Ok(());
        }
        let Some(dir) = self.directory.as_deref() else {
            return Ok(());
        };

        let snapshot: Vec<(String, V)> = self
            .entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        info!(
            namespace = %self.namespace,
            entries = snapshot.len(),
            single_file = policy.single_file,
            "Saving cache to disk"
        );

        self.persist(&policy, dir, snapshot.iter().map(|(k, v)| (k.as_str(), v)))
    }

    // == Memory Inspection ==
    /// Keys currently held in memory, ignoring disk.
    pub fn memory_keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Number of entries currently held in memory.
    pub fn memory_len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn contains_in_memory(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.memory_entries = self.entries.lock().len();
        stats
    }

    // == Internals ==
    /// Snapshots the policy and takes the operation lock if it asks for one.
    ///
    /// Fails for every operation when the namespace cannot prefix a file name.
    fn begin(&self) -> Result<(CachePolicy, Option<MutexGuard<'_, ()>>)> {
        naming::validate_namespace(&self.namespace).map_err(|reason| {
            PStoreError::InvalidNamespace {
                namespace: self.namespace.clone(),
                reason,
            }
        })?;

        let policy = *self.policy.read();
        let guard = policy.thread_safe.then(|| self.op_lock.lock());
        Ok((policy, guard))
    }

    fn check_key(&self, key: &str) -> Result<()> {
        naming::validate_key(key).map_err(|reason| PStoreError::InvalidKey {
            namespace: self.namespace.clone(),
            key: key.to_string(),
            reason,
        })
    }

    fn key_not_found(&self, key: &str) -> PStoreError {
        PStoreError::KeyNotFound {
            namespace: self.namespace.clone(),
            key: key.to_string(),
        }
    }

    fn insert_bounded(&self, policy: &CachePolicy, key: &str, value: V) {
        let evicted = {
            let mut entries = self.entries.lock();
            entries.insert(key.to_string(), value);
            enforce_limit(&mut entries, policy.memory_limit, key)
        };

        if !evicted.is_empty() {
            debug!(namespace = %self.namespace, ?evicted, "evicted from memory");
            let mut stats = self.stats.lock();
            for _ in &evicted {
                stats.record_eviction();
            }
        }
    }

    /// Lists the storage directory. A directory that was never created holds
    /// no cache files.
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        match self.files.list(dir) {
            Ok(names) => Ok(names),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => {
                warn!(namespace = %self.namespace, error = %source, "failed to list cache directory");
                Err(PStoreError::ReadFiles {
                    namespace: self.namespace.clone(),
                    source,
                })
            }
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<Vec<u8>> {
        self.codec
            .encode(value)
            .map_err(|source| PStoreError::Serialize {
                namespace: self.namespace.clone(),
                key: key.to_string(),
                source,
            })
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, bytes: &[u8]) -> Result<T> {
        self.codec
            .decode(bytes)
            .map_err(|source| PStoreError::Deserialize {
                namespace: self.namespace.clone(),
                key: key.to_string(),
                source,
            })
    }

    fn write_file(&self, dir: &Path, key: &str, bytes: &[u8]) -> Result<()> {
        let path = naming::file_path(dir, &self.namespace, key);
        self.files
            .write(&path, bytes)
            .map_err(|source| PStoreError::Save {
                namespace: self.namespace.clone(),
                key: key.to_string(),
                source,
            })?;
        self.stats.lock().record_write();
        Ok(())
    }

    /// Writes `items` to disk, one file per key or merged into the aggregate.
    fn persist<'a, I>(&self, policy: &CachePolicy, dir: &Path, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a V)>,
        V: 'a,
    {
        if policy.single_file {
            let mut aggregate = self.load_aggregate(dir)?;
            for (key, value) in items {
                aggregate.insert(key.to_string(), value.clone());
            }
            let bytes = self.encode(AGGREGATE_KEY, &aggregate)?;
            return self.write_file(dir, AGGREGATE_KEY, &bytes);
        }

        for (key, value) in items {
            let bytes = self.encode(key, value)?;
            self.write_file(dir, key, &bytes)?;
        }
        Ok(())
    }

    fn read_from_disk(&self, policy: &CachePolicy, dir: &Path, key: &str) -> Result<V> {
        if policy.single_file {
            return self
                .load_aggregate(dir)?
                .remove(key)
                .ok_or_else(|| self.key_not_found(key));
        }

        let path = naming::file_path(dir, &self.namespace, key);
        let bytes = match self.files.read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(self.key_not_found(key));
            }
            Err(source) => {
                return Err(PStoreError::Read {
                    namespace: self.namespace.clone(),
                    key: key.to_string(),
                    source,
                });
            }
        };

        self.decode(key, &bytes)
    }

    /// Reads the aggregate file. A missing file is an empty aggregate.
    fn load_aggregate(&self, dir: &Path) -> Result<HashMap<String, V>> {
        let path = naming::file_path(dir, &self.namespace, AGGREGATE_KEY);
        match self.files.read(&path) {
            Ok(bytes) => self.decode(AGGREGATE_KEY, &bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(PStoreError::Read {
                namespace: self.namespace.clone(),
                key: AGGREGATE_KEY.to_string(),
                source,
            }),
        }
    }

    fn delete_from_aggregate(&self, dir: &Path, key: &str) -> Result<()> {
        let mut aggregate = self.load_aggregate(dir)?;
        if aggregate.remove(key).is_none() {
            return Ok(());
        }

        let bytes = self.encode(AGGREGATE_KEY, &aggregate)?;
        let path = naming::file_path(dir, &self.namespace, AGGREGATE_KEY);
        self.files
            .write(&path, &bytes)
            .map_err(|source| PStoreError::Delete {
                namespace: self.namespace.clone(),
                key: key.to_string(),
                source,
            })
    }
}

// == Typed Access ==
/// Typed access is limited to the JSON codec: `serde_json::Value` needs a
/// self-describing format to come back from disk.
impl Cache<serde_json::Value, JsonCodec> {
    /// Stores any serializable value in a dynamic cache.
    ///
    /// Fails with `Serialize` if the value has no JSON form, including
    /// non-finite floats.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.check_key(key)?;
        let value = check_finite(value)
            .and_then(|()| serde_json::to_value(value).map_err(CodecError::Json))
            .map_err(|source| PStoreError::Serialize {
                namespace: self.namespace.clone(),
                key: key.to_string(),
                source,
            })?;
        self.set(key, value)
    }

    /// Reads a value from a dynamic cache as `T`.
    ///
    /// Fails with `ExpectedType` if the stored value does not have the shape
    /// of `T`. The stored value is left untouched.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).map_err(|source| PStoreError::ExpectedType {
            namespace: self.namespace.clone(),
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            source,
        })
    }
}

impl<V, C> std::fmt::Debug for Cache<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("namespace", &self.namespace)
            .field("directory", &self.directory)
            .field("policy", &*self.policy.read())
            .field("memory_entries", &self.entries.lock().len())
            .finish()
    }
}

impl<V> Default for Cache<V, JsonCodec>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// An in-memory cache named `default`.
    fn default() -> Self {
        Self::from_parts(
            "default".to_string(),
            None,
            CachePolicy::default(),
            JsonCodec,
            Arc::new(LocalFileStore),
        )
    }
}
