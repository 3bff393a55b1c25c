//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Every variant carries the
//! namespace of the cache that produced it and, where one applies, the key.

use thiserror::Error;

use crate::codec::CodecError;

// == Error Kind ==
/// Fieldless discriminant of [`PStoreError`], for matching on the kind of
/// failure without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ReadFiles,
    KeyNotFound,
    Read,
    Deserialize,
    Serialize,
    Save,
    Delete,
    ExpectedType,
    InvalidKey,
    InvalidNamespace,
}

// == PStore Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum PStoreError {
    /// Listing the storage directory failed
    #[error("pstore: {namespace}: failed to read files: {source}")]
    ReadFiles {
        namespace: String,
        #[source]
        source: std::io::Error,
    },

    /// Key absent from memory and, if applicable, from disk
    #[error("pstore: {namespace}: key not found {key}")]
    KeyNotFound { namespace: String, key: String },

    /// Cache file could not be read
    #[error("pstore: {namespace}: failed to read from disk {key}: {source}")]
    Read {
        namespace: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Bytes were read but could not be decoded
    #[error("pstore: {namespace}: failed to deserialize {key}: {source}")]
    Deserialize {
        namespace: String,
        key: String,
        #[source]
        source: CodecError,
    },

    /// Value could not be encoded
    #[error("pstore: {namespace}: failed to serialize {key}: {source}")]
    Serialize {
        namespace: String,
        key: String,
        #[source]
        source: CodecError,
    },

    /// Encoded bytes could not be written
    #[error("pstore: {namespace}: failed to save {key}: {source}")]
    Save {
        namespace: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Cache file removal failed
    #[error("pstore: {namespace}: failed to delete {key}: {source}")]
    Delete {
        namespace: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored value does not fit the requested type
    #[error("pstore: {namespace}: expected type {expected} for {key}: {source}")]
    ExpectedType {
        namespace: String,
        key: String,
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Key cannot be used as part of a file name
    #[error("pstore: {namespace}: invalid key {key:?}: {reason}")]
    InvalidKey {
        namespace: String,
        key: String,
        reason: &'static str,
    },

    /// Namespace cannot prefix a file name
    #[error("pstore: invalid namespace {namespace:?}: {reason}")]
    InvalidNamespace {
        namespace: String,
        reason: &'static str,
    },
}

impl PStoreError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PStoreError::ReadFiles { .. } => ErrorKind::ReadFiles,
            PStoreError::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            PStoreError::Read { .. } => ErrorKind::Read,
            PStoreError::Deserialize { .. } => ErrorKind::Deserialize,
            PStoreError::Serialize { .. } => ErrorKind::Serialize,
            PStoreError::Save { .. } => ErrorKind::Save,
            PStoreError::Delete { .. } => ErrorKind::Delete,
            PStoreError::ExpectedType { .. } => ErrorKind::ExpectedType,
            PStoreError::InvalidKey { .. } => ErrorKind::InvalidKey,
            PStoreError::InvalidNamespace { .. } => ErrorKind::InvalidNamespace,
        }
    }

    /// Namespace of the cache that produced the error.
    pub fn namespace(&self) -> &str {
        match self {
            PStoreError::ReadFiles { namespace, .. }
            | PStoreError::KeyNotFound { namespace, .. }
            | PStoreError::Read { namespace, .. }
            | PStoreError::Deserialize { namespace, .. }
            | PStoreError::Serialize { namespace, .. }
            | PStoreError::Save { namespace, .. }
            | PStoreError::Delete { namespace, .. }
            | PStoreError::ExpectedType { namespace, .. }
            | PStoreError::InvalidKey { namespace, .. }
            | PStoreError::InvalidNamespace { namespace, .. } => namespace,
        }
    }

    /// Offending key, if the failure concerns a single key.
    pub fn key(&self) -> Option<&str> {
        match self {
            PStoreError::ReadFiles { .. } | PStoreError::InvalidNamespace { .. } => None,
            PStoreError::KeyNotFound { key, .. }
            | PStoreError::Read { key, .. }
            | PStoreError::Deserialize { key, .. }
            | PStoreError::Serialize { key, .. }
            | PStoreError::Save { key, .. }
            | PStoreError::Delete { key, .. }
            | PStoreError::ExpectedType { key, .. }
            | PStoreError::InvalidKey { key, .. } => Some(key),
        }
    }

    pub fn is_key_not_found(&self) -> bool {
        self.kind() == ErrorKind::KeyNotFound
    }

    pub fn is_expected_type(&self) -> bool {
        self.kind() == ErrorKind::ExpectedType
    }

    pub fn is_read_files_failed(&self) -> bool {
        self.kind() == ErrorKind::ReadFiles
    }

    pub fn is_read_failed(&self) -> bool {
        self.kind() == ErrorKind::Read
    }

    pub fn is_deserialize_failed(&self) -> bool {
        self.kind() == ErrorKind::Deserialize
    }

    pub fn is_serialize_failed(&self) -> bool {
        self.kind() == ErrorKind::Serialize
    }

    pub fn is_save_failed(&self) -> bool {
        self.kind() == ErrorKind::Save
    }

    pub fn is_delete_failed(&self) -> bool {
        self.kind() == ErrorKind::Delete
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, PStoreError>;
