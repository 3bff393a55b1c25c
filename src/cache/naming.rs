//! Cache File Naming
//!
//! Deterministic mapping between keys and file names:
//! `<namespace>_<key>.pcache`.

use std::path::{Path, PathBuf};

// == Constants ==
/// Extension shared by every cache file
pub const CACHE_EXTENSION: &str = ".pcache";

/// Key reserved for the aggregate file in single-file mode
pub const AGGREGATE_KEY: &str = "single_full_cache";

// == File Name ==
/// Returns the file name holding `key` for `namespace`.
pub fn file_name(namespace: &str, key: &str) -> String {
    format!("{}_{}{}", namespace, key, CACHE_EXTENSION)
}

/// Returns the full path of the file holding `key`.
pub fn file_path(directory: &Path, namespace: &str, key: &str) -> PathBuf {
    directory.join(file_name(namespace, key))
}

// == Parse ==
/// Recovers the key from a file name, or None if the name does not belong to
/// `namespace`. The aggregate file is never reported as a key.
pub fn parse_key<'a>(namespace: &str, file_name: &'a str) -> Option<&'a str> {
    let key = file_name
        .strip_prefix(namespace)?
        .strip_prefix('_')?
        .strip_suffix(CACHE_EXTENSION)?;

    if key.is_empty() || key == AGGREGATE_KEY {
        None
    } else {
        Some(key)
    }
}

// == Validate ==
/// Checks that `key` can be embedded in a file name.
///
/// Returns the reason for rejection, if any.
pub fn validate_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("key must not be empty");
    }
    if key.contains(['/', '\\']) {
        return Err("key must not contain a path separator");
    }
    if key.contains('\0') {
        return Err("key must not contain a NUL byte");
    }
    if key == AGGREGATE_KEY {
        return Err("key is reserved for the aggregate file");
    }
    Ok(())
}

/// Checks that `namespace` can prefix a file name.
pub fn validate_namespace(namespace: &str) -> Result<(), &'static str> {
    if namespace.is_empty() {
        return Err("namespace must not be empty");
    }
    if namespace.contains(['/', '\\']) {
        return Err("namespace must not contain a path separator");
    }
    if namespace.contains('\0') {
        return Err("namespace must not contain a NUL byte");
    }
    Ok(())
}
