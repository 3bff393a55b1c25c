//! File Store Module
//!
//! Filesystem access used by the cache engine. Kept behind a trait so the
//! engine can be exercised against failing or instrumented stores.

use std::fs;
use std::io;
use std::path::Path;

// == File Store Trait ==
/// Minimal filesystem surface needed by the cache.
///
/// "Not found" is reported as `io::ErrorKind::NotFound`; callers rely on that
/// to tell a missing file apart from other failures.
pub trait FileStore: Send + Sync {
    /// Returns the file names (not full paths) directly inside `dir`.
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Writes `bytes` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;
}

// == Local File Store ==
/// [`FileStore`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                // Non UTF-8 names can never match a cache file name
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
