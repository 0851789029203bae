//! Byte-blob storage behind the config cache.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

/// Address-keyed byte storage.
pub trait BlobStore {
    /// Write `bytes` at `address`, replacing any previous blob.
    fn write(&self, address: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Read the blob at `address`.
    fn read(&self, address: &Path) -> io::Result<Vec<u8>>;

    /// Remove the blob at `address`. Removing an absent blob is not an error.
    fn remove(&self, address: &Path) -> io::Result<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn write(&self, address: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).write(address, bytes)
    }

    fn read(&self, address: &Path) -> io::Result<Vec<u8>> {
        (**self).read(address)
    }

    fn remove(&self, address: &Path) -> io::Result<()> {
        (**self).remove(address)
    }
}

/// Filesystem blob store.
///
/// Writes go to a uniquely named sibling temp file that is then renamed over
/// the target, so a reader never observes a half-written entry. Temp names
/// are created exclusively and start with `.tmp`, so they never replace
/// another entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBlobStore;

impl FsBlobStore {
    /// Create a filesystem store.
    pub fn new() -> Self {
        Self
    }
}

impl BlobStore for FsBlobStore {
    fn write(&self, address: &Path, bytes: &[u8]) -> io::Result<()> {
        let parent = match address.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Dropping the temp file on any error below removes it.
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(address).map_err(|e| e.error)?;

        debug!(path = %address.display(), bytes = bytes.len(), "Wrote blob");
        Ok(())
    }

    fn read(&self, address: &Path) -> io::Result<Vec<u8>> {
        fs::read(address)
    }

    fn remove(&self, address: &Path) -> io::Result<()> {
        match fs::remove_file(address) {
            Ok(()) => {
                debug!(path = %address.display(), "Removed blob");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>>> {
        self.blobs
            .lock()
            .map_err(|_| io::Error::other("blob store lock poisoned"))
    }
}

impl BlobStore for MemoryBlobStore {
    fn write(&self, address: &Path, bytes: &[u8]) -> io::Result<()> {
        self.lock()?.insert(address.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, address: &Path) -> io::Result<Vec<u8>> {
        self.lock()?.get(address).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no blob at {}", address.display()),
            )
        })
    }

    fn remove(&self, address: &Path) -> io::Result<()> {
        self.lock()?.remove(address);
        Ok(())
    }
}
