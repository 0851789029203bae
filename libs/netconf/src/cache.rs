//! Resolved netconf cache.
//!
//! At attach time the resolved [`VfNetConf`] is written under a key derived
//! from the container ID and interface name; at detach time it is read back
//! so teardown uses exactly the configuration that was applied, even if host
//! state has changed since.
//!
//! Layout: `{base_dir}/{container_id}-{if_name}`, one JSON document per entry.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CacheError, KeyError};
use crate::store::BlobStore;
use crate::types::VfNetConf;

/// Default directory for cached netconf entries.
pub const DEFAULT_CACHE_DIR: &str = "/var/lib/cni/sriov";

/// Separator between container ID and interface name in a cache key.
pub const KEY_SEPARATOR: char = '-';

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory that holds cache entries.
    pub base_dir: PathBuf,
}

impl CacheConfig {
    /// Create a configuration rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

/// Identity of one attachment: a container plus the interface name inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    container_id: String,
    if_name: String,
}

impl CacheKey {
    /// Build a key, rejecting components that could collide or escape the
    /// cache directory.
    pub fn new(container_id: &str, if_name: &str) -> Result<Self, KeyError> {
        check_component("container id", container_id)?;
        check_component("interface name", if_name)?;

        // With no separator in the container ID, the first separator in the
        // reference name always splits it back into the same pair.
        if container_id.contains(KEY_SEPARATOR) {
            return Err(KeyError::AmbiguousContainerId(container_id.to_string()));
        }

        Ok(Self {
            container_id: container_id.to_string(),
            if_name: if_name.to_string(),
        })
    }

    /// Get the container ID.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Get the interface name.
    pub fn if_name(&self) -> &str {
        &self.if_name
    }

    /// Entry name inside the cache directory.
    pub fn ref_name(&self) -> String {
        format!("{}{}{}", self.container_id, KEY_SEPARATOR, self.if_name)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ref_name())
    }
}

fn check_component(component: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        return Err(KeyError::Empty { component });
    }
    if value == "." || value == ".." || value.contains(['/', '\0']) {
        return Err(KeyError::InvalidComponent {
            component,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Store and retrieve resolved netconf by attachment identity.
#[derive(Debug)]
pub struct ConfigCache<S> {
    config: CacheConfig,
    blobs: S,
}

impl<S: BlobStore> ConfigCache<S> {
    /// Create a cache over a blob store.
    pub fn new(config: CacheConfig, blobs: S) -> Self {
        Self { config, blobs }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the underlying blob store.
    pub fn blobs(&self) -> &S {
        &self.blobs
    }

    /// Storage address for a key.
    pub fn address(&self, key: &CacheKey) -> PathBuf {
        self.config.base_dir.join(key.ref_name())
    }

    /// Persist a resolved record. Returns the storage address.
    ///
    /// Records that fail [`VfNetConf::validate`] are refused.
    pub fn store(&self, key: &CacheKey, conf: &VfNetConf) -> Result<PathBuf, CacheError> {
        let address = self.address(key);

        let bytes = conf
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
            .and_then(|()| serde_json::to_vec(conf).map_err(io::Error::from))
            .map_err(|source| CacheError::PersistenceFailed {
                address: address.clone(),
                source,
            })?;

        self.blobs
            .write(&address, &bytes)
            .map_err(|source| CacheError::PersistenceFailed {
                address: address.clone(),
                source,
            })?;

        info!(
            key = %key,
            path = %address.display(),
            device_id = %conf.device_id,
            "Cached VF netconf"
        );

        Ok(address)
    }

    /// Load a cached record and its storage address.
    ///
    /// A missing entry and an unreadable one are reported the same way.
    pub fn load(&self, key: &CacheKey) -> Result<(VfNetConf, PathBuf), CacheError> {
        let address = self.address(key);

        let bytes = self.blobs.read(&address).map_err(|source| {
            debug!(key = %key, path = %address.display(), error = %source, "Cache read failed");
            CacheError::CacheMissOrReadError {
                address: address.clone(),
                source,
            }
        })?;

        let conf: VfNetConf =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::CorruptedCacheEntry {
                address: address.clone(),
                source: Box::new(e),
            })?;

        if let Err(e) = conf.validate() {
            warn!(key = %key, path = %address.display(), error = %e, "Cached netconf is invalid");
            return Err(CacheError::CorruptedCacheEntry {
                address,
                source: Box::new(e),
            });
        }

        debug!(key = %key, path = %address.display(), device_id = %conf.device_id, "Loaded cached VF netconf");

        Ok((conf, address))
    }

    /// Remove an entry after teardown.
    pub fn remove(&self, address: &Path) -> Result<(), CacheError> {
        self.blobs
            .remove(address)
            .map_err(|source| CacheError::PersistenceFailed {
                address: address.to_path_buf(),
                source,
            })?;

        info!(path = %address.display(), "Removed cached VF netconf");
        Ok(())
    }
}
