//! Configuration for vfctl.

use std::path::PathBuf;

use anyhow::{bail, Result};
use vfnet_netconf::{CacheConfig, DEFAULT_CACHE_DIR};
use vfnet_sysfs::{SysfsHost, DEFAULT_BYPASS_DRIVERS, SYSFS_ROOT};

/// vfctl configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding cached netconf entries.
    pub cache_dir: PathBuf,

    /// Sysfs mount point.
    pub sysfs_root: PathBuf,

    /// Drivers treated as kernel-bypass.
    pub bypass_drivers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            sysfs_root: PathBuf::from(SYSFS_ROOT),
            bypass_drivers: DEFAULT_BYPASS_DRIVERS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup("VFNET_CACHE_DIR") {
            if dir.trim().is_empty() {
                bail!("VFNET_CACHE_DIR must not be empty");
            }
            config.cache_dir = PathBuf::from(dir);
        }

        if let Some(root) = lookup("VFNET_SYSFS_ROOT") {
            if root.trim().is_empty() {
                bail!("VFNET_SYSFS_ROOT must not be empty");
            }
            config.sysfs_root = PathBuf::from(root);
        }

        if let Some(drivers) = lookup("VFNET_BYPASS_DRIVERS") {
            let drivers: Vec<String> = drivers
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
            if drivers.is_empty() {
                bail!("VFNET_BYPASS_DRIVERS must name at least one driver");
            }
            config.bypass_drivers = drivers;
        }

        Ok(config)
    }

    /// Cache configuration for the core library.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(&self.cache_dir)
    }

    /// Sysfs host configured with this config's root and drivers.
    pub fn sysfs_host(&self) -> SysfsHost {
        SysfsHost::new(&self.sysfs_root).with_bypass_drivers(self.bypass_drivers.iter().cloned())
    }
}
