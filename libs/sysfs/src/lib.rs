//! Sysfs-backed host introspection for SR-IOV VFs.
//!
//! Layout relied on (relative to the sysfs root, normally `/sys`):
//!
//! ```text
//! bus/pci/devices/<vf>/physfn        -> PF PCI device
//! bus/pci/devices/<vf>/physfn/net/   -> PF netdev name(s)
//! bus/pci/devices/<vf>/net/          -> VF netdev name(s), absent when unbound
//! bus/pci/devices/<vf>/driver        -> bound driver
//! class/net/<pf>/device/virtfn<N>    -> VF PCI device for index N
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use vfnet_netconf::{HostError, HostIntrospection};

/// Default sysfs mount point.
pub const SYSFS_ROOT: &str = "/sys";

/// Drivers that take a VF away from the kernel network stack.
pub const DEFAULT_BYPASS_DRIVERS: [&str; 3] = ["vfio-pci", "uio_pci_generic", "igb_uio"];

/// Full PCI address: domain:bus:device.function, e.g. `0000:af:06.0`.
static PCI_ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{4}:[0-9a-fA-F]{2}:[0-9a-fA-F]{2}\.[0-7]$")
        .expect("Invalid PCI address regex")
});

/// Validate PCI address format.
pub fn is_valid_pci_address(address: &str) -> bool {
    PCI_ADDRESS_REGEX.is_match(address)
}

/// Host introspection over a sysfs tree.
#[derive(Debug, Clone)]
pub struct SysfsHost {
    root: PathBuf,
    bypass_drivers: Vec<String>,
}

impl Default for SysfsHost {
    fn default() -> Self {
        Self::new(SYSFS_ROOT)
    }
}

impl SysfsHost {
    /// Create a host reading sysfs at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bypass_drivers: DEFAULT_BYPASS_DRIVERS.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Replace the set of drivers treated as kernel-bypass.
    pub fn with_bypass_drivers<I, S>(mut self, drivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bypass_drivers = drivers.into_iter().map(Into::into).collect();
        self
    }

    /// Get the sysfs root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the kernel-bypass driver names.
    pub fn bypass_drivers(&self) -> &[String] {
        &self.bypass_drivers
    }

    fn device_path(&self, vf_pci: &str) -> Result<PathBuf, HostError> {
        if !is_valid_pci_address(vf_pci) {
            return Err(HostError::InvalidAddress(format!(
                "{} (expected: 0000:01:00.0)",
                vf_pci
            )));
        }
        Ok(self.root.join("bus/pci/devices").join(vf_pci))
    }
}

impl HostIntrospection for SysfsHost {
    fn physical_function(&self, vf_pci: &str) -> Result<String, HostError> {
        let net_dir = self.device_path(vf_pci)?.join("physfn").join("net");
        let names = read_dir_names(&net_dir)?;

        let pf = names
            .into_iter()
            .next()
            .ok_or_else(|| HostError::NotFound(format!("PF network device for {}", vf_pci)))?;

        debug!(vf = %vf_pci, pf = %pf, "Read PF from sysfs");
        Ok(pf)
    }

    fn vf_index(&self, vf_pci: &str, pf_name: &str) -> Result<u32, HostError> {
        if pf_name.is_empty() || pf_name.contains('/') || pf_name == "." || pf_name == ".." {
            return Err(HostError::NotFound(format!("PF netdev '{}'", pf_name)));
        }

        let pf_device = self.root.join("class/net").join(pf_name).join("device");
        for name in read_dir_names(&pf_device)? {
            let Some(index) = name
                .strip_prefix("virtfn")
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };

            let link = pf_device.join(&name);
            let target = fs::read_link(&link).map_err(|e| HostError::io(&link, e))?;
            if target.file_name().is_some_and(|f| f == vf_pci) {
                debug!(vf = %vf_pci, pf = %pf_name, index, "Read VF index from sysfs");
                return Ok(index);
            }
        }

        Err(HostError::NotFound(format!(
            "VF id for {} on {}",
            vf_pci, pf_name
        )))
    }

    fn interface_names(&self, vf_pci: &str) -> Result<String, HostError> {
        let net_dir = self.device_path(vf_pci)?.join("net");

        // The kernel drops the directory when no netdev driver is bound.
        let names = match read_dir_names(&net_dir) {
            Ok(names) => names,
            Err(HostError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(names.join(","))
    }

    fn has_bypass_driver(&self, vf_pci: &str) -> Result<bool, HostError> {
        let driver_link = self.device_path(vf_pci)?.join("driver");
        let target = fs::read_link(&driver_link).map_err(|e| HostError::io(&driver_link, e))?;

        let driver = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| HostError::NotFound(format!("driver name for {}", vf_pci)))?;

        let bypass = self.bypass_drivers.iter().any(|d| *d == driver);
        debug!(vf = %vf_pci, driver = %driver, bypass, "Read VF driver from sysfs");
        Ok(bypass)
    }
}

/// Sorted entry names of a directory.
fn read_dir_names(dir: &Path) -> Result<Vec<String>, HostError> {
    let entries = fs::read_dir(dir).map_err(|e| HostError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HostError::io(dir, e))?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0000:af:06.0", true)]
    #[case("0000:ff:1f.7", true)]
    #[case("ABCD:12:34.5", true)]
    #[case("af:06.0", false)]
    #[case("0000:af:06", false)]
    #[case("0000:af:06.8", false)]
    #[case("../../../etc", false)]
    #[case("0000:af:06.0/../x", false)]
    fn test_pci_address_validation(#[case] address: &str, #[case] valid: bool) {
        assert_eq!(is_valid_pci_address(address), valid);
    }

    #[test]
    fn test_invalid_address_rejected_before_io() {
        let host = SysfsHost::new("/nonexistent");
        assert!(matches!(
            host.physical_function("../etc"),
            Err(HostError::InvalidAddress(_))
        ));
        assert!(matches!(
            host.has_bypass_driver("bogus"),
            Err(HostError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_default_bypass_drivers() {
        let host = SysfsHost::default();
        assert_eq!(host.root(), Path::new("/sys"));
        assert!(host.bypass_drivers().iter().any(|d| d == "vfio-pci"));

        let host = host.with_bypass_drivers(["my_pmd"]);
        assert_eq!(host.bypass_drivers(), ["my_pmd".to_string()]);
    }
}
