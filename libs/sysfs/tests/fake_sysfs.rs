//! Tests against a fake sysfs tree built in a temp directory.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vfnet_netconf::{ConfigResolver, HostError, HostIntrospection, ResolveError};
use vfnet_sysfs::SysfsHost;

const PF_PCI: &str = "0000:af:00.0";
const PF_NAME: &str = "enp175s0f0";

/// Minimal sysfs: one PF with VFs registered via `add_vf`.
struct FakeSysfs {
    dir: TempDir,
}

impl FakeSysfs {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sysfs = Self { dir };

        fs::create_dir_all(sysfs.device(PF_PCI).join("net").join(PF_NAME)).unwrap();
        fs::create_dir_all(sysfs.pf_device()).unwrap();
        sysfs
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn device(&self, pci: &str) -> PathBuf {
        self.root().join("bus/pci/devices").join(pci)
    }

    fn pf_device(&self) -> PathBuf {
        self.root().join("class/net").join(PF_NAME).join("device")
    }

    fn add_vf(&self, pci: &str, index: u32) {
        let dev = self.device(pci);
        fs::create_dir_all(&dev).unwrap();
        symlink(self.device(PF_PCI), dev.join("physfn")).unwrap();
        symlink(&dev, self.pf_device().join(format!("virtfn{}", index))).unwrap();
    }

    fn add_netdev(&self, pci: &str, name: &str) {
        fs::create_dir_all(self.device(pci).join("net").join(name)).unwrap();
    }

    fn bind_driver(&self, pci: &str, driver: &str) {
        symlink(
            self.root().join("bus/pci/drivers").join(driver),
            self.device(pci).join("driver"),
        )
        .unwrap();
    }

    fn host(&self) -> SysfsHost {
        SysfsHost::new(self.root())
    }
}

#[test]
fn test_physical_function_and_index() {
    let sysfs = FakeSysfs::new();
    sysfs.add_vf("0000:af:02.0", 0);
    sysfs.add_vf("0000:af:02.1", 1);
    sysfs.add_vf("0000:af:03.2", 10);

    let host = sysfs.host();
    assert_eq!(host.physical_function("0000:af:02.1").unwrap(), PF_NAME);
    assert_eq!(host.vf_index("0000:af:02.0", PF_NAME).unwrap(), 0);
    assert_eq!(host.vf_index("0000:af:02.1", PF_NAME).unwrap(), 1);
    assert_eq!(host.vf_index("0000:af:03.2", PF_NAME).unwrap(), 10);
}

#[test]
fn test_not_a_vf() {
    let sysfs = FakeSysfs::new();
    let host = sysfs.host();

    // The PF itself has no physfn link.
    assert!(matches!(
        host.physical_function(PF_PCI),
        Err(HostError::Io { .. })
    ));
}

#[test]
fn test_index_not_found_on_other_pf() {
    let sysfs = FakeSysfs::new();
    sysfs.add_vf("0000:af:02.0", 0);
    fs::create_dir_all(sysfs.root().join("class/net/enp175s0f1/device")).unwrap();

    let err = sysfs.host().vf_index("0000:af:02.0", "enp175s0f1").unwrap_err();
    assert!(matches!(err, HostError::NotFound(_)));
}

#[test]
fn test_interface_names() {
    let sysfs = FakeSysfs::new();
    sysfs.add_vf("0000:af:02.0", 0);
    sysfs.add_vf("0000:af:02.1", 1);
    sysfs.add_netdev("0000:af:02.0", "enp175s0f0v0");

    let host = sysfs.host();
    assert_eq!(host.interface_names("0000:af:02.0").unwrap(), "enp175s0f0v0");
    assert_eq!(host.interface_names("0000:af:02.1").unwrap(), "");
}

#[test]
fn test_interface_names_multiple_sorted() {
    let sysfs = FakeSysfs::new();
    sysfs.add_vf("0000:af:02.0", 0);
    sysfs.add_netdev("0000:af:02.0", "net_b");
    sysfs.add_netdev("0000:af:02.0", "net_a");

    assert_eq!(
        sysfs.host().interface_names("0000:af:02.0").unwrap(),
        "net_a,net_b"
    );
}

#[test]
fn test_bypass_driver_detection() {
    let sysfs = FakeSysfs::new();
    sysfs.add_vf("0000:af:02.0", 0);
    sysfs.add_vf("0000:af:02.1", 1);
    sysfs.add_vf("0000:af:02.2", 2);
    sysfs.bind_driver("0000:af:02.0", "vfio-pci");
    sysfs.bind_driver("0000:af:02.1", "iavf");

    let host = sysfs.host();
    assert!(host.has_bypass_driver("0000:af:02.0").unwrap());
    assert!(!host.has_bypass_driver("0000:af:02.1").unwrap());
    assert!(host.has_bypass_driver("0000:af:02.2").is_err());

    let host = host.with_bypass_drivers(["iavf"]);
    assert!(host.has_bypass_driver("0000:af:02.1").unwrap());
}

#[test]
fn test_resolve_against_sysfs() {
    let sysfs = FakeSysfs::new();
    sysfs.add_vf("0000:af:02.0", 0);
    sysfs.add_vf("0000:af:02.1", 1);
    sysfs.add_vf("0000:af:02.2", 2);
    sysfs.add_netdev("0000:af:02.0", "enp175s0f0v0");
    sysfs.bind_driver("0000:af:02.0", "iavf");
    sysfs.bind_driver("0000:af:02.1", "vfio-pci");

    let resolver = ConfigResolver::new(sysfs.host());

    let netdev = resolver
        .resolve(br#"{"deviceID": "0000:af:02.0", "vlan": 10, "vlanQoS": 1}"#)
        .unwrap();
    assert_eq!(netdev.pf_name, PF_NAME);
    assert_eq!(netdev.vf_index, 0);
    assert_eq!(netdev.host_if_names, "enp175s0f0v0");

    let dpdk = resolver.resolve(br#"{"deviceID": "0000:af:02.1"}"#).unwrap();
    assert_eq!(dpdk.vf_index, 1);
    assert!(dpdk.kernel_bypass);

    // No netdev and no driver bound: driver state is indeterminate.
    let err = resolver.resolve(br#"{"deviceID": "0000:af:02.2"}"#).unwrap_err();
    assert!(matches!(err, ResolveError::DriverDetectionFailed { .. }));

    let err = resolver.resolve(br#"{"deviceID": "af:02.0"}"#).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::DeviceResolutionFailed {
            source: HostError::InvalidAddress(_),
            ..
        }
    ));
}
