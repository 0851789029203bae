//! # vfnet-testing
//!
//! Test doubles for the collaborators of `vfnet-netconf`:
//!
//! - [`FakeHost`]: scripted host introspection that records every query
//! - [`FakeVf`]: per-VF script (PF, index, netdev probe, driver probe)
//! - [`FailingBlobStore`]: blob store whose every operation fails

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use vfnet_netconf::{BlobStore, HostError, HostIntrospection};

/// Answer of a scripted probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The probe succeeds with this value.
    Answer(T),
    /// The probe fails.
    Fail,
}

impl<T: Clone> Probe<T> {
    fn get(&self, what: &str, vf_pci: &str) -> Result<T, HostError> {
        match self {
            Probe::Answer(value) => Ok(value.clone()),
            Probe::Fail => Err(HostError::io(
                format!("/sys/bus/pci/devices/{}/{}", vf_pci, what),
                io::Error::new(io::ErrorKind::PermissionDenied, "scripted failure"),
            )),
        }
    }
}

/// Scripted state of one VF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeVf {
    /// Owning PF, `None` if the address is not a VF.
    pub pf_name: Option<String>,
    /// VF index, `None` if it cannot be determined.
    pub vf_index: Option<u32>,
    /// Netdev probe answer.
    pub netdev: Probe<String>,
    /// Bypass-driver probe answer.
    pub bypass: Probe<bool>,
}

impl FakeVf {
    /// A VF that is a kernel netdev named `if_names`.
    pub fn netdev(pf_name: &str, vf_index: u32, if_names: &str) -> Self {
        Self {
            pf_name: Some(pf_name.to_string()),
            vf_index: Some(vf_index),
            netdev: Probe::Answer(if_names.to_string()),
            bypass: Probe::Answer(false),
        }
    }

    /// A VF with no netdev whose driver probe answers `bypass`.
    pub fn no_netdev(pf_name: &str, vf_index: u32, bypass: bool) -> Self {
        Self {
            pf_name: Some(pf_name.to_string()),
            vf_index: Some(vf_index),
            netdev: Probe::Answer(String::new()),
            bypass: Probe::Answer(bypass),
        }
    }

    /// Make the netdev probe fail.
    pub fn with_netdev_error(mut self) -> Self {
        self.netdev = Probe::Fail;
        self
    }

    /// Make the driver probe fail.
    pub fn with_driver_error(mut self) -> Self {
        self.bypass = Probe::Fail;
        self
    }

    /// Make the PF lookup fail.
    pub fn without_pf(mut self) -> Self {
        self.pf_name = None;
        self
    }

    /// Make the VF index lookup fail.
    pub fn without_index(mut self) -> Self {
        self.vf_index = None;
        self
    }
}

/// A query made against a [`FakeHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    PhysicalFunction(String),
    VfIndex(String, String),
    InterfaceNames(String),
    BypassDriver(String),
}

/// Scripted host. Unknown addresses are reported as not found.
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    vfs: HashMap<String, FakeVf>,
    calls: Arc<Mutex<Vec<HostCall>>>,
}

impl FakeHost {
    /// Create a host with no VFs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a VF at `vf_pci`.
    pub fn with_vf(mut self, vf_pci: &str, vf: FakeVf) -> Self {
        self.vfs.insert(vf_pci.to_string(), vf);
        self
    }

    /// All queries made so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Returns true if the driver probe was ever issued.
    pub fn probed_driver(&self) -> bool {
        self.calls()
            .iter()
            .any(|call| matches!(call, HostCall::BypassDriver(_)))
    }

    fn record(&self, call: HostCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn vf(&self, vf_pci: &str) -> Result<&FakeVf, HostError> {
        self.vfs
            .get(vf_pci)
            .ok_or_else(|| HostError::NotFound(format!("PCI device {}", vf_pci)))
    }
}

impl HostIntrospection for FakeHost {
    fn physical_function(&self, vf_pci: &str) -> Result<String, HostError> {
        self.record(HostCall::PhysicalFunction(vf_pci.to_string()));
        self.vf(vf_pci)?
            .pf_name
            .clone()
            .ok_or_else(|| HostError::NotFound(format!("PF network device for {}", vf_pci)))
    }

    fn vf_index(&self, vf_pci: &str, pf_name: &str) -> Result<u32, HostError> {
        self.record(HostCall::VfIndex(vf_pci.to_string(), pf_name.to_string()));
        self.vf(vf_pci)?
            .vf_index
            .ok_or_else(|| HostError::NotFound(format!("VF id for {} on {}", vf_pci, pf_name)))
    }

    fn interface_names(&self, vf_pci: &str) -> Result<String, HostError> {
        self.record(HostCall::InterfaceNames(vf_pci.to_string()));
        self.vf(vf_pci)?.netdev.get("net", vf_pci)
    }

    fn has_bypass_driver(&self, vf_pci: &str) -> Result<bool, HostError> {
        self.record(HostCall::BypassDriver(vf_pci.to_string()));
        self.vf(vf_pci)?.bypass.get("driver", vf_pci)
    }
}

/// Blob store that fails every operation with `kind`.
#[derive(Debug, Clone, Copy)]
pub struct FailingBlobStore {
    kind: io::ErrorKind,
}

impl FailingBlobStore {
    /// Create a store failing with `kind`.
    pub fn new(kind: io::ErrorKind) -> Self {
        Self { kind }
    }

    fn fail(&self, op: &str, address: &Path) -> io::Error {
        io::Error::new(self.kind, format!("{} {} failed", op, address.display()))
    }
}

impl BlobStore for FailingBlobStore {
    fn write(&self, address: &Path, _bytes: &[u8]) -> io::Result<()> {
        Err(self.fail("write", address))
    }

    fn read(&self, address: &Path) -> io::Result<Vec<u8>> {
        Err(self.fail("read", address))
    }

    fn remove(&self, address: &Path) -> io::Result<()> {
        Err(self.fail("remove", address))
    }
}
