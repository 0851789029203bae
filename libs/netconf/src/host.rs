//! Host-introspection collaborator.
//!
//! The resolver never touches host state directly; it asks an implementation
//! of [`HostIntrospection`]. Production code uses the sysfs implementation,
//! tests use scripted hosts.

use std::sync::Arc;

use crate::error::HostError;

/// Read-only queries about a VF's place on the host.
///
/// All methods are synchronous and device-scoped: two calls for different
/// VFs never touch the same host object.
pub trait HostIntrospection {
    /// Netdev name of the PF that owns the VF at `vf_pci`.
    fn physical_function(&self, vf_pci: &str) -> Result<String, HostError>;

    /// Index of the VF within the VF table of `pf_name`.
    fn vf_index(&self, vf_pci: &str, pf_name: &str) -> Result<u32, HostError>;

    /// Kernel interface name(s) of the VF, comma separated.
    ///
    /// An empty string means the VF currently has no netdev.
    fn interface_names(&self, vf_pci: &str) -> Result<String, HostError>;

    /// Whether the VF is bound to a kernel-bypass driver.
    fn has_bypass_driver(&self, vf_pci: &str) -> Result<bool, HostError>;
}

impl<T: HostIntrospection + ?Sized> HostIntrospection for &T {
    fn physical_function(&self, vf_pci: &str) -> Result<String, HostError> {
        (**self).physical_function(vf_pci)
    }

    fn vf_index(&self, vf_pci: &str, pf_name: &str) -> Result<u32, HostError> {
        (**self).vf_index(vf_pci, pf_name)
    }

    fn interface_names(&self, vf_pci: &str) -> Result<String, HostError> {
        (**self).interface_names(vf_pci)
    }

    fn has_bypass_driver(&self, vf_pci: &str) -> Result<bool, HostError> {
        (**self).has_bypass_driver(vf_pci)
    }
}

impl<T: HostIntrospection + ?Sized> HostIntrospection for Box<T> {
    fn physical_function(&self, vf_pci: &str) -> Result<String, HostError> {
        (**self).physical_function(vf_pci)
    }

    fn vf_index(&self, vf_pci: &str, pf_name: &str) -> Result<u32, HostError> {
        (**self).vf_index(vf_pci, pf_name)
    }

    fn interface_names(&self, vf_pci: &str) -> Result<String, HostError> {
        (**self).interface_names(vf_pci)
    }

    fn has_bypass_driver(&self, vf_pci: &str) -> Result<bool, HostError> {
        (**self).has_bypass_driver(vf_pci)
    }
}

impl<T: HostIntrospection + ?Sized> HostIntrospection for Arc<T> {
    fn physical_function(&self, vf_pci: &str) -> Result<String, HostError> {
        (**self).physical_function(vf_pci)
    }

    fn vf_index(&self, vf_pci: &str, pf_name: &str) -> Result<u32, HostError> {
        (**self).vf_index(vf_pci, pf_name)
    }

    fn interface_names(&self, vf_pci: &str) -> Result<String, HostError> {
        (**self).interface_names(vf_pci)
    }

    fn has_bypass_driver(&self, vf_pci: &str) -> Result<bool, HostError> {
        (**self).has_bypass_driver(vf_pci)
    }
}
