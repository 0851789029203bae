//! Attach-time config resolution.
//!
//! Turns raw netconf plus live host state into a [`VfNetConf`] that satisfies
//! every record invariant, or fails with the first violated rule.
//!
//! Resolution order:
//! 1. Parse raw input
//! 2. Require `deviceID`
//! 3. Look up PF name and VF index together
//! 4. Probe for a kernel netdev; only if that is inconclusive, probe the driver
//! 5. Reject VFs in neither mode
//! 6. Validate VLAN ID, QoS dependency, QoS range (in that order)

use tracing::{debug, info, warn};

use crate::error::{HostError, ResolveError};
use crate::host::HostIntrospection;
use crate::types::{validate_vlan, NetConfInput, VfNetConf, DERIVED_KEYS};

/// Resolves raw netconf against a host.
#[derive(Debug, Clone)]
pub struct ConfigResolver<H> {
    host: H,
}

impl<H: HostIntrospection> ConfigResolver<H> {
    /// Create a resolver backed by `host`.
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Get the host collaborator.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Parse and resolve raw netconf bytes.
    pub fn resolve(&self, raw: &[u8]) -> Result<VfNetConf, ResolveError> {
        let input = NetConfInput::from_slice(raw)?;
        self.resolve_input(input)
    }

    /// Resolve already-parsed netconf.
    pub fn resolve_input(&self, input: NetConfInput) -> Result<VfNetConf, ResolveError> {
        let NetConfInput {
            device_id,
            vlan,
            vlan_qos,
            mut extra,
        } = input;

        let device_id = match device_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return Err(ResolveError::MissingRequiredField { field: "deviceID" }),
        };

        let (pf_name, vf_index) = self.vf_info(&device_id).map_err(|source| {
            ResolveError::DeviceResolutionFailed {
                device_id: device_id.clone(),
                source,
            }
        })?;

        let (host_if_names, kernel_bypass) = self.device_mode(&device_id)?;

        if host_if_names.is_empty() && !kernel_bypass {
            return Err(ResolveError::UnresolvedDeviceMode { device_id });
        }

        let (vlan, vlan_qos) = validate_vlan(vlan, vlan_qos)?;

        for key in DERIVED_KEYS {
            if extra.remove(key).is_some() {
                debug!(device_id = %device_id, key, "Ignoring caller-supplied derived field");
            }
        }

        info!(
            device_id = %device_id,
            pf = %pf_name,
            vf_index,
            host_if_names = %host_if_names,
            kernel_bypass,
            vlan,
            vlan_qos,
            "Resolved VF netconf"
        );

        Ok(VfNetConf {
            device_id,
            pf_name,
            vf_index,
            host_if_names,
            kernel_bypass,
            vlan,
            vlan_qos,
            extra,
        })
    }

    /// Look up the owning PF and the VF index with one PF answer.
    fn vf_info(&self, device_id: &str) -> Result<(String, u32), HostError> {
        let pf_name = self.host.physical_function(device_id)?;
        let vf_index = self.host.vf_index(device_id, &pf_name)?;

        debug!(device_id = %device_id, pf = %pf_name, vf_index, "Found VF information");

        Ok((pf_name, vf_index))
    }

    /// Decide between kernel netdev and kernel-bypass mode.
    ///
    /// A failed netdev probe and an empty answer are treated the same way:
    /// both fall through to the driver probe.
    fn device_mode(&self, device_id: &str) -> Result<(String, bool), ResolveError> {
        match self.host.interface_names(device_id) {
            Ok(names) if !names.trim().is_empty() => {
                debug!(device_id = %device_id, names = %names.trim(), "VF has kernel netdev");
                return Ok((names.trim().to_string(), false));
            }
            Ok(_) => {
                debug!(device_id = %device_id, "VF has no kernel netdev");
            }
            Err(e) => {
                warn!(
                    device_id = %device_id,
                    error = %e,
                    "Failed to read VF netdev names, checking driver"
                );
            }
        }

        let kernel_bypass = self.host.has_bypass_driver(device_id).map_err(|source| {
            ResolveError::DriverDetectionFailed {
                device_id: device_id.to_string(),
                source,
            }
        })?;

        debug!(device_id = %device_id, kernel_bypass, "Checked VF driver");

        Ok((String::new(), kernel_bypass))
    }
}
