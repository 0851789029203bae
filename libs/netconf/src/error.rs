//! Error types for VF config resolution and caching.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a host-introspection collaborator.
#[derive(Debug, Error)]
pub enum HostError {
    /// The VF address is not a well-formed PCI address.
    #[error("invalid PCI address: {0}")]
    InvalidAddress(String),

    /// The queried object does not exist on this host.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading host state failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HostError {
    /// Wrap an I/O failure with the path that was being read.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors produced while turning raw netconf into a [`crate::VfNetConf`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Raw input is not a structurally valid netconf object.
    #[error("failed to load netconf: {0}")]
    MalformedInput(#[source] serde_json::Error),

    /// A mandatory field is absent or empty.
    #[error("{field} is required")]
    MissingRequiredField { field: &'static str },

    /// The PF or the VF index could not be determined for the device.
    #[error("failed to get VF information for {device_id}")]
    DeviceResolutionFailed {
        device_id: String,
        #[source]
        source: HostError,
    },

    /// The bound driver of the VF could not be determined.
    #[error("failed to detect if VF {device_id} has a kernel-bypass driver")]
    DriverDetectionFailed {
        device_id: String,
        #[source]
        source: HostError,
    },

    /// The VF is neither a kernel netdev nor bound to a bypass driver.
    #[error("VF {device_id} has neither an interface name nor a kernel-bypass driver")]
    UnresolvedDeviceMode { device_id: String },

    /// VLAN ID outside 0-4094.
    #[error("vlan id {vlan} invalid: value must be in the range 0-4094")]
    InvalidVlanRange { vlan: i64 },

    /// VLAN QoS set without a VLAN ID.
    #[error("non-zero vlan id must be configured to set vlan QoS {qos}")]
    VlanQosWithoutVlan { qos: i64 },

    /// VLAN QoS outside 0-7.
    #[error("vlan QoS PCP {qos} invalid: value must be in the range 0-7")]
    InvalidVlanQosRange { qos: i64 },
}

impl ResolveError {
    /// Stable machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ResolveError::MalformedInput(_) => "malformed_input",
            ResolveError::MissingRequiredField { .. } => "missing_required_field",
            ResolveError::DeviceResolutionFailed { .. } => "device_resolution_failed",
            ResolveError::DriverDetectionFailed { .. } => "driver_detection_failed",
            ResolveError::UnresolvedDeviceMode { .. } => "unresolved_device_mode",
            ResolveError::InvalidVlanRange { .. } => "invalid_vlan_range",
            ResolveError::VlanQosWithoutVlan { .. } => "vlan_qos_without_vlan",
            ResolveError::InvalidVlanQosRange { .. } => "invalid_vlan_qos_range",
        }
    }

    /// Returns true if the failure comes from host state rather than caller input.
    pub fn is_host_error(&self) -> bool {
        matches!(
            self,
            ResolveError::DeviceResolutionFailed { .. }
                | ResolveError::DriverDetectionFailed { .. }
                | ResolveError::UnresolvedDeviceMode { .. }
        )
    }
}

/// Errors produced by [`crate::ConfigCache`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// Writing or removing the cache entry failed.
    #[error("failed to persist netconf to {address}")]
    PersistenceFailed {
        address: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry is absent or could not be read.
    #[error("error reading cached netconf in {address}")]
    CacheMissOrReadError {
        address: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry was read but is not a well-formed record.
    #[error("failed to parse cached netconf in {address}")]
    CorruptedCacheEntry {
        address: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CacheError {
    /// Stable machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            CacheError::PersistenceFailed { .. } => "persistence_failed",
            CacheError::CacheMissOrReadError { .. } => "cache_miss_or_read_error",
            CacheError::CorruptedCacheEntry { .. } => "corrupted_cache_entry",
        }
    }

    /// Storage address the failed operation targeted.
    pub fn address(&self) -> &std::path::Path {
        match self {
            CacheError::PersistenceFailed { address, .. }
            | CacheError::CacheMissOrReadError { address, .. }
            | CacheError::CorruptedCacheEntry { address, .. } => address,
        }
    }
}

/// Errors building a [`crate::CacheKey`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// A key component is empty.
    #[error("{component} cannot be empty")]
    Empty { component: &'static str },

    /// A key component would escape or alias the cache directory.
    #[error("{component} '{value}' is not a valid path component")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },

    /// The container ID contains the key separator, making the key ambiguous.
    #[error("container id '{0}' must not contain '-'")]
    AmbiguousContainerId(String),
}

impl KeyError {
    /// Stable machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::Empty { .. } => "empty_key_component",
            KeyError::InvalidComponent { .. } => "invalid_key_component",
            KeyError::AmbiguousContainerId(_) => "ambiguous_container_id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_distinct() {
        let errors = [
            ResolveError::MissingRequiredField { field: "deviceID" },
            ResolveError::UnresolvedDeviceMode {
                device_id: "0000:af:06.0".to_string(),
            },
            ResolveError::InvalidVlanRange { vlan: 4095 },
            ResolveError::VlanQosWithoutVlan { qos: 5 },
            ResolveError::InvalidVlanQosRange { qos: 8 },
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.reason_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_host_error_classification() {
        let unresolved = ResolveError::UnresolvedDeviceMode {
            device_id: "0000:af:06.0".to_string(),
        };
        assert!(unresolved.is_host_error());
        assert!(!ResolveError::InvalidVlanRange { vlan: -1 }.is_host_error());
    }

    #[test]
    fn test_cause_is_preserved() {
        use std::error::Error as _;

        let err = ResolveError::DeviceResolutionFailed {
            device_id: "0000:af:06.0".to_string(),
            source: HostError::NotFound("physfn".to_string()),
        };

        let cause = err.source().expect("source");
        assert_eq!(cause.to_string(), "not found: physfn");
    }

    #[test]
    fn test_cache_error_message_names_address() {
        let err = CacheError::CacheMissOrReadError {
            address: PathBuf::from("/var/lib/cni/sriov/abc-net1"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/var/lib/cni/sriov/abc-net1"));
        assert_eq!(err.reason_code(), "cache_miss_or_read_error");
    }

    #[test]
    fn test_key_error_reason_codes() {
        assert_eq!(
            KeyError::AmbiguousContainerId("a-b".to_string()).reason_code(),
            "ambiguous_container_id"
        );
        assert_eq!(
            KeyError::Empty { component: "ifname" }.reason_code(),
            "empty_key_component"
        );
    }
}
