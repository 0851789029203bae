//! Netconf data model.
//!
//! [`NetConfInput`] is what the container runtime hands us; [`VfNetConf`] is
//! the resolved record that is validated, cached at attach time and read back
//! at detach time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ResolveError;

/// Highest VLAN ID the hardware accepts (12-bit tag, 4095 reserved).
pub const MAX_VLAN_ID: i64 = 4094;

/// Highest 802.1p priority code point (3 bits).
pub const MAX_VLAN_QOS: i64 = 7;

/// Keys that are always derived from host state and never taken from input.
pub const DERIVED_KEYS: [&str; 4] = ["master", "vfID", "hostIFNames", "dpdkMode"];

/// Raw netconf after structural parsing, before any host lookup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NetConfInput {
    /// PCI address of the VF (e.g. `0000:af:06.0`).
    #[serde(rename = "deviceID", default)]
    pub device_id: Option<String>,

    /// VLAN ID. Signed so negative input is reported as a range error.
    #[serde(default)]
    pub vlan: i64,

    /// VLAN priority code point.
    #[serde(rename = "vlanQoS", default)]
    pub vlan_qos: i64,

    /// Every other top-level field, passed through opaquely.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetConfInput {
    /// Parse raw netconf bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResolveError> {
        serde_json::from_slice(bytes).map_err(ResolveError::MalformedInput)
    }

    /// Create input for a device with no VLAN settings.
    pub fn for_device(device_id: &str) -> Self {
        Self {
            device_id: Some(device_id.to_string()),
            ..Default::default()
        }
    }

    /// Set VLAN ID and QoS.
    pub fn with_vlan(mut self, vlan: i64, vlan_qos: i64) -> Self {
        self.vlan = vlan;
        self.vlan_qos = vlan_qos;
        self
    }
}

/// Fully resolved VF attachment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VfNetConf {
    /// PCI address of the VF.
    #[serde(rename = "deviceID")]
    pub device_id: String,

    /// Netdev name of the owning PF.
    #[serde(rename = "master")]
    pub pf_name: String,

    /// Index of the VF in its PF's VF table.
    #[serde(rename = "vfID")]
    pub vf_index: u32,

    /// Kernel interface name(s) of the VF, comma separated. Empty in bypass mode.
    #[serde(rename = "hostIFNames", default)]
    pub host_if_names: String,

    /// VF is bound to a kernel-bypass (userspace polling) driver.
    #[serde(rename = "dpdkMode", default)]
    pub kernel_bypass: bool,

    /// VLAN ID (0 = untagged).
    #[serde(default)]
    pub vlan: u16,

    /// VLAN priority code point.
    #[serde(rename = "vlanQoS", default)]
    pub vlan_qos: u8,

    /// Pass-through fields from the raw netconf.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VfNetConf {
    /// Returns true if the VF is visible as a kernel network device.
    pub fn is_kernel_netdev(&self) -> bool {
        !self.host_if_names.is_empty()
    }

    /// Iterate the host interface names.
    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.host_if_names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Check the record invariants.
    ///
    /// Exactly one of "has interface names" and "bypass mode" must hold, and
    /// the VLAN settings must pass [`validate_vlan`].
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.is_kernel_netdev() == self.kernel_bypass {
            return Err(ResolveError::UnresolvedDeviceMode {
                device_id: self.device_id.clone(),
            });
        }
        validate_vlan(i64::from(self.vlan), i64::from(self.vlan_qos))?;
        Ok(())
    }
}

/// Validate VLAN ID and QoS, returning them narrowed to their hardware widths.
///
/// Checks run in a fixed order so the reported error is deterministic:
/// VLAN ID range, then QoS-needs-VLAN, then QoS range.
pub fn validate_vlan(vlan: i64, vlan_qos: i64) -> Result<(u16, u8), ResolveError> {
    if !(0..=MAX_VLAN_ID).contains(&vlan) {
        return Err(ResolveError::InvalidVlanRange { vlan });
    }

    if vlan == 0 && vlan_qos != 0 {
        return Err(ResolveError::VlanQosWithoutVlan { qos: vlan_qos });
    }

    if !(0..=MAX_VLAN_QOS).contains(&vlan_qos) {
        return Err(ResolveError::InvalidVlanQosRange { qos: vlan_qos });
    }

    // Both ranges fit; the casts cannot truncate.
    Ok((vlan as u16, vlan_qos as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn netdev_record() -> VfNetConf {
        VfNetConf {
            device_id: "0000:af:06.0".to_string(),
            pf_name: "enp175s0f0".to_string(),
            vf_index: 4,
            host_if_names: "eth4".to_string(),
            kernel_bypass: false,
            vlan: 100,
            vlan_qos: 3,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_input_defaults() {
        let input = NetConfInput::from_slice(br#"{"deviceID": "0000:af:06.0"}"#).unwrap();
        assert_eq!(input.device_id.as_deref(), Some("0000:af:06.0"));
        assert_eq!(input.vlan, 0);
        assert_eq!(input.vlan_qos, 0);
        assert!(input.extra.is_empty());
    }

    #[test]
    fn test_input_keeps_unknown_fields() {
        let input = NetConfInput::from_slice(
            br#"{"cniVersion": "1.0.0", "name": "sriov-net", "type": "sriov",
                 "deviceID": "0000:af:06.0", "spoofchk": "on", "ipam": {"type": "host-local"}}"#,
        )
        .unwrap();

        assert_eq!(input.extra.get("cniVersion"), Some(&json!("1.0.0")));
        assert_eq!(input.extra.get("spoofchk"), Some(&json!("on")));
        assert_eq!(input.extra.get("ipam"), Some(&json!({"type": "host-local"})));
        assert!(!input.extra.contains_key("deviceID"));
    }

    #[test]
    fn test_input_negative_vlan_parses() {
        let input = NetConfInput::from_slice(br#"{"vlan": -1, "vlanQoS": -2}"#).unwrap();
        assert_eq!(input.vlan, -1);
        assert_eq!(input.vlan_qos, -2);
    }

    #[rstest]
    #[case::not_json(&b"not json"[..])]
    #[case::array(&br#"["0000:af:06.0"]"#[..])]
    #[case::string_vlan(&br#"{"deviceID": "0000:af:06.0", "vlan": "100"}"#[..])]
    #[case::fractional_qos(&br#"{"deviceID": "0000:af:06.0", "vlanQoS": 1.5}"#[..])]
    fn test_input_malformed(#[case] raw: &[u8]) {
        let err = NetConfInput::from_slice(raw).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedInput(_)));
    }

    #[rstest]
    #[case(0, 0, Ok((0, 0)))]
    #[case(100, 3, Ok((100, 3)))]
    #[case(4094, 7, Ok((4094, 7)))]
    #[case(4095, 0, Err("invalid_vlan_range"))]
    #[case(-1, 0, Err("invalid_vlan_range"))]
    #[case(0, 5, Err("vlan_qos_without_vlan"))]
    #[case(0, 9, Err("vlan_qos_without_vlan"))]
    #[case(100, 8, Err("invalid_vlan_qos_range"))]
    #[case(100, -1, Err("invalid_vlan_qos_range"))]
    #[case(5000, 9, Err("invalid_vlan_range"))]
    fn test_validate_vlan(
        #[case] vlan: i64,
        #[case] qos: i64,
        #[case] expected: Result<(u16, u8), &str>,
    ) {
        let result = validate_vlan(vlan, qos).map_err(|e| e.reason_code());
        assert_eq!(result, expected);
    }

    #[test]
    fn test_record_json_tags() {
        let value = serde_json::to_value(netdev_record()).unwrap();
        assert_eq!(
            value,
            json!({
                "deviceID": "0000:af:06.0",
                "master": "enp175s0f0",
                "vfID": 4,
                "hostIFNames": "eth4",
                "dpdkMode": false,
                "vlan": 100,
                "vlanQoS": 3,
            })
        );
    }

    #[test]
    fn test_record_ignores_unknown_fields_on_read() {
        let record: VfNetConf = serde_json::from_value(json!({
            "deviceID": "0000:af:06.0",
            "master": "enp175s0f0",
            "vfID": 2,
            "dpdkMode": true,
            "futureField": {"nested": [1, 2, 3]},
        }))
        .unwrap();

        assert!(record.kernel_bypass);
        assert_eq!(record.host_if_names, "");
        assert_eq!(record.vlan, 0);
        assert_eq!(record.extra.get("futureField"), Some(&json!({"nested": [1, 2, 3]})));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_both_modes() {
        let mut record = netdev_record();
        record.kernel_bypass = true;
        assert!(matches!(
            record.validate(),
            Err(ResolveError::UnresolvedDeviceMode { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_neither_mode() {
        let mut record = netdev_record();
        record.host_if_names.clear();
        assert!(matches!(
            record.validate(),
            Err(ResolveError::UnresolvedDeviceMode { .. })
        ));
    }

    #[test]
    fn test_interface_names_split() {
        let mut record = netdev_record();
        record.host_if_names = "eth4,eth5".to_string();
        assert_eq!(record.interface_names().collect::<Vec<_>>(), ["eth4", "eth5"]);
    }
}
