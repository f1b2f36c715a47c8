//! Wire shape of entries in a `GET_DEVICES` reply.

use serde::{Deserialize, Serialize};

/// `deviceTypeName` value marking an air-conditioner entry.
pub const DEVICE_TYPE_AC: &str = "A/C";

/// One device entry as returned by `GET_DEVICES`.
///
/// The reply carries many more fields (provider ids, geolocation, icon
/// metadata); only the ones the client consumes are modeled here and
/// unknown fields are ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub regdate: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(rename = "sn", default)]
    pub serial_number: Option<String>,
    #[serde(rename = "manufactor", default)]
    pub manufacturer: Option<String>,
    #[serde(rename = "deviceTypeName")]
    pub device_type_name: String,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(rename = "deviceToken", default)]
    pub token: Option<String>,
}

impl DeviceEntry {
    /// Whether this entry is an air-conditioner unit.
    ///
    /// The account may also carry other appliance types which the client
    /// discards during discovery.
    pub fn is_air_conditioner(&self) -> bool {
        self.device_type_name == DEVICE_TYPE_AC
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_device_entry_with_renamed_fields() {
        let entry: DeviceEntry = serde_json::from_value(json!({
            "id": 9999,
            "name": "Living room",
            "regdate": "2021-03-31T21:12:39",
            "model": "EMD-AI",
            "mac": "aa:bb:cc:dd:ee:ff",
            "sn": "SN123",
            "manufactor": "Midea",
            "deviceTypeName": "A/C",
            "status": 1,
            "deviceToken": "devtok",
            "providerName": null,
            "permissions": 15
        }))
        .unwrap();

        assert_eq!(entry.id, 9999);
        assert_eq!(entry.serial_number.as_deref(), Some("SN123"));
        assert_eq!(entry.manufacturer.as_deref(), Some("Midea"));
        assert_eq!(entry.token.as_deref(), Some("devtok"));
        assert!(entry.is_air_conditioner());
    }

    #[test]
    fn other_appliance_types_are_not_air_conditioners() {
        let entry: DeviceEntry = serde_json::from_value(json!({
            "id": 1,
            "name": "Boiler",
            "deviceTypeName": "Water heater"
        }))
        .unwrap();
        assert!(!entry.is_air_conditioner());
    }
}
