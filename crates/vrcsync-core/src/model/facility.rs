// ── Facility ──

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::snapshot::Snapshot;

/// Entry of the account's facility list.
///
/// Deserializes from the upstream camelCase shape; serializes snake_case
/// for CLI output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityDescription {
    #[serde(alias = "facilitySerialNumber")]
    pub serial_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "firmwareVersion")]
    pub firmware_version: Option<String>,
    /// Filled in from the gateway read once a snapshot exists.
    #[serde(default, alias = "gatewayType")]
    pub gateway_type: Option<String>,
}

impl FacilityDescription {
    /// Copy the gateway type of `snapshot` into the description.
    pub fn with_snapshot_details(mut self, snapshot: &Snapshot) -> Self {
        if let Some(gateway) = snapshot.gateway_type() {
            self.gateway_type = Some(gateway.to_owned());
        }
        self
    }
}

/// A facility together with its latest snapshot.
#[derive(Debug, Clone)]
pub struct Facility {
    pub description: FacilityDescription,
    pub snapshot: Arc<Snapshot>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_upstream_facility_entry() {
        let desc: FacilityDescription = serde_json::from_value(json!({
            "facilitySerialNumber": "21201900202609620938006184N5",
            "name": "Home",
            "firmwareVersion": "357.45.2",
            "responsibleCountryCode": "DE"
        }))
        .unwrap();

        assert_eq!(desc.serial_number, "21201900202609620938006184N5");
        assert_eq!(desc.name, "Home");
        assert_eq!(desc.firmware_version.as_deref(), Some("357.45.2"));
        assert_eq!(desc.gateway_type, None);
    }
}
