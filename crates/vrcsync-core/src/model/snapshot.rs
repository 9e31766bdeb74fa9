// ── Facility snapshot ──
//
// One immutable, normalized view of a facility's state, assembled from four
// reads. Shared as `Arc<Snapshot>` between the poller baseline, discovery
// events and API consumers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path::FieldPath;

/// Freshness information derived from the upstream `resourceState` blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Some resource has not been synchronized with the gateway yet.
    pub pending: bool,
    /// Most recent resource timestamp, epoch milliseconds.
    pub timestamp: i64,
    /// Milliseconds between `timestamp` and the moment of aggregation.
    pub age: i64,
    pub stale: bool,
    /// Gateway in sync with the cloud (`!pending`).
    pub gateway: bool,
    /// Cloud data is fresh (`!stale`).
    pub cloud: bool,
}

impl SnapshotMeta {
    pub fn new(pending: bool, timestamp: i64, age: i64, stale: bool) -> Self {
        Self {
            pending,
            timestamp,
            age,
            stale,
            gateway: !pending,
            cloud: !stale,
        }
    }
}

/// Normalized tree `{system, measures, status, gateway, meta}`.
///
/// `system.zones` and `system.dhw` are objects keyed by `_id`. Every DHW
/// unit's `configuration` maps temperature report ids to reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    tree: Value,
    meta: SnapshotMeta,
}

impl Snapshot {
    /// Assemble a snapshot from already-normalized parts.
    pub fn new(system: Value, measures: Value, status: Value, gateway: Value, meta: SnapshotMeta) -> Self {
        let mut root = Map::new();
        root.insert("system".into(), system);
        root.insert("measures".into(), measures);
        root.insert("status".into(), status);
        root.insert("gateway".into(), gateway);
        root.insert(
            "meta".into(),
            serde_json::to_value(meta).unwrap_or(Value::Null),
        );
        Self {
            tree: Value::Object(root),
            meta,
        }
    }

    /// The whole tree, including `meta`.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.tree)
    }

    /// Zone ids in key order.
    pub fn zone_ids(&self) -> Vec<&str> {
        self.keys_under("zones")
    }

    /// DHW unit ids in key order.
    pub fn dhw_ids(&self) -> Vec<&str> {
        self.keys_under("dhw")
    }

    pub fn zone(&self, id: &str) -> Option<&Value> {
        self.tree.get("system")?.get("zones")?.get(id)
    }

    pub fn dhw(&self, id: &str) -> Option<&Value> {
        self.tree.get("system")?.get("dhw")?.get(id)
    }

    /// Gateway model as reported by the public gateway endpoint.
    pub fn gateway_type(&self) -> Option<&str> {
        self.tree.get("gateway")?.get("gatewayType")?.as_str()
    }

    fn keys_under(&self, section: &str) -> Vec<&str> {
        self.tree
            .get("system")
            .and_then(|s| s.get(section))
            .and_then(Value::as_object)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Snapshot {
        Snapshot::new(
            json!({
                "zones": { "Z1": { "_id": "Z1" }, "Z2": { "_id": "Z2" } },
                "dhw": { "DHW1": { "_id": "DHW1", "configuration": {} } }
            }),
            json!({ "devices": [] }),
            json!({ "online": "ONLINE" }),
            json!({ "gatewayType": "VR920" }),
            SnapshotMeta::new(true, 1_700_000_000_000, 5_000, false),
        )
    }

    #[test]
    fn meta_derives_gateway_and_cloud_flags() {
        let meta = SnapshotMeta::new(true, 0, 700_000, true);
        assert!(!meta.gateway);
        assert!(!meta.cloud);

        let meta = SnapshotMeta::new(false, 0, 0, false);
        assert!(meta.gateway);
        assert!(meta.cloud);
    }

    #[test]
    fn meta_is_addressable_in_the_tree() {
        let snap = sample();
        assert_eq!(
            snap.get(&FieldPath::parse("meta.pending").unwrap()),
            Some(&json!(true))
        );
        assert_eq!(
            snap.get(&FieldPath::parse("meta.gateway").unwrap()),
            Some(&json!(false))
        );
    }

    #[test]
    fn accessors_read_indexed_sections() {
        let snap = sample();
        assert_eq!(snap.zone_ids(), vec!["Z1", "Z2"]);
        assert_eq!(snap.dhw_ids(), vec!["DHW1"]);
        assert!(snap.zone("Z2").is_some());
        assert!(snap.dhw("nope").is_none());
        assert_eq!(snap.gateway_type(), Some("VR920"));
    }
}
