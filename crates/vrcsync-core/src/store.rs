// ── Facility store ──
//
// Latest known snapshot per facility. The poller uses it as its diff
// baseline; consumers read it and can watch the version counter to learn
// when anything was replaced.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Facility, FacilityDescription, Snapshot};

pub struct FacilityStore {
    by_serial: DashMap<String, Facility>,
    /// Bumped on every mutation.
    version: watch::Sender<u64>,
}

impl Default for FacilityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FacilityStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            by_serial: DashMap::new(),
            version,
        }
    }

    /// Insert or replace a facility. Returns the snapshot it replaced.
    pub(crate) fn upsert(&self, facility: Facility) -> Option<Arc<Snapshot>> {
        let previous = self
            .by_serial
            .insert(facility.description.serial_number.clone(), facility)
            .map(|old| old.snapshot);
        self.version.send_modify(|v| *v += 1);
        previous
    }

    pub fn get(&self, serial: &str) -> Option<Facility> {
        self.by_serial.get(serial).map(|f| f.value().clone())
    }

    pub fn snapshot(&self, serial: &str) -> Option<Arc<Snapshot>> {
        self.by_serial.get(serial).map(|f| Arc::clone(&f.snapshot))
    }

    pub fn contains(&self, serial: &str) -> bool {
        self.by_serial.contains_key(serial)
    }

    /// Descriptions of every stored facility, sorted by serial.
    pub fn descriptions(&self) -> Vec<FacilityDescription> {
        let mut all: Vec<FacilityDescription> = self
            .by_serial
            .iter()
            .map(|f| f.description.clone())
            .collect();
        all.sort_by(|a, b| a.serial_number.cmp(&b.serial_number));
        all
    }

    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }

    pub fn subscribe_version(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::SnapshotMeta;

    fn facility(serial: &str, marker: i64) -> Facility {
        Facility {
            description: FacilityDescription {
                serial_number: serial.into(),
                name: "Home".into(),
                firmware_version: None,
                gateway_type: None,
            },
            snapshot: Arc::new(Snapshot::new(
                json!({ "marker": marker }),
                json!({}),
                json!({}),
                json!({}),
                SnapshotMeta::default(),
            )),
        }
    }

    #[test]
    fn upsert_returns_replaced_snapshot() {
        let store = FacilityStore::new();
        assert!(store.upsert(facility("SN1", 1)).is_none());

        let previous = store.upsert(facility("SN1", 2));
        assert_eq!(previous.map(|s| s.tree()["system"]["marker"].clone()), Some(json!(1)));
        assert_eq!(store.len(), 1);
        assert_eq!(*store.subscribe_version().borrow(), 2);
    }

    #[test]
    fn descriptions_are_sorted() {
        let store = FacilityStore::new();
        store.upsert(facility("SN2", 0));
        store.upsert(facility("SN1", 0));
        let serials: Vec<_> = store
            .descriptions()
            .into_iter()
            .map(|d| d.serial_number)
            .collect();
        assert_eq!(serials, vec!["SN1", "SN2"]);
    }
}
