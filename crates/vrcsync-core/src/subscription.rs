// ── Subscription registry ──
//
// Dispatch table keyed by (facility serial, field path). Observers are
// called in registration order; the table lock is released before any
// observer runs, so observers may subscribe or unsubscribe themselves.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::trace;

use crate::diff::FieldChange;
use crate::model::FieldPath;

/// Callback invoked with every change of a subscribed path.
pub type Observer = Arc<dyn Fn(&FieldChange) + Send + Sync>;

type Key = (String, FieldPath);

/// Returned by [`SubscriptionRegistry::subscribe`]; pass it back to
/// unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    serial: String,
    path: FieldPath,
}

impl SubscriptionHandle {
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: DashMap<Key, Vec<(u64, Observer)>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, serial: &str, path: FieldPath, observer: F) -> SubscriptionHandle
    where
        F: Fn(&FieldChange) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .entry((serial.to_owned(), path.clone()))
            .or_default()
            .push((id, Arc::new(observer)));
        trace!(serial, %path, id, "subscribed");
        SubscriptionHandle {
            id,
            serial: serial.to_owned(),
            path,
        }
    }

    /// Channel flavour of [`subscribe`](Self::subscribe): every change is
    /// sent to the returned receiver. Dropping the receiver silences the
    /// subscription but does not remove it.
    pub fn subscribe_channel(
        &self,
        serial: &str,
        path: FieldPath,
    ) -> (SubscriptionHandle, mpsc::UnboundedReceiver<FieldChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.subscribe(serial, path, move |change| {
            let _ = tx.send(change.clone());
        });
        (handle, rx)
    }

    /// Remove one observer. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let key = (handle.serial.clone(), handle.path.clone());
        let Some(mut observers) = self.entries.get_mut(&key) else {
            return false;
        };
        let before = observers.len();
        observers.retain(|(id, _)| *id != handle.id);
        let removed = observers.len() != before;
        drop(observers);

        self.entries.remove_if(&key, |_, observers| observers.is_empty());
        removed
    }

    /// Call every observer of `(serial, path)` with `change`.
    ///
    /// Returns how many observers ran; unknown pairs are a no-op.
    pub fn dispatch(&self, serial: &str, path: &FieldPath, change: &FieldChange) -> usize {
        let observers: Vec<Observer> = match self.entries.get(&(serial.to_owned(), path.clone())) {
            Some(entry) => entry.iter().map(|(_, obs)| Arc::clone(obs)).collect(),
            None => return 0,
        };
        for observer in &observers {
            observer(change);
        }
        observers.len()
    }

    /// Paths with at least one observer for `serial`, sorted.
    pub fn paths(&self, serial: &str) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = self
            .entries
            .iter()
            .filter(|entry| entry.key().0 == serial)
            .map(|entry| entry.key().1.clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    fn change(prev: f64, cur: f64) -> FieldChange {
        FieldChange {
            previous: Some(json!(prev)),
            current: Some(json!(cur)),
        }
    }

    #[test]
    fn observers_run_in_registration_order() {
        let registry = SubscriptionRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let path = FieldPath::zone_setpoint("Z1");

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            registry.subscribe("SN1", path.clone(), move |_| seen.lock().unwrap().push(tag));
        }

        assert_eq!(registry.dispatch("SN1", &path, &change(20.0, 21.5)), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn dispatch_matches_exact_serial_and_path() {
        let registry = SubscriptionRegistry::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        registry.subscribe("SN1", FieldPath::zone_setpoint("Z1"), move |_| {
            *counter.lock().unwrap() += 1;
        });

        let c = change(1.0, 2.0);
        assert_eq!(registry.dispatch("SN2", &FieldPath::zone_setpoint("Z1"), &c), 0);
        assert_eq!(registry.dispatch("SN1", &FieldPath::zone_setback("Z1"), &c), 0);
        assert_eq!(
            registry.dispatch("SN1", &FieldPath::parse("system.zones.Z1").unwrap(), &c),
            0
        );
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn unsubscribe_removes_only_that_observer() {
        let registry = SubscriptionRegistry::new();
        let path = FieldPath::dhw_mode("DHW1");
        let a = registry.subscribe("SN1", path.clone(), |_| {});
        let _b = registry.subscribe("SN1", path.clone(), |_| {});

        assert!(registry.unsubscribe(&a));
        assert!(!registry.unsubscribe(&a));
        assert_eq!(registry.dispatch("SN1", &path, &change(0.0, 1.0)), 1);
        assert_eq!(registry.paths("SN1"), vec![path]);
    }

    #[test]
    fn last_unsubscribe_drops_the_path() {
        let registry = SubscriptionRegistry::new();
        let handle = registry.subscribe("SN1", FieldPath::outside_temperature(), |_| {});
        registry.unsubscribe(&handle);
        assert!(registry.paths("SN1").is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn channel_subscription_receives_changes() {
        let registry = SubscriptionRegistry::new();
        let path = FieldPath::zone_mode("Z1");
        let (_handle, mut rx) = registry.subscribe_channel("SN1", path.clone());

        let c = FieldChange {
            previous: Some(json!("AUTO")),
            current: Some(json!("OFF")),
        };
        registry.dispatch("SN1", &path, &c);
        assert_eq!(rx.recv().await.unwrap(), c);
    }
}
