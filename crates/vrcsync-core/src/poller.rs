// ── Poller ──
//
// Fixed-interval loop that refreshes every facility, diffs each new
// snapshot against the stored baseline and hands the differences to the
// subscription registry. Cancellation is only observed between cycles, so
// a cycle that has started always runs to completion. `Stopped` is
// terminal: a cycle that was waiting for its turn when the poller stopped
// never runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::SnapshotAggregator;
use crate::diff::diff_snapshots;
use crate::error::CoreError;
use crate::model::{Facility, FacilityDescription, Snapshot};
use crate::store::FacilityStore;
use crate::subscription::SubscriptionRegistry;

const EVENT_CHANNEL_SIZE: usize = 256;

/// Where the poll loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PollerState {
    /// Waiting for the next tick (or not started yet).
    Idle,
    /// A tick has begun.
    Running,
    Fetching,
    Diffing,
    /// Shut down; terminal.
    Stopped,
}

/// Per-cycle statistics carried by [`SyncEvent::CycleComplete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// 1-based cycle counter.
    pub cycle: u64,
    pub facilities: usize,
    pub discovered: usize,
    /// Leaf paths that changed, across all facilities.
    pub changes: usize,
    /// Observer invocations triggered by those changes.
    pub dispatched: usize,
    pub failed: usize,
}

/// Lifecycle notifications, delivered over a broadcast channel.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// First successful snapshot of a facility.
    FacilityDiscovered {
        description: FacilityDescription,
        snapshot: Arc<Snapshot>,
    },
    CycleComplete(CycleSummary),
}

/// Cheaply cloneable handle to the poll loop.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    aggregator: SnapshotAggregator,
    registry: Arc<SubscriptionRegistry>,
    store: Arc<FacilityStore>,
    interval: Duration,
    concurrency: usize,
    /// Facility list from the last successful refresh.
    known: Mutex<Vec<FacilityDescription>>,
    state: watch::Sender<PollerState>,
    events: broadcast::Sender<SyncEvent>,
    /// Serializes cycles between the timer task and manual refreshes.
    cycle_lock: Mutex<()>,
    cycles: AtomicU64,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl Poller {
    pub fn new(
        aggregator: SnapshotAggregator,
        registry: Arc<SubscriptionRegistry>,
        store: Arc<FacilityStore>,
        interval: Duration,
        concurrency: usize,
    ) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(PollerInner {
                aggregator,
                registry,
                store,
                interval,
                concurrency: concurrency.max(1),
                known: Mutex::new(Vec::new()),
                state,
                events,
                cycle_lock: Mutex::new(()),
                cycles: AtomicU64::new(0),
                task: Mutex::new(None),
            }),
        }
    }

    /// Start the loop: one cycle now, then one per interval.
    ///
    /// Returns `false` if the loop is already running or was stopped.
    pub async fn start(&self) -> bool {
        let mut task = self.inner.task.lock().await;
        if task.is_some() || self.state() == PollerState::Stopped {
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(Arc::clone(&self.inner), cancel.clone()));
        *task = Some((cancel, handle));
        info!(interval_secs = self.inner.interval.as_secs(), "poller started");
        true
    }

    /// Suppress further cycles. A cycle already in progress finishes
    /// before this returns.
    pub async fn stop(&self) {
        let running = self.inner.task.lock().await.take();
        if let Some((cancel, handle)) = running {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "poll task ended abnormally");
            }
        }
        // Wait out a manual refresh that may still be running.
        let _guard = self.inner.cycle_lock.lock().await;
        self.inner.state.send_replace(PollerState::Stopped);
        info!("poller stopped");
    }

    /// Run one cycle right away, outside the timer.
    pub async fn poll_once(&self) -> Result<CycleSummary, CoreError> {
        if self.state() == PollerState::Stopped {
            return Err(CoreError::ShutDown);
        }
        self.inner.run_cycle().await
    }

    pub fn state(&self) -> PollerState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<PollerState> {
        self.inner.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Facility list from the most recent successful refresh.
    pub async fn known_facilities(&self) -> Vec<FacilityDescription> {
        self.inner.known.lock().await.clone()
    }
}

async fn poll_task(inner: Arc<PollerInner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if inner.run_cycle().await.is_err() {
                    break;
                }
            }
        }
    }
}

impl PollerInner {
    async fn run_cycle(&self) -> Result<CycleSummary, CoreError> {
        let _guard = self.cycle_lock.lock().await;
        // `stop` may have run while this cycle waited for the lock.
        if *self.state.borrow() == PollerState::Stopped {
            return Err(CoreError::ShutDown);
        }
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;

        self.set_state(PollerState::Running);
        let facilities = self.refresh_facilities().await;

        self.set_state(PollerState::Fetching);
        let results: Vec<(FacilityDescription, Result<Snapshot, CoreError>)> =
            stream::iter(facilities)
                .map(|description| self.fetch(description))
                .buffered(self.concurrency)
                .collect()
                .await;

        self.set_state(PollerState::Diffing);
        let mut summary = CycleSummary {
            cycle,
            facilities: results.len(),
            ..CycleSummary::default()
        };
        for (description, result) in results {
            match result {
                Ok(snapshot) => self.apply(description, snapshot, &mut summary),
                Err(e) => {
                    warn!(
                        serial = %description.serial_number,
                        error = %e,
                        "snapshot failed, keeping previous baseline"
                    );
                    summary.failed += 1;
                }
            }
        }

        debug!(
            cycle,
            facilities = summary.facilities,
            changes = summary.changes,
            dispatched = summary.dispatched,
            failed = summary.failed,
            "poll cycle complete"
        );
        let _ = self.events.send(SyncEvent::CycleComplete(summary));
        self.set_state(PollerState::Idle);
        Ok(summary)
    }

    async fn refresh_facilities(&self) -> Vec<FacilityDescription> {
        match self.aggregator.list_facilities().await {
            Ok(list) => {
                let mut known = self.known.lock().await;
                known.clone_from(&list);
                list
            }
            Err(e) => {
                warn!(error = %e, "facility list refresh failed, keeping previous list");
                self.known.lock().await.clone()
            }
        }
    }

    async fn fetch(
        &self,
        description: FacilityDescription,
    ) -> (FacilityDescription, Result<Snapshot, CoreError>) {
        let result = self
            .aggregator
            .build_snapshot(&description.serial_number)
            .await;
        (description, result)
    }

    fn apply(&self, description: FacilityDescription, snapshot: Snapshot, summary: &mut CycleSummary) {
        let serial = description.serial_number.clone();
        let description = description.with_snapshot_details(&snapshot);
        let snapshot = Arc::new(snapshot);

        let Some(baseline) = self.store.snapshot(&serial) else {
            info!(serial = %serial, name = %description.name, "facility discovered");
            self.store.upsert(Facility {
                description: description.clone(),
                snapshot: Arc::clone(&snapshot),
            });
            summary.discovered += 1;
            let _ = self.events.send(SyncEvent::FacilityDiscovered {
                description,
                snapshot,
            });
            return;
        };

        let changes = diff_snapshots(&baseline, &snapshot);
        for (path, change) in &changes {
            summary.dispatched += self.registry.dispatch(&serial, path, change);
        }
        summary.changes += changes.len();
        self.store.upsert(Facility {
            description,
            snapshot,
        });
    }

    /// Never leaves `Stopped`.
    fn set_state(&self, state: PollerState) {
        self.state.send_if_modified(|current| {
            if *current == PollerState::Stopped || *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}
