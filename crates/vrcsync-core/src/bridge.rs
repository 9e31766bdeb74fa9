// ── Bridge facade ──
//
// Wires one account's pipeline, poller, write queue and subscription
// registry together. This is the type applications hold on to.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};
use vrcsync_api::{HttpTransport, RequestPipeline, SessionState, Transport, TransportConfig};

use crate::aggregate::SnapshotAggregator;
use crate::command::WriteIntent;
use crate::config::BridgeConfig;
use crate::diff::FieldChange;
use crate::error::CoreError;
use crate::model::{DhwMode, FacilityDescription, FieldPath, Snapshot, ZoneMode};
use crate::poller::{CycleSummary, Poller, PollerState, SyncEvent};
use crate::queue::{DrainReport, WriteQueue};
use crate::store::FacilityStore;
use crate::subscription::{SubscriptionHandle, SubscriptionRegistry};

/// Synchronization engine for one multiMATIC account.
///
/// Does not touch the network until [`start`](Self::start),
/// [`refresh_once`](Self::refresh_once) or a write is issued.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    pipeline: Arc<RequestPipeline>,
    aggregator: SnapshotAggregator,
    registry: Arc<SubscriptionRegistry>,
    store: Arc<FacilityStore>,
    queue: WriteQueue,
    poller: Poller,
}

impl Bridge {
    /// Build a bridge talking HTTP to `config.base_url`.
    pub fn new(config: BridgeConfig) -> Result<Self, CoreError> {
        let transport = HttpTransport::new(
            config.base_url.clone(),
            TransportConfig {
                tls: config.tls.clone(),
                timeout: config.timeout,
                cookie_jar: None,
            },
        )?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a bridge over any transport (tests, recorded sessions).
    pub fn with_transport(config: BridgeConfig, transport: Arc<dyn Transport>) -> Self {
        let pipeline = Arc::new(RequestPipeline::new(
            transport,
            config.credentials.clone(),
        ));
        let aggregator = SnapshotAggregator::new(Arc::clone(&pipeline), config.stale_after);
        let registry = Arc::new(SubscriptionRegistry::new());
        let store = Arc::new(FacilityStore::new());
        let queue = WriteQueue::new(Arc::clone(&pipeline), config.write_debounce);
        let poller = Poller::new(
            aggregator.clone(),
            Arc::clone(&registry),
            Arc::clone(&store),
            crate::config::clamp_poll_interval(config.poll_interval),
            config.max_concurrent_facilities,
        );

        Self {
            inner: Arc::new(BridgeInner {
                config,
                pipeline,
                aggregator,
                registry,
                store,
                queue,
                poller,
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start background polling. The first cycle runs immediately.
    pub async fn start(&self) -> bool {
        self.inner.poller.start().await
    }

    /// Stop polling. A cycle in progress completes first.
    pub async fn stop(&self) {
        self.inner.poller.stop().await;
    }

    /// Stop polling, flush pending writes and end the cloud session.
    pub async fn shutdown(&self) -> Option<Arc<DrainReport>> {
        self.inner.poller.stop().await;
        let report = self.inner.queue.wait_idle().await;
        if self.inner.pipeline.session_state().await == SessionState::Authenticated {
            if let Err(e) = self.inner.pipeline.log_out().await {
                warn!(error = %e, "logout failed (non-fatal)");
            }
        }
        info!("bridge shut down");
        report
    }

    /// Run one poll cycle now.
    pub async fn refresh_once(&self) -> Result<CycleSummary, CoreError> {
        self.inner.poller.poll_once().await
    }

    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.poller.events()
    }

    pub fn poller_state(&self) -> watch::Receiver<PollerState> {
        self.inner.poller.watch_state()
    }

    pub async fn session_state(&self) -> SessionState {
        self.inner.pipeline.session_state().await
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe<F>(&self, serial: &str, path: FieldPath, observer: F) -> SubscriptionHandle
    where
        F: Fn(&FieldChange) + Send + Sync + 'static,
    {
        self.inner.registry.subscribe(serial, path, observer)
    }

    pub fn subscribe_channel(
        &self,
        serial: &str,
        path: FieldPath,
    ) -> (SubscriptionHandle, tokio::sync::mpsc::UnboundedReceiver<FieldChange>) {
        self.inner.registry.subscribe_channel(serial, path)
    }

    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        self.inner.registry.unsubscribe(handle)
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.inner.registry
    }

    // ── State access ─────────────────────────────────────────────────

    /// Facilities seen by the poller so far.
    pub fn facilities(&self) -> Vec<FacilityDescription> {
        self.inner.store.descriptions()
    }

    /// Latest polled snapshot of a facility.
    pub fn snapshot(&self, serial: &str) -> Option<Arc<Snapshot>> {
        self.inner.store.snapshot(serial)
    }

    pub fn store(&self) -> &Arc<FacilityStore> {
        &self.inner.store
    }

    /// Read the facility list from the cloud, bypassing the poller.
    pub async fn list_facilities(&self) -> Result<Vec<FacilityDescription>, CoreError> {
        self.inner.aggregator.list_facilities().await
    }

    /// Build a fresh snapshot of one facility, bypassing the poller.
    pub async fn fetch_snapshot(&self, serial: &str) -> Result<Snapshot, CoreError> {
        self.inner.aggregator.build_snapshot(serial).await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Validate an intent and queue it for delivery.
    pub async fn submit(&self, intent: WriteIntent) -> Result<(), CoreError> {
        let command = intent.into_command()?;
        self.inner.queue.enqueue(command).await;
        Ok(())
    }

    pub async fn set_zone_setpoint(&self, serial: &str, zone: &str, temperature: f64) -> Result<(), CoreError> {
        self.submit(WriteIntent::SetZoneSetpoint {
            serial: serial.to_owned(),
            zone: zone.to_owned(),
            temperature,
        })
        .await
    }

    pub async fn set_zone_setback(&self, serial: &str, zone: &str, temperature: f64) -> Result<(), CoreError> {
        self.submit(WriteIntent::SetZoneSetback {
            serial: serial.to_owned(),
            zone: zone.to_owned(),
            temperature,
        })
        .await
    }

    pub async fn set_zone_mode(&self, serial: &str, zone: &str, mode: ZoneMode) -> Result<(), CoreError> {
        self.submit(WriteIntent::SetZoneMode {
            serial: serial.to_owned(),
            zone: zone.to_owned(),
            mode,
        })
        .await
    }

    pub async fn set_dhw_setpoint(&self, serial: &str, dhw: &str, temperature: f64) -> Result<(), CoreError> {
        self.submit(WriteIntent::SetDhwSetpoint {
            serial: serial.to_owned(),
            dhw: dhw.to_owned(),
            temperature,
        })
        .await
    }

    pub async fn set_dhw_mode(&self, serial: &str, dhw: &str, mode: DhwMode) -> Result<(), CoreError> {
        self.submit(WriteIntent::SetDhwMode {
            serial: serial.to_owned(),
            dhw: dhw.to_owned(),
            mode,
        })
        .await
    }

    /// Wait for queued writes to go out; returns the last drain report.
    pub async fn flush_writes(&self) -> Option<Arc<DrainReport>> {
        self.inner.queue.wait_idle().await
    }

    pub fn write_reports(&self) -> watch::Receiver<Option<Arc<DrainReport>>> {
        self.inner.queue.reports()
    }
}
