// ── Write queue ──
//
// Coalescing, debounced FIFO of write commands. A burst of changes to the
// same setting collapses into the last one; the queue drains sequentially
// after a short quiet period so the regulator sees one PUT per setting.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use vrcsync_api::RequestPipeline;

use crate::command::Command;
use crate::error::CoreError;

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    /// Target keys delivered, in send order.
    pub delivered: Vec<String>,
    /// Target keys that failed, with the reason.
    pub failed: Vec<(String, Arc<CoreError>)>,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Command>,
    /// A drain task is scheduled or running.
    scheduled: bool,
}

/// Cheaply cloneable handle to the queue.
#[derive(Clone)]
pub struct WriteQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    pipeline: Arc<RequestPipeline>,
    debounce: Duration,
    state: Mutex<QueueState>,
    idle: watch::Sender<bool>,
    reports: watch::Sender<Option<Arc<DrainReport>>>,
}

impl WriteQueue {
    pub fn new(pipeline: Arc<RequestPipeline>, debounce: Duration) -> Self {
        let (idle, _) = watch::channel(true);
        let (reports, _) = watch::channel(None);
        Self {
            inner: Arc::new(QueueInner {
                pipeline,
                debounce,
                state: Mutex::new(QueueState::default()),
                idle,
                reports,
            }),
        }
    }

    /// Queue a command, replacing any pending one with the same target key.
    ///
    /// The first command into an idle queue schedules a drain after the
    /// debounce delay; later commands ride along with that drain.
    pub async fn enqueue(&self, command: Command) {
        let mut state = self.inner.state.lock().await;

        if let Some(slot) = state
            .pending
            .iter_mut()
            .find(|pending| pending.target_key == command.target_key)
        {
            debug!(target_key = %command.target_key, "similar command pending, replacing");
            *slot = command;
            return;
        }

        debug!(target_key = %command.target_key, "command queued");
        state.pending.push_back(command);

        if !state.scheduled {
            state.scheduled = true;
            self.inner.idle.send_replace(false);
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.drain().await });
        }
    }

    /// Commands waiting to be sent.
    pub async fn pending(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        *self.inner.idle.borrow()
    }

    /// Latest drain report, updated after every drain cycle.
    pub fn reports(&self) -> watch::Receiver<Option<Arc<DrainReport>>> {
        self.inner.reports.subscribe()
    }

    /// Wait until nothing is queued or in flight, then return the most
    /// recent drain report.
    pub async fn wait_idle(&self) -> Option<Arc<DrainReport>> {
        let mut idle = self.inner.idle.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = idle.wait_for(|idle| *idle).await;
        self.inner.reports.borrow().clone()
    }
}

impl QueueInner {
    async fn drain(&self) {
        tokio::time::sleep(self.debounce).await;

        let mut report = DrainReport::default();
        loop {
            let command = {
                let mut state = self.state.lock().await;
                if let Some(command) = state.pending.pop_front() {
                    command
                } else {
                    // Cleared under the same lock `enqueue` checks, so a
                    // command queued after this point schedules a new drain.
                    state.scheduled = false;
                    info!(
                        delivered = report.delivered.len(),
                        failed = report.failed.len(),
                        "write queue drained"
                    );
                    self.reports.send_replace(Some(Arc::new(report)));
                    self.idle.send_replace(true);
                    return;
                }
            };

            debug!(target_key = %command.target_key, verb = %command.verb, "sending command");
            match self.pipeline.execute(&command.to_request()).await {
                Ok(_) => report.delivered.push(command.target_key),
                Err(e) => {
                    let err = CoreError::from(e);
                    warn!(target_key = %command.target_key, error = %err, "command failed");
                    report.failed.push((command.target_key, Arc::new(err)));
                }
            }
        }
    }
}
