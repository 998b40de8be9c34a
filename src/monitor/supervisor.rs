//! Worker supervision.
//!
//! The supervisor owns the authoritative map of running channel workers. It
//! restarts workers whose task has terminated, and exposes the add/remove
//! surface the reconciler uses to follow registry changes. The map is the
//! single structure shared between the two; the lock is never held across an
//! await.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::database::Storage;
use crate::fetcher::TelemetryFetcher;
use crate::monitor::worker::ChannelWorker;

/// Bound on waiting for one worker to stop.
const WORKER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

struct WorkerHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

pub struct Supervisor {
    storage: Arc<Storage>,
    fetcher: Arc<dyn TelemetryFetcher>,
    poll_interval: Duration,
    check_interval: Duration,
    shutdown: CancellationToken,
    workers: Mutex<HashMap<String, WorkerHandle>>,
}

impl Supervisor {
    pub fn new(
        storage: Arc<Storage>,
        fetcher: Arc<dyn TelemetryFetcher>,
        poll_interval: Duration,
        check_interval: Duration,
    ) -> Self {
        Self {
            storage,
            fetcher,
            poll_interval,
            check_interval,
            shutdown: CancellationToken::new(),
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Start a worker for a channel. A channel that already has a live worker
    /// is left untouched, which keeps registry reconciliation idempotent.
    ///
    /// The lock is held across check, spawn, and insert: the restart sweep
    /// and the reconciler both call this from their own tasks, and a gap
    /// between the check and the insert would let them race two workers onto
    /// the same channel. Nothing here awaits, so holding the lock is safe.
    pub fn start_worker(&self, channel: &str) {
        let mut workers = self.workers.lock();
        if let Some(handle) = workers.get(channel) {
            if !handle.join.is_finished() {
                debug!(channel, "Worker already running; not starting another");
                return;
            }
        }

        let token = self.shutdown.child_token();
        let worker = ChannelWorker::new(
            channel,
            self.storage.clone(),
            self.fetcher.clone(),
            self.poll_interval,
            token.clone(),
        );
        let join = tokio::spawn(worker.run());

        workers.insert(channel.to_string(), WorkerHandle { token, join });
    }

    /// Channels with a registered worker, sorted.
    pub fn active_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.workers.lock().keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Whether a channel's worker task is registered and has not terminated.
    pub fn is_running(&self, channel: &str) -> bool {
        self.workers
            .lock()
            .get(channel)
            .is_some_and(|handle| !handle.join.is_finished())
    }

    /// Gracefully stop one worker and remove it from the active set.
    ///
    /// The worker closes any open session on its way out; we wait for that,
    /// bounded.
    pub async fn stop_worker(&self, channel: &str) {
        let Some(handle) = self.workers.lock().remove(channel) else {
            return;
        };
        handle.token.cancel();
        if tokio::time::timeout(WORKER_STOP_TIMEOUT, handle.join)
            .await
            .is_err()
        {
            warn!(channel, "Worker did not stop within the timeout");
        }
    }

    /// Liveness loop: restart any worker whose task has terminated.
    ///
    /// Only a failure before the worker loop can start terminates the task;
    /// per-cycle errors are absorbed inside the worker.
    pub async fn run(&self) {
        info!(interval = ?self.check_interval, "Supervisor started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.check_interval) => {}
            }

            let dead: Vec<String> = {
                let workers = self.workers.lock();
                workers
                    .iter()
                    .filter(|(_, handle)| handle.join.is_finished())
                    .map(|(channel, _)| channel.clone())
                    .collect()
            };

            for channel in dead {
                if self.shutdown.is_cancelled() {
                    return;
                }
                warn!(channel = %channel, "Worker terminated unexpectedly; restarting");
                self.workers.lock().remove(&channel);
                self.start_worker(&channel);
            }
        }
    }

    /// Signal all workers to stop and wait, bounded, for each to exit.
    pub async fn shutdown(&self) {
        info!("Supervisor shutting down workers");
        self.shutdown.cancel();

        let handles: Vec<(String, WorkerHandle)> = self.workers.lock().drain().collect();
        for (channel, handle) in handles {
            handle.token.cancel();
            if tokio::time::timeout(WORKER_STOP_TIMEOUT, handle.join)
                .await
                .is_err()
            {
                warn!(channel = %channel, "Worker did not stop within the timeout");
            }
        }
        info!("All workers stopped");
    }
}
