//! Periodic reconciliation.
//!
//! Two independent sweeps on one cadence: force-closing sessions that have
//! gone silent, and diffing the channel registry against the supervisor's
//! active worker set. Neither sweep assumes anything about what any worker is
//! doing mid-cycle.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;
use crate::database::Storage;
use crate::database::time::now_ts;
use crate::monitor::supervisor::Supervisor;

pub struct Reconciler {
    storage: Arc<Storage>,
    supervisor: Arc<Supervisor>,
    interval: Duration,
    stale_after: Duration,
    token: CancellationToken,
}

impl Reconciler {
    pub fn new(
        storage: Arc<Storage>,
        supervisor: Arc<Supervisor>,
        interval: Duration,
        stale_after: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            storage,
            supervisor,
            interval,
            stale_after,
            token,
        }
    }

    pub async fn run(self) {
        info!(
            interval = ?self.interval,
            stale_after = ?self.stale_after,
            "Reconciler started"
        );

        loop {
            match sweep_stale_sessions(&self.storage, self.stale_after).await {
                Ok(0) => {}
                Ok(closed) => info!(closed, "Stale-session sweep closed sessions"),
                Err(e) => warn!(error = %e, "Stale-session sweep failed"),
            }

            if let Err(e) = self.reconcile_registry().await {
                warn!(error = %e, "Registry reconciliation failed");
            }

            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Reconciler stopped");
    }

    /// Diff the channel registry against the active worker set; start workers
    /// for new channels and stop workers for removed ones. A no-change diff
    /// leaves the worker set untouched.
    pub async fn reconcile_registry(&self) -> Result<()> {
        let desired: BTreeSet<String> = self
            .storage
            .channels
            .list_channels()
            .await?
            .into_iter()
            .collect();
        let active: BTreeSet<String> = self.supervisor.active_channels().into_iter().collect();

        for channel in desired.difference(&active) {
            info!(channel = %channel, "New channel in registry; starting worker");
            self.supervisor.start_worker(channel);
        }

        for channel in active.difference(&desired) {
            info!(channel = %channel, "Channel removed from registry; stopping worker");
            self.supervisor.stop_worker(channel).await;
        }

        Ok(())
    }
}

/// Force-close open sessions whose latest sample (or start time, if they have
/// no samples) is older than the staleness threshold.
///
/// Recovers from a worker dying mid-broadcast or the platform never cleanly
/// reporting offline. Metrics are computed as on any other close.
pub async fn sweep_stale_sessions(storage: &Storage, stale_after: Duration) -> Result<usize> {
    let cutoff = now_ts() - stale_after.as_secs() as i64;
    let mut closed = 0usize;

    for session in storage.sessions.list_open().await? {
        let last_sample_ts = storage.samples.last_sample_ts(&session.id).await?;
        let last_activity = last_sample_ts.unwrap_or(session.start_ts);
        if last_activity < cutoff {
            info!(
                channel = %session.channel,
                session = %session.id,
                last_activity,
                "Closing stale session"
            );
            storage.sessions.close(&session.id, now_ts()).await?;
            closed += 1;
        }
    }

    Ok(closed)
}
