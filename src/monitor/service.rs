//! Monitor engine: wires workers, supervisor, and reconciler together.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;
use crate::config::Config;
use crate::database::Storage;
use crate::database::models::SampleRow;
use crate::database::time::now_ts;
use crate::fetcher::TelemetryFetcher;
use crate::monitor::reconciler::Reconciler;
use crate::monitor::supervisor::Supervisor;
use crate::monitor::worker::{persist_sample, update_peaks};

/// Bound on waiting for the reconciler task during shutdown.
const RECONCILER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MonitorEngine {
    config: Config,
    storage: Arc<Storage>,
    fetcher: Arc<dyn TelemetryFetcher>,
}

impl MonitorEngine {
    pub fn new(config: Config, storage: Arc<Storage>, fetcher: Arc<dyn TelemetryFetcher>) -> Self {
        Self {
            config,
            storage,
            fetcher,
        }
    }

    /// Run-forever mode: start one worker per registered channel plus the
    /// supervisor and reconciler loops, then block until Ctrl-C.
    ///
    /// Shutdown order: workers first (each closes its open session), then the
    /// reconciler.
    pub async fn run(&self, channels: Vec<String>) -> Result<()> {
        let supervisor = Arc::new(Supervisor::new(
            self.storage.clone(),
            self.fetcher.clone(),
            self.config.poll_interval,
            self.config.supervisor_interval,
        ));

        for channel in &channels {
            supervisor.start_worker(channel);
        }
        info!(workers = channels.len(), "Monitor engine started");

        let supervisor_task = tokio::spawn({
            let supervisor = supervisor.clone();
            async move { supervisor.run().await }
        });

        let reconciler_token = CancellationToken::new();
        let reconciler = Reconciler::new(
            self.storage.clone(),
            supervisor.clone(),
            self.config.reconcile_interval,
            self.config.stale_after,
            reconciler_token.clone(),
        );
        let reconciler_task = tokio::spawn(reconciler.run());

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");

        supervisor.shutdown().await;
        let _ = supervisor_task.await;

        reconciler_token.cancel();
        let _ = tokio::time::timeout(RECONCILER_STOP_TIMEOUT, reconciler_task).await;

        info!("Monitor engine stopped");
        Ok(())
    }

    /// Single-pass mode: poll every registered channel exactly once, persist
    /// the samples and peak updates, and return. No sessions are opened.
    ///
    /// Intended for health checks and cron-style invocation; results go to
    /// stdout.
    pub async fn run_once(&self, channels: &[String]) -> Result<()> {
        for channel in channels {
            let obs = self.fetcher.fetch(channel).await;
            let ts = now_ts();

            let sample = SampleRow::new(
                channel,
                ts,
                obs.viewers,
                obs.is_live,
                obs.raw_string(),
                None,
            );
            let stored = persist_sample(&self.storage, &sample).await;
            if stored && obs.viewers >= 0 {
                // One channel's peak failure must not abort the pass.
                if let Err(e) = update_peaks(&self.storage, channel, ts, obs.viewers).await {
                    warn!(channel = %channel, error = %e, "Peak update failed; continuing");
                }
            }

            println!("{channel}: viewers={} is_live={}", obs.viewers, obs.is_live);
        }
        Ok(())
    }
}
