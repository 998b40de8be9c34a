//! Per-channel poll worker.
//!
//! One cancellable loop per channel: fetch telemetry, run the session state
//! machine, persist the sample, update peaks. A single bad poll never
//! terminates the worker; errors are logged and the loop continues on the
//! next interval.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Result;
use crate::database::Storage;
use crate::database::models::{SampleRow, SessionRow};
use crate::database::time::now_ts;
use crate::fetcher::{Observation, TelemetryFetcher};
use crate::monitor::peaks;
use crate::monitor::tracker::{TrackerState, Transition};

pub struct ChannelWorker {
    channel: String,
    storage: Arc<Storage>,
    fetcher: Arc<dyn TelemetryFetcher>,
    poll_interval: Duration,
    token: CancellationToken,
}

impl ChannelWorker {
    pub fn new(
        channel: impl Into<String>,
        storage: Arc<Storage>,
        fetcher: Arc<dyn TelemetryFetcher>,
        poll_interval: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            channel: channel.into(),
            storage,
            fetcher,
            poll_interval,
            token,
        }
    }

    /// Run the poll loop until cancelled.
    ///
    /// On start, any session left open for this channel (e.g. after a crash
    /// mid-broadcast) is re-adopted so the broadcast is not split in two. On
    /// cancellation, an open session is closed at the current time before the
    /// loop exits.
    pub async fn run(self) {
        info!(channel = %self.channel, "Worker started");

        let mut state = match self.storage.sessions.open_session(&self.channel).await {
            Ok(Some(session)) => {
                info!(
                    channel = %self.channel,
                    session = %session.id,
                    livestream = %session.livestream_id,
                    "Re-adopting open session"
                );
                TrackerState::Open {
                    session_id: session.id,
                    livestream_id: session.livestream_id,
                }
            }
            Ok(None) => TrackerState::Closed,
            Err(e) => {
                warn!(channel = %self.channel, error = %e, "Failed to look up open session; starting closed");
                TrackerState::Closed
            }
        };

        loop {
            if self.token.is_cancelled() {
                break;
            }

            if let Err(e) = self.cycle(&mut state).await {
                warn!(channel = %self.channel, error = %e, "Poll cycle failed; continuing");
            }

            // The sleep is interruptible so a stop request is honored
            // promptly rather than only between full intervals.
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        if let TrackerState::Open { session_id, .. } = &state {
            if let Err(e) = self.storage.sessions.close(session_id, now_ts()).await {
                warn!(channel = %self.channel, session = %session_id, error = %e, "Failed to close session on shutdown");
            }
        }

        info!(channel = %self.channel, "Worker stopped");
    }

    /// One poll cycle: fetch, transition, persist, aggregate.
    async fn cycle(&self, state: &mut TrackerState) -> Result<()> {
        let obs = self.fetcher.fetch(&self.channel).await;
        let ts = now_ts();

        match state.transition(obs.is_live, obs.livestream_id.as_deref()) {
            Transition::Open => self.open_session(state, &obs, ts).await?,
            Transition::Reopen => {
                if let TrackerState::Open { session_id, .. } = &*state {
                    self.storage.sessions.close(session_id, ts).await?;
                }
                self.open_session(state, &obs, ts).await?;
            }
            Transition::Close => {
                if let TrackerState::Open { session_id, .. } = &*state {
                    self.storage.sessions.close(session_id, ts).await?;
                }
                *state = TrackerState::Closed;
            }
            Transition::Stay => {}
        }

        let sample = SampleRow::new(
            &self.channel,
            ts,
            obs.viewers,
            obs.is_live,
            obs.raw_string(),
            state.session_id().map(str::to_owned),
        );

        let stored = persist_sample(&self.storage, &sample).await;
        if stored && obs.viewers >= 0 {
            update_peaks(&self.storage, &self.channel, ts, obs.viewers).await?;
        }

        debug!(
            channel = %self.channel,
            viewers = obs.viewers,
            is_live = obs.is_live,
            session = state.session_id().unwrap_or("-"),
            "Poll cycle complete"
        );
        Ok(())
    }

    async fn open_session(
        &self,
        state: &mut TrackerState,
        obs: &Observation,
        ts: i64,
    ) -> Result<()> {
        // The transition guarantees a livestream id is present here.
        let Some(livestream_id) = obs.livestream_id.as_deref() else {
            return Ok(());
        };
        let session = SessionRow::new(&self.channel, livestream_id, obs.title.clone(), ts);
        self.storage.sessions.create(&session).await?;
        *state = TrackerState::Open {
            session_id: session.id,
            livestream_id: session.livestream_id,
        };
        Ok(())
    }
}

/// Insert a sample, falling back to a slim insert without the raw payload.
///
/// Returns whether the sample was stored; a dropped sample is logged and the
/// cycle continues without it.
pub(crate) async fn persist_sample(storage: &Storage, sample: &SampleRow) -> bool {
    match storage.samples.insert(sample).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                channel = %sample.channel,
                error = %e,
                "Sample insert failed; retrying without raw payload"
            );
            match storage.samples.insert_slim(sample).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(channel = %sample.channel, error = %e, "Sample insert failed again; dropping sample");
                    false
                }
            }
        }
    }
}

/// Fold one stored sample into the channel's peak record.
pub(crate) async fn update_peaks(
    storage: &Storage,
    channel: &str,
    ts: i64,
    viewers: i64,
) -> Result<()> {
    let existing = storage.peaks.get(channel).await?;
    let updated = peaks::apply_sample(existing, channel, ts, viewers);
    storage.peaks.upsert(&updated).await
}
