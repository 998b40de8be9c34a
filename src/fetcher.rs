//! Telemetry fetching and payload normalization.
//!
//! One HTTP GET per poll per channel against the Kick channels API. The
//! fetcher never raises past its boundary: any network error, timeout, or
//! malformed reply degrades to `viewers = -1, is_live = false` with the error
//! captured in the raw payload. Retry is the caller's poll cadence.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::Config;
use crate::{Error, Result};

/// Sentinel viewer count for a failed fetch.
pub const FETCH_FAILED_VIEWERS: i64 = -1;

/// One normalized poll result for a channel.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Viewer count, or `-1` when the fetch failed.
    pub viewers: i64,
    pub is_live: bool,
    /// Platform identifier of the running livestream, when one is reported.
    pub livestream_id: Option<String>,
    pub title: Option<String>,
    /// The payload as received, kept opaque for audit/debug.
    pub raw: Value,
}

impl Observation {
    /// A degraded observation for a failed fetch.
    pub fn failed(err: impl Display) -> Self {
        Self {
            viewers: FETCH_FAILED_VIEWERS,
            is_live: false,
            livestream_id: None,
            title: None,
            raw: json!({ "error": err.to_string() }),
        }
    }

    /// An offline observation (used by tests and tooling).
    pub fn offline(viewers: i64) -> Self {
        Self {
            viewers,
            is_live: false,
            livestream_id: None,
            title: None,
            raw: json!({}),
        }
    }

    /// A live observation (used by tests and tooling).
    pub fn live(viewers: i64, livestream_id: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            viewers,
            is_live: true,
            livestream_id: Some(livestream_id.into()),
            title: title.map(str::to_owned),
            raw: json!({}),
        }
    }

    /// Serialize the raw payload for storage, best effort.
    pub fn raw_string(&self) -> Option<String> {
        serde_json::to_string(&self.raw).ok()
    }
}

/// Source of per-channel telemetry.
#[async_trait]
pub trait TelemetryFetcher: Send + Sync {
    /// Poll one channel. Infallible by contract: failures come back as a
    /// degraded [`Observation`].
    async fn fetch(&self, channel: &str) -> Observation;
}

/// Fetcher backed by the Kick channels API.
pub struct KickFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl KickFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.api_base, config.fetch_timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kickwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_inner(&self, channel: &str) -> std::result::Result<Value, reqwest::Error> {
        let url = format!("{}/{}", self.base_url, channel);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        response.json::<Value>().await
    }
}

#[async_trait]
impl TelemetryFetcher for KickFetcher {
    async fn fetch(&self, channel: &str) -> Observation {
        match self.fetch_inner(channel).await {
            Ok(payload) => {
                let obs = parse_payload(payload);
                debug!(
                    channel,
                    viewers = obs.viewers,
                    is_live = obs.is_live,
                    livestream = obs.livestream_id.as_deref().unwrap_or("-"),
                    "Fetched channel telemetry"
                );
                obs
            }
            Err(e) => {
                warn!(channel, error = %e, "Telemetry fetch failed");
                Observation::failed(e)
            }
        }
    }
}

/// Normalize a raw channel payload into an [`Observation`].
///
/// The platform has shipped both `livestream` and `live_stream` keys, numeric
/// and string livestream ids, and `viewer_count`/`viewers` field names; all
/// variants are accepted. A payload with no recognizable viewer count yields
/// the `-1` sentinel.
pub(crate) fn parse_payload(raw: Value) -> Observation {
    let livestream = raw
        .get("livestream")
        .or_else(|| raw.get("live_stream"))
        .filter(|v| v.is_object());

    let mut viewers = None;
    let mut is_live = false;
    let mut livestream_id = None;
    let mut title = None;

    if let Some(ls) = livestream {
        viewers = ls
            .get("viewer_count")
            .and_then(json_count)
            .or_else(|| ls.get("viewers").and_then(json_count));
        is_live = ls.get("is_live").and_then(Value::as_bool).unwrap_or(false);
        livestream_id = ls
            .get("id")
            .and_then(json_id)
            .or_else(|| ls.get("uuid").and_then(json_id));
        title = ls
            .get("session_title")
            .and_then(Value::as_str)
            .or_else(|| ls.get("title").and_then(Value::as_str))
            .map(str::to_owned);
    }

    // Some payload shapes report the count at the top level.
    let viewers = viewers
        .or_else(|| raw.get("viewers").and_then(json_count))
        .or_else(|| raw.get("viewer_count").and_then(json_count))
        .unwrap_or(FETCH_FAILED_VIEWERS);

    Observation {
        viewers,
        is_live,
        livestream_id,
        title,
        raw,
    }
}

fn json_count(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

fn json_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
