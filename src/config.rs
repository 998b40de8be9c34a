//! Engine configuration from environment variables.
//!
//! Every knob has a default matching unattended operation; overrides come
//! from the environment (a `.env` file is honored via `dotenvy` in `main`).

use std::time::Duration;

use crate::{Error, Result};

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:kickwatch.db?mode=rwc";

/// Default base URL of the Kick channels API.
pub const DEFAULT_API_BASE: &str = "https://kick.com/api/v1/channels";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_SUPERVISOR_INTERVAL_SECS: u64 = 5;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;
const DEFAULT_STALE_MINUTES: u64 = 10;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 12;

/// Runtime configuration for the polling engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL.
    pub database_url: String,
    /// Base URL for channel telemetry requests (no trailing slash).
    pub api_base: String,
    /// Interval between polls for one channel.
    pub poll_interval: Duration,
    /// Interval between supervisor liveness sweeps.
    pub supervisor_interval: Duration,
    /// Interval between reconciler runs.
    pub reconcile_interval: Duration,
    /// Open sessions without a sample for this long are force-closed.
    pub stale_after: Duration,
    /// Per-request timeout for telemetry fetches.
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            supervisor_interval: Duration::from_secs(DEFAULT_SUPERVISOR_INTERVAL_SECS),
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            stale_after: Duration::from_secs(DEFAULT_STALE_MINUTES * 60),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            api_base: std::env::var("KICKWATCH_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            poll_interval: env_duration_secs("KICKWATCH_POLL_INTERVAL_SECS")?
                .unwrap_or(defaults.poll_interval),
            supervisor_interval: env_duration_secs("KICKWATCH_SUPERVISOR_INTERVAL_SECS")?
                .unwrap_or(defaults.supervisor_interval),
            reconcile_interval: env_duration_secs("KICKWATCH_RECONCILE_INTERVAL_SECS")?
                .unwrap_or(defaults.reconcile_interval),
            stale_after: env_duration_secs("KICKWATCH_STALE_MINUTES")?
                .map(|d| d * 60)
                .unwrap_or(defaults.stale_after),
            fetch_timeout: env_duration_secs("KICKWATCH_FETCH_TIMEOUT_SECS")?
                .unwrap_or(defaults.fetch_timeout),
        })
    }
}

/// Read an environment variable holding a whole number of seconds.
fn env_duration_secs(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::config(format!("{name} must be a whole number of seconds, got '{raw}'"))
            })?;
            if secs == 0 {
                return Err(Error::config(format!("{name} must be greater than zero")));
            }
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.supervisor_interval, Duration::from_secs(5));
        assert_eq!(config.reconcile_interval, Duration::from_secs(60));
        assert_eq!(config.stale_after, Duration::from_secs(600));
        assert_eq!(config.fetch_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_env_duration_rejects_garbage() {
        // Unique name to avoid clashing with other tests in the process.
        unsafe { std::env::set_var("KICKWATCH_TEST_BAD_SECS", "ten") };
        assert!(env_duration_secs("KICKWATCH_TEST_BAD_SECS").is_err());
        unsafe { std::env::remove_var("KICKWATCH_TEST_BAD_SECS") };
    }
}
