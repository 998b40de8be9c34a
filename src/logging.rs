//! Logging initialization.
//!
//! Console logging via `tracing` with an `EnvFilter` (override with
//! `RUST_LOG`), plus an optional daily-rolling file layer when
//! `KICKWATCH_LOG_DIR` is set.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "kickwatch=info,sqlx=warn";

/// Initialize the global subscriber.
///
/// Returns the non-blocking writer guard when file logging is enabled; the
/// caller must keep it alive for the lifetime of the process.
pub fn init() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match std::env::var("KICKWATCH_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "kickwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        Err(_) => {
            registry.init();
            None
        }
    }
}
