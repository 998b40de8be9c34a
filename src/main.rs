use std::sync::Arc;

use clap::Parser;
use tracing::info;

use kickwatch::config::Config;
use kickwatch::database::{self, Storage};
use kickwatch::fetcher::KickFetcher;
use kickwatch::monitor::MonitorEngine;

/// Resilient live viewer-count monitor for Kick channels.
#[derive(Parser, Debug)]
#[command(name = "kickwatch", version, about)]
struct Args {
    /// Poll every registered channel exactly once, persist, and exit.
    #[arg(long, short = '1')]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    let _log_guard = kickwatch::logging::init();

    let config = Config::from_env()?;

    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;
    let storage = Arc::new(Storage::new(pool));

    let channels = storage.channels.list_channels().await?;
    if channels.is_empty() {
        anyhow::bail!(
            "channel registry is empty; add channel slugs to the channels table before starting"
        );
    }
    info!(channels = channels.len(), "Loaded channel registry");

    let fetcher = Arc::new(KickFetcher::new(&config)?);
    let engine = MonitorEngine::new(config, storage, fetcher);

    if args.once {
        engine.run_once(&channels).await?;
        return Ok(());
    }

    engine.run(channels).await?;
    Ok(())
}
