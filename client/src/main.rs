//! Tether agent - keeps a local resource reconciled with its remote.
//!
//! Syncs once and exits, or every `SYNC_INTERVAL_SECS` until interrupted.

use std::sync::Arc;
use tether_client::{Config, FileStorage, HttpRemote, Result};
use tether_engine::{StoredSync, SyncSummary};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether_client=debug,tether_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let storage = FileStorage::open(&config.store_dir)?;
    let remote = HttpRemote::new(&config.remote_url).with_id_key(config.keys.id.clone());
    let mut store = StoredSync::open(
        remote,
        Arc::new(storage),
        config.store_key.clone(),
        config.shape,
        config.keys.clone(),
    )?;

    tracing::info!(
        "Syncing {} {} with {}",
        config.shape,
        config.store_key,
        config.remote_url
    );

    let Some(period) = config.sync_interval else {
        let summary = store.sync().await?;
        log_summary(&summary);
        return Ok(());
    };

    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => match store.sync().await {
                Ok(summary) => log_summary(&summary),
                Err(e) => tracing::warn!("Sync failed: {}", e),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn log_summary(summary: &SyncSummary) {
    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        destroyed = summary.destroyed,
        skipped = summary.skipped,
        total = summary.total,
        "Sync complete"
    );
}
