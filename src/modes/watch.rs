use crate::feeds::{FeedCfg, FeedFetcher};
use crate::filter::IncidentEngine;
use crate::notify::Dispatcher;
use crate::translate::Translator;
use anyhow::Result;
use std::time::Duration;
use tracing::info;

use super::shared::run_cycle;

/// Repeat the cycle every `POLL_INTERVAL_SECS` (default 900). The dedup
/// store stays in memory between cycles and is persisted after each one.
pub(super) async fn run() -> Result<()> {
    let interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(900);

    let feed_cfg = FeedCfg::from_env()?;
    let fetcher = FeedFetcher::new(&feed_cfg)?;
    let mut engine = IncidentEngine::from_env()?;
    let translator = Translator::from_env();
    let dispatcher = Dispatcher::from_env()?;

    info!("Engine: {engine}");
    if engine.store().is_empty() {
        info!("Dedup store is empty, every match counts as new");
    }
    info!("{translator}");
    info!("{dispatcher}");
    info!(
        "Watching {} feeds every {interval_secs}s",
        feed_cfg.sources.len()
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let batches = fetcher.fetch_all(&feed_cfg.sources).await;
        run_cycle(&mut engine, &batches, &translator, &dispatcher).await;
    }
}
