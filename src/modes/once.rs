use crate::feeds::{FeedCfg, FeedFetcher};
use crate::filter::IncidentEngine;
use crate::notify::Dispatcher;
use crate::translate::Translator;
use anyhow::Result;
use tracing::info;

use super::shared::run_cycle;

/// Single fetch → match → dispatch → persist pass, meant for cron / CI.
pub(super) async fn run() -> Result<()> {
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

    let batches = fetcher.fetch_all(&feed_cfg.sources).await;
    run_cycle(&mut engine, &batches, &translator, &dispatcher).await;
    Ok(())
}
