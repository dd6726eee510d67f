use crate::filter::{DedupStore, EngineConfig, Fingerprinter, IncidentEngine, Taxonomy};
use crate::notify::Dispatcher;
use crate::translate::Translator;
use anyhow::{Result, anyhow};
use tracing::info;

use super::shared::{load_dump, load_replay_cfg, run_cycle, to_batches};

/// Run one offline cycle over a JSONL dump. Uses an in-memory dedup store
/// so the production store is never touched; notifications are printed
/// unless `DISCORD_WEBHOOK` is set.
pub(super) async fn run() -> Result<()> {
    let replay = load_replay_cfg()?;
    let rows = load_dump(&replay.input_path)?;
    if rows.is_empty() {
        return Err(anyhow!("Replay input is empty: {}", replay.input_path));
    }

    let cfg = EngineConfig::from_env()?;
    let mut engine = IncidentEngine::new(
        Taxonomy::from_env()?,
        Fingerprinter::new(cfg.strategy, cfg.prefix_len),
        DedupStore::in_memory(cfg.ttl),
    );
    let translator = Translator::from_env();
    let dispatcher = Dispatcher::from_env()?;

    info!(
        "Replay started: {} candidates from {}",
        rows.len(),
        replay.input_path
    );
    info!("Engine: {engine}");

    let batches = to_batches(rows);
    let report = run_cycle(&mut engine, &batches, &translator, &dispatcher).await;

    info!(
        "Replay complete: delivered={}, failed={}",
        report.delivered, report.failed
    );
    Ok(())
}
