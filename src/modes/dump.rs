use crate::feeds::{FeedCfg, FeedFetcher};
use anyhow::Result;
use tracing::info;

use super::shared::{to_dump, write_dump};

/// Fetch every feed once and write the raw candidates as JSONL, for later
/// `replay` runs. No matching happens here.
pub(super) async fn run() -> Result<()> {
    let output_path =
        std::env::var("DUMP_OUTPUT_PATH").unwrap_or_else(|_| "./candidates.jsonl".into());
    let feed_cfg = FeedCfg::from_env()?;
    let fetcher = FeedFetcher::new(&feed_cfg)?;

    info!("Dumping {} feeds to {output_path}", feed_cfg.sources.len());
    let batches = fetcher.fetch_all(&feed_cfg.sources).await;
    let rows = to_dump(&batches);
    write_dump(&output_path, &rows)?;

    info!(
        "Dump complete: {} candidates written to {}",
        rows.len(),
        output_path
    );
    Ok(())
}
