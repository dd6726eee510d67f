use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::filter::{Candidate, FeedBatch, IncidentEngine, MatchMode, Published};
use crate::notify::{Dispatcher, Notification};
use crate::translate::Translator;

#[derive(Clone)]
pub(super) struct ReplayCfg {
    pub input_path: String,
}

/// One candidate as written by `dump` mode and read back by `replay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct DumpCandidate {
    pub feed: String,
    #[serde(default)]
    pub mode: MatchMode,
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub locale: String,
}

pub(super) fn must_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("Missing env var {key}"))
}

pub(super) fn load_replay_cfg() -> Result<ReplayCfg> {
    Ok(ReplayCfg {
        input_path: must_env("REPLAY_INPUT_PATH")?,
    })
}

/// Flatten batches into dump rows, keeping feed order.
pub(super) fn to_dump(batches: &[FeedBatch]) -> Vec<DumpCandidate> {
    batches
        .iter()
        .flat_map(|batch| {
            batch.candidates.iter().map(|c| DumpCandidate {
                feed: batch.feed.clone(),
                mode: batch.mode,
                title: c.title.clone(),
                link: c.link.clone(),
                published_at: c.published_at.as_rfc3339(),
                locale: c.origin_locale.clone(),
            })
        })
        .collect()
}

/// Regroup dump rows into per-feed batches in first-appearance order.
pub(super) fn to_batches(rows: Vec<DumpCandidate>) -> Vec<FeedBatch> {
    let mut batches: Vec<FeedBatch> = Vec::new();
    for row in rows {
        let candidate = Candidate {
            title: row.title,
            link: row.link,
            published_at: Published::parse(row.published_at.as_deref()),
            origin_locale: row.locale,
        };
        match batches
            .iter_mut()
            .find(|b| b.feed == row.feed && b.mode == row.mode)
        {
            Some(batch) => batch.candidates.push(candidate),
            None => batches.push(FeedBatch {
                feed: row.feed,
                mode: row.mode,
                candidates: vec![candidate],
            }),
        }
    }
    batches
}

pub(super) fn write_dump(path: &str, rows: &[DumpCandidate]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directory for dump file {path}")
            })?;
        }
    }

    let file = File::create(path).with_context(|| format!("failed to create dump file {path}"))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        let line = serde_json::to_string(row)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub(super) fn load_dump(path: &str) -> Result<Vec<DumpCandidate>> {
    let file = File::open(path).with_context(|| format!("failed to open replay file {path}"))?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let row: DumpCandidate = serde_json::from_str(&line)
            .with_context(|| format!("invalid JSON at line {}", idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// What one cycle did after matching.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct CycleReport {
    pub delivered: usize,
    pub failed: usize,
}

/// One serialized pipeline pass over already-fetched batches:
/// process → translate → dispatch → commit delivered → persist.
///
/// An incident whose delivery fails is not committed, so the next cycle
/// retries it instead of losing it.
pub(super) async fn run_cycle(
    engine: &mut IncidentEngine,
    batches: &[FeedBatch],
    translator: &Translator,
    dispatcher: &Dispatcher,
) -> CycleReport {
    let now = Utc::now();
    let (incidents, stats) = engine.process(batches, now);
    let mut report = CycleReport::default();

    for incident in &incidents {
        let title = translator
            .translate(
                &incident.event.representative_title,
                &incident.event.origin_locale,
            )
            .await;
        let note = Notification::from_incident(incident, title);
        match dispatcher.dispatch(&note).await {
            Ok(()) => {
                engine.commit(incident, now);
                report.delivered += 1;
            }
            Err(e) => {
                warn!(
                    "Dispatch failed for '{}' – left unrecorded for retry: {e:#}",
                    incident.event.representative_title
                );
                report.failed += 1;
            }
        }
    }

    if incidents.is_empty() {
        if let Err(e) = dispatcher.heartbeat().await {
            warn!("Heartbeat failed: {e:#}");
        }
    }

    if let Err(e) = engine.persist(now) {
        warn!("Failed to persist dedup store: {e:#}");
    }

    info!(
        "Cycle complete: {stats}, delivered={}, failed={}",
        report.delivered, report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DedupStore, Fingerprinter, Taxonomy};
    use chrono::TimeDelta;
    use std::time::Duration;

    fn rows() -> Vec<DumpCandidate> {
        vec![
            DumpCandidate {
                feed: "local".into(),
                mode: MatchMode::Strict,
                title: "台中工廠大火".into(),
                link: "https://news.example.com.tw/a".into(),
                published_at: Some("2025-01-06T08:30:00+00:00".into()),
                locale: "zh-TW".into(),
            },
            DumpCandidate {
                feed: "intl".into(),
                mode: MatchMode::Relaxed,
                title: "Refinery blast kills 5 in Texas".into(),
                link: "https://news.example.org/b".into(),
                published_at: Some("not a date".into()),
                locale: "en-US".into(),
            },
            DumpCandidate {
                feed: "local".into(),
                mode: MatchMode::Strict,
                title: "高雄石化廠氣爆".into(),
                link: String::new(),
                published_at: None,
                locale: "zh-TW".into(),
            },
        ]
    }

    #[test]
    fn dump_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("candidates.jsonl");
        let path = path.to_str().unwrap();
        write_dump(path, &rows()).unwrap();
        assert_eq!(load_dump(path).unwrap(), rows());
    }

    #[test]
    fn rows_regroup_by_feed() {
        let batches = to_batches(rows());
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].feed, "local");
        assert_eq!(batches[0].candidates.len(), 2);
        assert!(matches!(
            batches[0].candidates[0].published_at,
            Published::At(_)
        ));
        assert_eq!(batches[1].candidates[0].published_at, Published::Unknown);
        assert_eq!(to_dump(&batches).len(), 3);
    }

    #[test]
    fn minimal_row_uses_defaults() {
        let row: DumpCandidate =
            serde_json::from_str(r#"{"feed": "f", "title": "Plant fire"}"#).unwrap();
        assert_eq!(row.mode, MatchMode::Strict);
        assert!(row.link.is_empty());
        assert_eq!(row.published_at, None);
    }

    fn engine() -> IncidentEngine {
        IncidentEngine::new(
            Taxonomy::builtin(),
            Fingerprinter::default(),
            DedupStore::in_memory(TimeDelta::hours(24)),
        )
    }

    #[tokio::test]
    async fn failed_dispatch_is_not_recorded() {
        let mut eng = engine();
        let batches = to_batches(rows());
        let broken = Dispatcher::new(
            Some("http://127.0.0.1:9/webhook".into()),
            Duration::from_millis(300),
            false,
        )
        .unwrap();

        let report = run_cycle(&mut eng, &batches, &Translator::disabled(), &broken).await;
        assert_eq!(report.delivered, 0);
        assert_eq!(report.failed, 3);
        assert!(eng.store().is_empty());
    }

    #[tokio::test]
    async fn delivered_incidents_are_not_repeated() {
        let mut eng = engine();
        let batches = to_batches(rows());
        let dry = Dispatcher::new(None, Duration::from_secs(1), false).unwrap();
        let translator = Translator::disabled();

        let first = run_cycle(&mut eng, &batches, &translator, &dry).await;
        assert_eq!(first.delivered, 3);
        let second = run_cycle(&mut eng, &batches, &translator, &dry).await;
        assert_eq!(second, CycleReport::default());
    }
}
