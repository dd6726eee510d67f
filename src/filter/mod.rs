//! Incident matching, fingerprinting, deduplication and classification
//! for industrial fire / explosion headlines.
//!
//! Handles **both Latin and CJK** titles – the monitored feeds mix English
//! wire copy with Traditional Chinese local news.
pub mod aggregate;
pub mod classify;
pub mod dedup;
pub mod fingerprint;
pub mod keywords;
pub mod kinds;
pub mod matcher;
pub mod taxonomy;


use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

pub use crate::filter::aggregate::AggregatedEvent;
pub use crate::filter::classify::Classification;
pub use crate::filter::dedup::DedupStore;
pub use crate::filter::fingerprint::Fingerprinter;
pub use crate::filter::kinds::{Channel, FingerprintStrategy, MatchMode, Severity};
pub use crate::filter::taxonomy::Taxonomy;

use crate::filter::aggregate::{Keyed, aggregate};
use crate::filter::dedup::DEFAULT_TTL_HOURS;
use crate::filter::fingerprint::DEFAULT_PREFIX_LEN;
use crate::filter::matcher::assess;

// ───────────────────────────── Candidates ────────────────────────────────

/// Publication time of a feed item. Unparsable dates degrade to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    At(DateTime<Utc>),
    Unknown,
}

impl Published {
    /// Accepts RFC 3339 (Atom) and RFC 2822 (RSS) dates.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Unknown;
        };
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .map(|dt| Self::At(dt.with_timezone(&Utc)))
            .unwrap_or(Self::Unknown)
    }

    pub fn as_rfc3339(&self) -> Option<String> {
        match self {
            Self::At(dt) => Some(dt.to_rfc3339()),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Published {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Drop the trailing ` - Publisher` attribution that news aggregators append
/// to every title. A known `publisher` is removed exactly; otherwise the last
/// ` - ` segment goes. Titles that would be left empty are kept whole.
pub fn strip_publisher<'a>(title: &'a str, publisher: Option<&str>) -> &'a str {
    let title = title.trim();
    if let Some(publisher) = publisher.map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(head) = title
            .strip_suffix(publisher)
            .and_then(|rest| rest.strip_suffix(" - "))
            .filter(|head| !head.trim().is_empty())
        {
            return head.trim_end();
        }
    }
    match title.rsplit_once(" - ") {
        Some((head, tail)) if !head.trim().is_empty() && !tail.trim().is_empty() => {
            head.trim_end()
        }
        _ => title,
    }
}

/// One raw headline awaiting classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub published_at: Published,
    pub origin_locale: String,
}

/// Everything one feed produced in this run, with the feed's matcher policy.
#[derive(Debug, Clone)]
pub struct FeedBatch {
    pub feed: String,
    pub mode: MatchMode,
    pub candidates: Vec<Candidate>,
}

/// An aggregated event plus its routing metadata, ready for dispatch.
#[derive(Debug, Clone)]
pub struct Incident {
    pub event: AggregatedEvent,
    pub classification: Classification,
}

/// Counters for one run of [`IncidentEngine::process`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub events: usize,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates={}, accepted={}, rejected={}, duplicates={}, new events={}",
            self.candidates, self.accepted, self.rejected, self.duplicates, self.events
        )
    }
}

// ─────────────────────────── Engine config ───────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub store_path: String,
    pub ttl: TimeDelta,
    pub strategy: FingerprintStrategy,
    pub prefix_len: usize,
}

impl EngineConfig {
    /// Construct from environment variables.
    ///
    /// | Env var                  | Default                | Purpose                          |
    /// |--------------------------|------------------------|----------------------------------|
    /// | `SEEN_DB_PATH`           | `./seen_events.sqlite` | Dedup store file                 |
    /// | `DEDUP_TTL_HOURS`        | `24`                   | Cool-down before re-notifying    |
    /// | `FINGERPRINT_STRATEGY`   | `tuple`                | `tuple` or `normalized`          |
    /// | `FINGERPRINT_PREFIX_LEN` | `32`                   | Normalized prefix (25..=40)      |
    pub fn from_env() -> Result<Self> {
        let ttl_hours: u64 = std::env::var("DEDUP_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_TTL_HOURS);
        let ttl = i64::try_from(ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .ok_or_else(|| anyhow!("DEDUP_TTL_HOURS is too large"))?;

        let strategy = match std::env::var("FINGERPRINT_STRATEGY") {
            Ok(raw) => FingerprintStrategy::from_name(&raw)
                .ok_or_else(|| anyhow!("Unknown FINGERPRINT_STRATEGY '{raw}'"))?,
            Err(_) => FingerprintStrategy::default(),
        };
        let prefix_len = std::env::var("FINGERPRINT_PREFIX_LEN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PREFIX_LEN);

        Ok(Self {
            store_path: std::env::var("SEEN_DB_PATH")
                .unwrap_or_else(|_| "./seen_events.sqlite".into()),
            ttl,
            strategy,
            prefix_len,
        })
    }
}

// ─────────────────────────── Incident engine ─────────────────────────────

/// Run context: taxonomy, fingerprinter and dedup store, built once and
/// threaded through every stage.
pub struct IncidentEngine {
    taxonomy: Taxonomy,
    fingerprinter: Fingerprinter,
    store: DedupStore,
}

impl IncidentEngine {
    pub fn new(taxonomy: Taxonomy, fingerprinter: Fingerprinter, store: DedupStore) -> Self {
        Self {
            taxonomy,
            fingerprinter,
            store,
        }
    }

    /// Taxonomy from `TAXONOMY_PATH` (or built-in) + [`EngineConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let cfg = EngineConfig::from_env()?;
        let taxonomy = Taxonomy::from_env()?;
        let store = DedupStore::open(&cfg.store_path, cfg.ttl);
        Ok(Self::new(
            taxonomy,
            Fingerprinter::new(cfg.strategy, cfg.prefix_len),
            store,
        ))
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// match → fingerprint → dedup → aggregate → classify.
    ///
    /// Does not touch the store: call [`commit`](Self::commit) for every
    /// incident that was actually delivered.
    pub fn process(&self, batches: &[FeedBatch], now: DateTime<Utc>) -> (Vec<Incident>, RunStats) {
        let mut stats = RunStats::default();
        let mut accepted = Vec::new();

        for batch in batches {
            for candidate in &batch.candidates {
                stats.candidates += 1;
                let verdict = assess(&self.taxonomy, &candidate.title, batch.mode);
                if !verdict.is_accepted() {
                    debug!("[{}] rejected '{}': {verdict:?}", batch.feed, candidate.title);
                    stats.rejected += 1;
                    continue;
                }
                let fingerprint = self.fingerprinter.fingerprint(&self.taxonomy, &candidate.title);
                debug!("[{}] accepted '{}' → {fingerprint}", batch.feed, candidate.title);
                accepted.push(Keyed {
                    fingerprint,
                    candidate: candidate.clone(),
                });
            }
        }
        stats.accepted = accepted.len();

        let (events, duplicates) = aggregate(accepted, &self.store, now);
        stats.duplicates = duplicates;
        stats.events = events.len();

        let incidents = events
            .into_iter()
            .map(|event| {
                let classification = classify::classify(
                    &self.taxonomy,
                    &event.representative_title,
                    &event.link,
                );
                Incident {
                    event,
                    classification,
                }
            })
            .collect();

        info!("Run processed: {stats}");
        (incidents, stats)
    }

    /// Mark an incident as surfaced.
    pub fn commit(&mut self, incident: &Incident, now: DateTime<Utc>) {
        self.store.record(&incident.event.fingerprint, now);
    }

    /// Persist the store (full overwrite). Called once at the end of a run.
    pub fn persist(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.store.save(now)
    }
}

impl fmt::Display for IncidentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IncidentEngine(strategy={:?}, ttl={}h, seen={}, channels={:?}, countries={})",
            self.fingerprinter.strategy(),
            self.store.ttl().num_hours(),
            self.store.len(),
            self.taxonomy
                .channels
                .iter()
                .map(|(c, _)| *c)
                .collect::<Vec<_>>(),
            self.taxonomy.countries.len(),
        )
    }
}
