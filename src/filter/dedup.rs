//! Persistent fingerprint → first-seen store (SQLite).
//!
//! Loading is all-or-nothing and fail-open: a missing, empty, unreadable or
//! corrupt file yields an empty store. Saving rewrites the whole state into a
//! fresh database next to the target and renames it over the original.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use sqlite::State;
use tracing::{debug, info, warn};

pub const DEFAULT_TTL_HOURS: u64 = 24;

pub struct DedupStore {
    path: Option<PathBuf>,
    entries: HashMap<String, DateTime<Utc>>,
    ttl: TimeDelta,
}

impl DedupStore {
    /// Store without a backing file (tests, replay).
    pub fn in_memory(ttl: TimeDelta) -> Self {
        Self {
            path: None,
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Open the store at `path`. Never fails.
    pub fn open(path: impl Into<PathBuf>, ttl: TimeDelta) -> Self {
        let path = path.into();
        let entries = match std::fs::metadata(&path) {
            Err(_) => {
                info!("No dedup store at {} – starting empty", path.display());
                HashMap::new()
            }
            Ok(meta) if meta.len() == 0 => {
                info!("Dedup store {} is empty – starting empty", path.display());
                HashMap::new()
            }
            Ok(_) => match read_all(&path) {
                Ok(entries) => {
                    info!(
                        "Dedup store opened at {} ({} fingerprints)",
                        path.display(),
                        entries.len()
                    );
                    entries
                }
                Err(e) => {
                    warn!(
                        "Dedup store {} unreadable, treating as empty (fail-open): {e:#}",
                        path.display()
                    );
                    HashMap::new()
                }
            },
        };

        Self {
            path: Some(path),
            entries,
            ttl,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A record exists for `fp`, expired or not.
    pub fn seen(&self, fp: &str) -> bool {
        self.entries.contains_key(fp)
    }

    pub fn first_seen(&self, fp: &str) -> Option<DateTime<Utc>> {
        self.entries.get(fp).copied()
    }

    /// `true` once the cool-down for a recorded `fp` has run out.
    /// Unknown fingerprints have nothing to expire.
    pub fn expired(&self, fp: &str, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        self.entries
            .get(fp)
            .is_some_and(|first| now.signed_duration_since(*first) >= ttl)
    }

    /// Seen and still inside the cool-down: a new occurrence is a duplicate.
    pub fn suppresses(&self, fp: &str, now: DateTime<Utc>) -> bool {
        self.seen(fp) && !self.expired(fp, now, self.ttl)
    }

    /// Record the first acceptance of `fp`. A recurrence after expiry
    /// restarts the cool-down.
    pub fn record(&mut self, fp: &str, at: DateTime<Utc>) {
        if self.suppresses(fp, at) {
            if let Some(first) = self.first_seen(fp) {
                debug!("Dedup: {fp} already recorded at {first}");
            }
            return;
        }
        self.entries.insert(fp.to_string(), at);
    }

    /// Drop expired records. Returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, first| now.signed_duration_since(*first) < ttl);
        before - self.entries.len()
    }

    /// Prune and overwrite the backing file with the full state.
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<()> {
        let pruned = self.prune(now);
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_all(path, &self.entries)?;
        info!(
            "Dedup store saved to {} ({} fingerprints, {} expired pruned)",
            path.display(),
            self.entries.len(),
            pruned
        );
        Ok(())
    }
}

fn read_all(path: &Path) -> Result<HashMap<String, DateTime<Utc>>> {
    let conn = sqlite::open(path)?;
    let mut stmt = conn.prepare("SELECT fingerprint, first_seen FROM seen_events")?;
    let mut entries = HashMap::new();
    while let State::Row = stmt.next()? {
        let fp = stmt.read::<String, _>(0)?;
        let ts = stmt.read::<i64, _>(1)?;
        let at = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| anyhow!("invalid first_seen {ts} for {fp}"))?;
        entries.insert(fp, at);
    }
    Ok(entries)
}

fn write_all(path: &Path, entries: &HashMap<String, DateTime<Utc>>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directory for {}", path.display())
            })?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    if tmp.exists() {
        std::fs::remove_file(&tmp)
            .with_context(|| format!("failed to remove stale {}", tmp.display()))?;
    }

    let mut rows: Vec<(&String, &DateTime<Utc>)> = entries.iter().collect();
    rows.sort();

    {
        let conn = sqlite::open(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        conn.execute(
            "CREATE TABLE seen_events (
                fingerprint TEXT    PRIMARY KEY,
                first_seen  INTEGER NOT NULL
             );
             BEGIN;",
        )?;
        let mut stmt =
            conn.prepare("INSERT INTO seen_events (fingerprint, first_seen) VALUES (?, ?)")?;
        for (fp, at) in rows {
            stmt.reset()?;
            stmt.bind((1, fp.as_str()))?;
            stmt.bind((2, at.timestamp()))?;
            stmt.next()?;
        }
        drop(stmt);
        conn.execute("COMMIT;")?;
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn missing_file_bootstraps_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::open(dir.path().join("seen.sqlite"), TimeDelta::hours(24));
        assert!(store.is_empty());
    }

    #[test]
    fn empty_file_bootstraps_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.sqlite");
        std::fs::write(&path, b"").unwrap();
        assert!(DedupStore::open(&path, TimeDelta::hours(24)).is_empty());
    }

    #[test]
    fn save_then_reload_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("seen.sqlite");

        let mut store = DedupStore::open(&path, TimeDelta::hours(24));
        store.record("aaa", t0());
        store.record("bbb", t0() + TimeDelta::minutes(5));
        store.save(t0() + TimeDelta::minutes(10)).unwrap();

        let reloaded = DedupStore::open(&path, TimeDelta::hours(24));
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.first_seen("aaa"), Some(t0()));
        assert_eq!(
            reloaded.first_seen("bbb"),
            Some(t0() + TimeDelta::minutes(5))
        );
    }

    #[test]
    fn save_is_a_full_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.sqlite");

        let mut first = DedupStore::open(&path, TimeDelta::hours(1));
        first.record("old", t0());
        first.save(t0()).unwrap();

        // Two hours later "old" has expired and is pruned on save.
        let later = t0() + TimeDelta::hours(2);
        let mut second = DedupStore::open(&path, TimeDelta::hours(1));
        second.record("new", later);
        second.save(later).unwrap();

        let reloaded = DedupStore::open(&path, TimeDelta::hours(1));
        assert!(!reloaded.seen("old"));
        assert!(reloaded.seen("new"));
    }

    #[test]
    fn corrupt_file_is_treated_as_empty_and_can_be_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.sqlite");
        std::fs::write(&path, b"definitely not an sqlite database, just noise").unwrap();

        let mut store = DedupStore::open(&path, TimeDelta::hours(24));
        assert!(store.is_empty());

        store.record("fresh", t0());
        store.save(t0()).unwrap();
        assert!(DedupStore::open(&path, TimeDelta::hours(24)).seen("fresh"));
    }

    #[test]
    fn cool_down_expiry() {
        let mut store = DedupStore::in_memory(TimeDelta::hours(24));
        store.record("fp", t0());

        assert!(store.suppresses("fp", t0() + TimeDelta::hours(23)));
        assert!(!store.expired("fp", t0() + TimeDelta::hours(23), store.ttl()));
        assert!(store.expired("fp", t0() + TimeDelta::hours(24), store.ttl()));
        assert!(!store.suppresses("fp", t0() + TimeDelta::hours(25)));
        assert!(!store.expired("unknown", t0(), store.ttl()));
    }

    #[test]
    fn record_keeps_first_seen_inside_window_and_restarts_after() {
        let mut store = DedupStore::in_memory(TimeDelta::hours(24));
        store.record("fp", t0());
        store.record("fp", t0() + TimeDelta::hours(1));
        assert_eq!(store.first_seen("fp"), Some(t0()));

        let recurrence = t0() + TimeDelta::hours(30);
        store.record("fp", recurrence);
        assert_eq!(store.first_seen("fp"), Some(recurrence));
    }
}
