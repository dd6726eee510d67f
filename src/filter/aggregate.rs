//! Per-run grouping of accepted candidates by fingerprint.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::filter::dedup::DedupStore;
use crate::filter::{Candidate, Published};

/// An accepted candidate with its dedup key.
pub struct Keyed {
    pub fingerprint: String,
    pub candidate: Candidate,
}

/// One new incident, possibly reported by several outlets.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedEvent {
    pub fingerprint: String,
    pub representative_title: String,
    /// Every title of the group, in arrival order.
    pub source_titles: Vec<String>,
    pub link: String,
    pub published_at: Published,
    pub origin_locale: String,
    pub source_count: usize,
}

/// Group by fingerprint in first-arrival order, skipping fingerprints the
/// store still suppresses. Returns the new events and the number of
/// candidates dropped as duplicates of earlier runs.
pub fn aggregate(
    accepted: Vec<Keyed>,
    store: &DedupStore,
    now: DateTime<Utc>,
) -> (Vec<AggregatedEvent>, usize) {
    let mut groups: Vec<(String, Vec<Candidate>)> = Vec::new();
    let mut duplicates = 0usize;

    for Keyed {
        fingerprint,
        candidate,
    } in accepted
    {
        if store.suppresses(&fingerprint, now) {
            debug!("Dedup: '{}' suppressed ({fingerprint})", candidate.title);
            duplicates += 1;
            continue;
        }
        match groups.iter_mut().find(|(fp, _)| *fp == fingerprint) {
            Some((_, members)) => members.push(candidate),
            None => groups.push((fingerprint, vec![candidate])),
        }
    }

    let events = groups
        .into_iter()
        .map(|(fingerprint, members)| build_event(fingerprint, members))
        .collect();
    (events, duplicates)
}

fn build_event(fingerprint: String, mut members: Vec<Candidate>) -> AggregatedEvent {
    let rep = representative_index(&members);
    let source_titles: Vec<String> = members.iter().map(|c| c.title.clone()).collect();
    let source_count = members.len();
    if source_count > 1 {
        debug!(
            "Aggregated {source_count} titles under {fingerprint}: {:?}",
            source_titles
        );
    }
    let chosen = members.swap_remove(rep);

    AggregatedEvent {
        fingerprint,
        representative_title: chosen.title,
        source_titles,
        link: chosen.link,
        published_at: chosen.published_at,
        origin_locale: chosen.origin_locale,
        source_count,
    }
}

/// Index of the title at the (lower) median position by character length.
/// Equal lengths keep arrival order.
pub fn representative_index(members: &[Candidate]) -> usize {
    let mut order: Vec<usize> = (0..members.len()).collect();
    order.sort_by_key(|&i| members[i].title.chars().count());
    order[(order.len().saturating_sub(1)) / 2]
}
