//! Stable dedup keys for accepted titles.

use sha2::{Digest, Sha256};

use crate::filter::classify::scan_country;
use crate::filter::kinds::{EventKind, FingerprintStrategy};
use crate::filter::taxonomy::{Haystack, Taxonomy, TermSet, is_cjk};

/// Observed prefix lengths range from 25 to 40 characters.
pub const MIN_PREFIX_LEN: usize = 25;
pub const MAX_PREFIX_LEN: usize = 40;
pub const DEFAULT_PREFIX_LEN: usize = 32;

/// Pure title → key function. The strategy is fixed for the lifetime of the
/// value so every candidate of a run (and of every run sharing a store) is
/// keyed the same way.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    strategy: FingerprintStrategy,
    prefix_len: usize,
}

impl Fingerprinter {
    pub fn new(strategy: FingerprintStrategy, prefix_len: usize) -> Self {
        Self {
            strategy,
            prefix_len: prefix_len.clamp(MIN_PREFIX_LEN, MAX_PREFIX_LEN),
        }
    }

    pub fn strategy(&self) -> FingerprintStrategy {
        self.strategy
    }

    pub fn fingerprint(&self, tax: &Taxonomy, title: &str) -> String {
        let material = match self.strategy {
            FingerprintStrategy::Tuple => tuple_key(tax, title),
            FingerprintStrategy::Normalized => {
                let norm = normalize(tax, title, self.prefix_len);
                if norm.is_empty() {
                    // Nothing letter-like survived; fall back to the raw title
                    // so unrelated titles do not share the empty key.
                    title.trim().to_string()
                } else {
                    norm
                }
            }
        };
        hex::encode(Sha256::digest(material.as_bytes()))
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(FingerprintStrategy::default(), DEFAULT_PREFIX_LEN)
    }
}

// ───────────────────────── Normalized-text strategy ──────────────────────

/// Lowercase, drop digits, drop noise words, keep only letters (CJK
/// ideographs are letters too), truncate to `prefix_len` characters.
pub fn normalize(tax: &Taxonomy, title: &str, prefix_len: usize) -> String {
    let no_digits: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_numeric())
        .collect();
    let stripped = strip_noise(&tax.noise, &no_digits);
    stripped
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(prefix_len)
        .collect()
}

fn strip_noise(noise: &TermSet, text: &str) -> String {
    let mut out = text.to_string();
    for word in noise.iter() {
        if word.chars().any(is_cjk) {
            out = out.replace(word, "");
        } else {
            out = remove_word(&out, word);
        }
    }
    out
}

/// Remove whole-word occurrences of `word` ("live" but not "delivery").
fn remove_word(text: &str, word: &str) -> String {
    let boundary = |c: Option<char>| c.is_none_or(|c| !c.is_alphanumeric());

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(word) {
        let end = pos + word.len();
        let before = rest[..pos].chars().next_back().or_else(|| out.chars().next_back());
        let after = rest[end..].chars().next();
        out.push_str(&rest[..pos]);
        if !(boundary(before) && boundary(after)) {
            out.push_str(&rest[pos..end]);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

// ───────────────────────── Tuple-extraction strategy ─────────────────────

/// Explosion is checked before fire; a title mentioning both is an explosion.
pub fn event_kind(tax: &Taxonomy, hay: &Haystack) -> Option<EventKind> {
    if tax.explosion.any(hay) {
        Some(EventKind::Explosion)
    } else if tax.fire.any(hay) {
        Some(EventKind::Fire)
    } else {
        None
    }
}

/// `event|facility|country`, each part the first declared match or `-`.
pub fn tuple_key(tax: &Taxonomy, title: &str) -> String {
    let hay = Haystack::new(title);
    let event = event_kind(tax, &hay).map_or("-", |k| k.token());
    let facility = tax.facility.first_match(&hay).unwrap_or("-");
    let country = scan_country(tax, &hay).unwrap_or("-");
    format!("{event}|{facility}|{country}")
}
