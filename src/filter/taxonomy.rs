//! Data-driven keyword taxonomy.
//!
//! A [`TaxonomyDoc`] is the swappable JSON form (every field optional,
//! missing fields fall back to the built-in tables). It is compiled once into
//! a [`Taxonomy`] whose term sets know, per term, whether to match against
//! the raw title (CJK, no case) or the lowercased title (Latin).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::filter::keywords::{
    CHANNEL_KEYWORDS, CONFIRM_KEYWORDS, COUNTRY_KEYWORDS, DEFAULT_FLAG, EXCLUDE_KEYWORDS,
    EXPLOSION_KEYWORDS, FACILITY_KEYWORDS, FATALITY_KEYWORDS, FIRE_KEYWORDS, INJURY_KEYWORDS,
    METAPHOR_KEYWORDS, NOISE_KEYWORDS,
};
use crate::filter::kinds::Channel;

// ───────────────────────────── Haystack ──────────────────────────────────

/// Returns `true` for scripts without a case concept that are matched raw
/// (Han, kana, hangul).
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // hiragana + katakana
        | '\u{3400}'..='\u{4DBF}' // CJK ext A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified
        | '\u{AC00}'..='\u{D7AF}' // hangul
        | '\u{F900}'..='\u{FAFF}' // compatibility ideographs
        | '\u{20000}'..='\u{2A6DF}')
}

/// A title prepared for dual-path matching.
pub struct Haystack {
    pub raw: String,
    pub lower: String,
}

impl Haystack {
    pub fn new(text: &str) -> Self {
        Self {
            raw: text.to_string(),
            lower: text.to_lowercase(),
        }
    }
}

// ───────────────────────────── Term sets ─────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    text: String,
    raw_path: bool,
}

impl Term {
    fn new(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let raw_path = s.chars().any(is_cjk);
        let text = if raw_path { s.to_string() } else { s.to_lowercase() };
        Some(Self { text, raw_path })
    }

    fn found_in(&self, hay: &Haystack) -> bool {
        if self.raw_path {
            hay.raw.contains(&self.text)
        } else {
            hay.lower.contains(&self.text)
        }
    }
}

/// Ordered set of terms. Declaration order is preserved for first-match scans.
#[derive(Debug, Clone, Default)]
pub struct TermSet {
    terms: Vec<Term>,
}

impl TermSet {
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        Self {
            terms: terms.iter().filter_map(|t| Term::new(t.as_ref())).collect(),
        }
    }

    pub fn any(&self, hay: &Haystack) -> bool {
        self.terms.iter().any(|t| t.found_in(hay))
    }

    /// First term in declaration order that occurs in the title.
    pub fn first_match(&self, hay: &Haystack) -> Option<&str> {
        self.terms
            .iter()
            .find(|t| t.found_in(hay))
            .map(|t| t.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.text.as_str())
    }
}

// ───────────────────────────── JSON document ─────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub channel: Channel,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryEntry {
    pub flag: String,
    pub terms: Vec<String>,
}

/// Swappable taxonomy document. Missing fields take the built-in value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyDoc {
    pub fire: Vec<String>,
    pub explosion: Vec<String>,
    pub facility: Vec<String>,
    pub exclude: Vec<String>,
    pub metaphor: Vec<String>,
    pub confirm: Vec<String>,
    pub fatality: Vec<String>,
    pub injury: Vec<String>,
    pub noise: Vec<String>,
    /// Precedence order: first entry wins.
    pub channels: Vec<ChannelEntry>,
    /// Scan order: first entry wins.
    pub countries: Vec<CountryEntry>,
    pub default_flag: String,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for TaxonomyDoc {
    fn default() -> Self {
        Self {
            fire: owned(FIRE_KEYWORDS),
            explosion: owned(EXPLOSION_KEYWORDS),
            facility: owned(FACILITY_KEYWORDS),
            exclude: owned(EXCLUDE_KEYWORDS),
            metaphor: owned(METAPHOR_KEYWORDS),
            confirm: owned(CONFIRM_KEYWORDS),
            fatality: owned(FATALITY_KEYWORDS),
            injury: owned(INJURY_KEYWORDS),
            noise: owned(NOISE_KEYWORDS),
            channels: CHANNEL_KEYWORDS
                .iter()
                .map(|&(channel, terms)| ChannelEntry {
                    channel,
                    terms: owned(terms),
                })
                .collect(),
            countries: COUNTRY_KEYWORDS
                .iter()
                .map(|&(flag, terms)| CountryEntry {
                    flag: flag.to_string(),
                    terms: owned(terms),
                })
                .collect(),
            default_flag: DEFAULT_FLAG.to_string(),
        }
    }
}

// ───────────────────────────── Taxonomy ──────────────────────────────────

/// Compiled, immutable taxonomy shared by every component of a run.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub fire: TermSet,
    pub explosion: TermSet,
    pub facility: TermSet,
    pub exclude: TermSet,
    pub metaphor: TermSet,
    pub confirm: TermSet,
    pub fatality: TermSet,
    pub injury: TermSet,
    pub noise: TermSet,
    pub channels: Vec<(Channel, TermSet)>,
    pub countries: Vec<(String, TermSet)>,
    pub default_flag: String,
}

impl Taxonomy {
    pub fn builtin() -> Self {
        Self::compile(&TaxonomyDoc::default())
    }

    pub fn compile(doc: &TaxonomyDoc) -> Self {
        Self {
            fire: TermSet::new(&doc.fire),
            explosion: TermSet::new(&doc.explosion),
            facility: TermSet::new(&doc.facility),
            exclude: TermSet::new(&doc.exclude),
            metaphor: TermSet::new(&doc.metaphor),
            confirm: TermSet::new(&doc.confirm),
            fatality: TermSet::new(&doc.fatality),
            injury: TermSet::new(&doc.injury),
            noise: TermSet::new(&doc.noise),
            channels: doc
                .channels
                .iter()
                .filter(|e| e.channel != Channel::General)
                .map(|e| (e.channel, TermSet::new(&e.terms)))
                .collect(),
            countries: doc
                .countries
                .iter()
                .map(|e| (e.flag.clone(), TermSet::new(&e.terms)))
                .collect(),
            default_flag: doc.default_flag.clone(),
        }
    }

    /// Load a JSON taxonomy document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read taxonomy {}", path.display()))?;
        let doc: TaxonomyDoc = serde_json::from_str(&raw)
            .with_context(|| format!("invalid taxonomy JSON in {}", path.display()))?;
        let taxonomy = Self::compile(&doc);
        info!("Taxonomy loaded from {}", path.display());
        Ok(taxonomy)
    }

    /// `TAXONOMY_PATH` if set, otherwise the built-in tables.
    pub fn from_env() -> Result<Self> {
        let taxonomy = match std::env::var("TAXONOMY_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim()))?,
            _ => Self::builtin(),
        };
        if taxonomy.fire.is_empty() && taxonomy.explosion.is_empty() {
            warn!("Taxonomy has no fire or explosion terms, nothing will match");
        }
        info!(
            "Taxonomy: {} event, {} facility, {} exclude terms",
            taxonomy.fire.len() + taxonomy.explosion.len(),
            taxonomy.facility.len(),
            taxonomy.exclude.len()
        );
        for problem in taxonomy.conflicts() {
            warn!("Taxonomy: {problem}");
        }
        Ok(taxonomy)
    }

    /// Overlaps that would silently change matcher or classifier results.
    pub fn conflicts(&self) -> Vec<String> {
        let mut out = Vec::new();

        for term in self.exclude.iter() {
            if self.fire.iter().chain(self.explosion.iter()).any(|t| t == term) {
                out.push(format!("'{term}' is both an exclude and an event term"));
            }
        }

        let mut owner: HashMap<&str, Channel> = HashMap::new();
        for (channel, terms) in &self.channels {
            for term in terms.iter() {
                if let Some(prev) = owner.insert(term, *channel) {
                    if prev != *channel {
                        out.push(format!("'{term}' is in both {prev:?} and {channel:?}"));
                    }
                }
            }
        }

        let mut seen_channels = Vec::new();
        for (channel, _) in &self.channels {
            if seen_channels.contains(channel) {
                out.push(format!("{channel:?} is listed twice in the channel table"));
            }
            seen_channels.push(*channel);
        }

        out
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_terms_take_raw_path() {
        let set = TermSet::new(&["工廠", "Factory"]);
        let hay = Haystack::new("FACTORY 工廠");
        assert_eq!(set.first_match(&hay), Some("工廠"));
        let latin_only = Haystack::new("Big FACTORY");
        assert_eq!(set.first_match(&latin_only), Some("factory"));
    }

    #[test]
    fn empty_terms_are_dropped() {
        let set = TermSet::new(&["", "  ", "fire"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn partial_document_falls_back_to_builtin() {
        let doc: TaxonomyDoc = serde_json::from_str(r#"{"fire": ["burning"]}"#).unwrap();
        let tax = Taxonomy::compile(&doc);
        assert_eq!(tax.fire.iter().collect::<Vec<_>>(), vec!["burning"]);
        assert_eq!(tax.explosion.len(), EXPLOSION_KEYWORDS.len());
        assert_eq!(tax.default_flag, DEFAULT_FLAG);
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        std::fs::write(
            &path,
            r#"{"channels": [{"channel": "ENERGY", "terms": ["turbine"]}]}"#,
        )
        .unwrap();
        let tax = Taxonomy::load(&path).unwrap();
        assert_eq!(tax.channels.len(), 1);
        assert_eq!(tax.channels[0].0, Channel::Energy);
    }

    #[test]
    fn load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Taxonomy::load(&path).is_err());
    }

    #[test]
    fn conflicts_report_cross_channel_terms() {
        let mut doc = TaxonomyDoc::default();
        doc.channels[1].terms.push("chemical".into());
        let tax = Taxonomy::compile(&doc);
        assert!(
            tax.conflicts().iter().any(|c| c.contains("'chemical'")),
            "{:?}",
            tax.conflicts()
        );
    }
}
