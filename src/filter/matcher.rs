//! Incident relevance check.

use tracing::debug;

use crate::filter::kinds::MatchMode;
use crate::filter::taxonomy::{Haystack, Taxonomy};

/// Why a title was accepted or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Hit an exclude term. Absolute: nothing overrides it.
    Excluded(String),
    /// Figurative use of an event word with no incident confirmation.
    Metaphor(String),
    NoEvent,
    NoFacility,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Run the full decision chain for one title.
pub fn assess(tax: &Taxonomy, title: &str, mode: MatchMode) -> Verdict {
    let hay = Haystack::new(title);

    if let Some(term) = tax.exclude.first_match(&hay) {
        return Verdict::Excluded(term.to_string());
    }

    if !tax.fire.any(&hay) && !tax.explosion.any(&hay) {
        return Verdict::NoEvent;
    }

    if let Some(term) = tax.metaphor.first_match(&hay) {
        if !tax.confirm.any(&hay) {
            return Verdict::Metaphor(term.to_string());
        }
        debug!("Metaphor '{term}' overridden by confirmation phrase");
    }

    if mode == MatchMode::Strict && !tax.facility.any(&hay) {
        return Verdict::NoFacility;
    }

    Verdict::Accepted
}
