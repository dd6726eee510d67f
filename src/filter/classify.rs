//! Channel / country / severity enrichment. Every table is first-match-wins
//! in declaration order, independent of where terms sit in the text.

use crate::filter::kinds::{Channel, Severity};
use crate::filter::taxonomy::{Haystack, Taxonomy};

/// Routing and priority metadata for one aggregated event. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub channel: Channel,
    pub severity: Severity,
    pub country_flag: String,
}

pub fn classify(tax: &Taxonomy, title: &str, link: &str) -> Classification {
    Classification {
        channel: classify_channel(tax, title),
        severity: severity(tax, title),
        country_flag: detect_country(tax, title, link),
    }
}

/// First channel in the precedence table with a matching term; GENERAL
/// otherwise.
pub fn classify_channel(tax: &Taxonomy, title: &str) -> Channel {
    let hay = Haystack::new(title);
    tax.channels
        .iter()
        .find(|(_, terms)| terms.any(&hay))
        .map_or(Channel::General, |(channel, _)| *channel)
}

pub(crate) fn scan_country<'a>(tax: &'a Taxonomy, hay: &Haystack) -> Option<&'a str> {
    tax.countries
        .iter()
        .find(|(_, terms)| terms.any(hay))
        .map(|(flag, _)| flag.as_str())
}

/// Scan title + link; absence of any match yields the default flag.
pub fn detect_country(tax: &Taxonomy, title: &str, link: &str) -> String {
    let hay = Haystack::new(&format!("{title} {link}"));
    scan_country(tax, &hay)
        .unwrap_or(&tax.default_flag)
        .to_string()
}

/// Highest tier of the fixed priority table that matches.
pub fn severity(tax: &Taxonomy, title: &str) -> Severity {
    let hay = Haystack::new(title);
    Severity::PRIORITY
        .into_iter()
        .find(|tier| {
            let terms = match tier {
                Severity::Fatal => &tax.fatality,
                Severity::Injury => &tax.injury,
                Severity::Explosion => &tax.explosion,
                Severity::Fire => &tax.fire,
                Severity::Unclassified => return false,
            };
            terms.any(&hay)
        })
        .unwrap_or(Severity::Unclassified)
}
