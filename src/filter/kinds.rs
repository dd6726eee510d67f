// ───────────────────────────── Match mode ────────────────────────────────

use serde::{Deserialize, Serialize};

/// Matcher policy for a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Event term + facility term required (domestic / local feeds).
    #[default]
    Strict,
    /// Event term alone is enough (broad international feeds).
    Relaxed,
}

// ───────────────────────────── Event kinds ───────────────────────────────

/// The incident type token used by the tuple fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Explosion,
    Fire,
}

impl EventKind {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Explosion => "explosion",
            Self::Fire => "fire",
        }
    }
}

// ───────────────────────────── Channels ──────────────────────────────────

/// Notification routing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Chemical,
    Energy,
    Tech,
    Building,
    General, // nothing more specific matched
}

impl Channel {
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Chemical => "☣️",
            Self::Energy => "⚡",
            Self::Tech => "💾",
            Self::Building => "🏢",
            Self::General => "🏭",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Chemical => "化工/石化情報",
            Self::Energy => "能源/儲能情報",
            Self::Tech => "科技/電子廠情報",
            Self::Building => "建築/倉儲情報",
            Self::General => "工業/工廠情報",
        }
    }
}

// ───────────────────────────── Severity ──────────────────────────────────

/// Priority label of an incident. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Fatal,
    Injury,
    Explosion,
    Fire,
    Unclassified,
}

impl Severity {
    /// Top-down evaluation order for the severity table.
    pub const PRIORITY: [Severity; 4] = [Self::Fatal, Self::Injury, Self::Explosion, Self::Fire];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fatal => "🚨 重大傷亡",
            Self::Injury => "⚠️ 有人受傷",
            Self::Explosion => "💥 發生爆炸",
            Self::Fire => "🔥 火警通報",
            Self::Unclassified => "ℹ️ 未分類",
        }
    }
}

// ───────────────────────── Fingerprint strategy ──────────────────────────

/// How a title is turned into a dedup key. One strategy per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintStrategy {
    /// {event, facility, country} tuple. Coarse but robust to rewording.
    #[default]
    Tuple,
    /// Normalized title prefix. Precise but sensitive to rewording.
    Normalized,
}

impl FingerprintStrategy {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tuple" => Some(Self::Tuple),
            "normalized" | "normalised" | "text" => Some(Self::Normalized),
            _ => None,
        }
    }
}
