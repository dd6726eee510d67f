//! Feed retrieval: RSS / Atom over HTTP, parsed with `feed-rs`.
//!
//! Feeds are fetched concurrently; each fetch is bounded by a timeout and a
//! failing feed only costs its own batch.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures_util::future::join_all;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::filter::{self, Candidate, FeedBatch, MatchMode, Published};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; fire_news/0.1)";

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Remove the trailing ` - Publisher` that aggregators append to titles.
    #[serde(default = "default_strip_publisher")]
    pub strip_publisher: bool,
}

fn default_locale() -> String {
    "zh-TW".into()
}

fn default_strip_publisher() -> bool {
    true
}

/// Domestic Chinese-language search (strict) and an international English
/// search (relaxed), both limited to the last 24 hours.
pub fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource {
            name: "工業/工廠情報".into(),
            url: "https://news.google.com/rss/search?q=\"工廠\"+(火災+OR+爆炸+OR+火警)+when:24h&hl=zh-TW&gl=TW&ceid=TW:zh-tw".into(),
            mode: MatchMode::Strict,
            locale: "zh-TW".into(),
            strip_publisher: true,
        },
        FeedSource {
            name: "全球工業警報".into(),
            url: "https://news.google.com/rss/search?q=(\"factory\"+OR+\"industrial\")+(fire+OR+explosion)+when:24h&hl=en-US&gl=US&ceid=US:en".into(),
            mode: MatchMode::Relaxed,
            locale: "en-US".into(),
            strip_publisher: true,
        },
    ]
}

pub fn load_sources(path: &Path) -> Result<Vec<FeedSource>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read feed list {}", path.display()))?;
    let sources: Vec<FeedSource> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid feed list JSON in {}", path.display()))?;
    if sources.is_empty() {
        return Err(anyhow!("Feed list {} is empty", path.display()));
    }
    Ok(sources)
}

#[derive(Debug, Clone)]
pub struct FeedCfg {
    pub sources: Vec<FeedSource>,
    pub timeout: Duration,
    pub max_items: usize,
}

impl FeedCfg {
    /// | Env var             | Default    | Purpose                          |
    /// |---------------------|------------|----------------------------------|
    /// | `FEEDS_PATH`        | (built-in) | JSON array of feed sources       |
    /// | `FEED_TIMEOUT_SECS` | `15`       | Per-feed fetch timeout           |
    /// | `FEED_MAX_ITEMS`    | `10`       | Items taken from the top of feed |
    pub fn from_env() -> Result<Self> {
        let sources = match std::env::var("FEEDS_PATH") {
            Ok(path) if !path.trim().is_empty() => load_sources(Path::new(path.trim()))?,
            _ => default_sources(),
        };
        let timeout_secs: u64 = std::env::var("FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(15);
        let max_items: usize = std::env::var("FEED_MAX_ITEMS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);

        Ok(Self {
            sources,
            timeout: Duration::from_secs(timeout_secs),
            max_items,
        })
    }
}

/// Turn a raw RSS / Atom document into candidates. Entries without a title
/// are dropped; missing or unparsable dates become [`Published::Unknown`].
/// With `strip_publisher` the outlet suffix is cut before matching, so the
/// same story from two outlets keys the same way.
pub fn parse_feed(
    bytes: &[u8],
    locale: &str,
    strip_publisher: bool,
    max_items: usize,
) -> Result<Vec<Candidate>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;
    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let raw = entry.title.map(|t| t.content)?;
            let title = if strip_publisher {
                filter::strip_publisher(&raw, entry.source.as_deref()).to_string()
            } else {
                raw.trim().to_string()
            };
            if title.is_empty() {
                return None;
            }
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let published_at = entry
                .published
                .or(entry.updated)
                .map_or(Published::Unknown, Published::At);
            Some(Candidate {
                title,
                link,
                published_at,
                origin_locale: locale.to_string(),
            })
        })
        .take(max_items)
        .collect())
}

pub struct FeedFetcher {
    http: HttpClient,
    timeout: Duration,
    max_items: usize,
}

impl FeedFetcher {
    pub fn new(cfg: &FeedCfg) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(cfg.timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build feed HTTP client")?;
        Ok(Self {
            http,
            timeout: cfg.timeout,
            max_items: cfg.max_items,
        })
    }

    pub async fn fetch(&self, source: &FeedSource) -> Result<Vec<Candidate>> {
        let resp = self
            .http
            .get(&source.url)
            .send()
            .await
            .context("feed fetch failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("feed returned {}", resp.status()));
        }
        let bytes = resp.bytes().await.context("Failed to read feed body")?;
        parse_feed(
            &bytes,
            &source.locale,
            source.strip_publisher,
            self.max_items,
        )
    }

    /// Fetch every source concurrently. A failed or timed-out feed is logged
    /// and yields an empty batch; the others are unaffected.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<FeedBatch> {
        let fetches = sources.iter().map(|source| async move {
            let candidates =
                match tokio::time::timeout(self.timeout, self.fetch(source)).await {
                    Ok(Ok(items)) => {
                        info!("Feed '{}': {} items", source.name, items.len());
                        items
                    }
                    Ok(Err(e)) => {
                        warn!("Feed '{}' failed, skipping: {e:#}", source.name);
                        Vec::new()
                    }
                    Err(_elapsed) => {
                        warn!("Feed '{}' timed out, skipping", source.name);
                        Vec::new()
                    }
                };
            FeedBatch {
                feed: source.name.clone(),
                mode: source.mode,
                candidates,
            }
        });
        join_all(fetches).await
    }
}
