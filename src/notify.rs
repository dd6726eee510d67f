//! Outbound notifications: Discord webhook delivery, heartbeat, dry run.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client as HttpClient;
use serde::Serialize;
use tracing::{debug, info};

use crate::filter::{Channel, Incident, Published, Severity};

/// Discord rejects `content` over 2000 characters.
const MAX_TITLE_CHARS: usize = 1500;

pub const HEARTBEAT_TEXT: &str = "✅ 本輪無新的工業火災/爆炸事件";

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// One outbound message, built from an incident and its (translated) title.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub channel: Channel,
    pub severity: Severity,
    pub country_flag: String,
    pub title: String,
    pub link: String,
    pub source_count: usize,
    pub published_at: Published,
}

impl Notification {
    pub fn from_incident(incident: &Incident, title: String) -> Self {
        Self {
            channel: incident.classification.channel,
            severity: incident.classification.severity,
            country_flag: incident.classification.country_flag.clone(),
            title,
            link: incident.event.link.clone(),
            source_count: incident.event.source_count,
            published_at: incident.event.published_at,
        }
    }

    pub fn render(&self) -> String {
        let title: String = if self.title.chars().count() > MAX_TITLE_CHARS {
            let mut t: String = self.title.chars().take(MAX_TITLE_CHARS).collect();
            t.push('…');
            t
        } else {
            self.title.clone()
        };

        let mut out = format!(
            "{} {}\n**【{}】** {}\n",
            self.channel.emoji(),
            self.channel.label(),
            self.severity.label(),
            self.country_flag
        );
        if self.link.is_empty() {
            out.push_str(&title);
        } else {
            out.push_str(&format!("[{title}](<{}>)", self.link));
        }
        if self.source_count > 1 {
            out.push_str(&format!("\n📰 {} 家媒體報導", self.source_count));
        }
        if let Published::At(_) = self.published_at {
            out.push_str(&format!("\n🕒 {}", self.published_at));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

pub struct Dispatcher {
    http: HttpClient,
    webhook: Option<String>,
    heartbeat: bool,
}

impl Dispatcher {
    /// | Env var                 | Default | Purpose                                 |
    /// |-------------------------|---------|-----------------------------------------|
    /// | `DISCORD_WEBHOOK`       | —       | Webhook URL; unset = print to stdout    |
    /// | `DISPATCH_TIMEOUT_SECS` | `10`    | Per-request timeout                     |
    /// | `HEARTBEAT`             | `false` | Send a message when a cycle finds nothing |
    pub fn from_env() -> Result<Self> {
        let webhook = std::env::var("DISCORD_WEBHOOK")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let timeout_secs: u64 = std::env::var("DISPATCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);
        let heartbeat = std::env::var("HEARTBEAT")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self::new(webhook, Duration::from_secs(timeout_secs), heartbeat)
    }

    pub fn new(webhook: Option<String>, timeout: Duration, heartbeat: bool) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build dispatch HTTP client")?;
        Ok(Self {
            http,
            webhook,
            heartbeat,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.webhook.is_none()
    }

    /// Deliver raw text. In dry-run mode the text is printed and counts as
    /// delivered.
    pub async fn send(&self, text: &str) -> Result<()> {
        let Some(url) = &self.webhook else {
            println!("\n{text}\n");
            return Ok(());
        };
        let resp = self
            .http
            .post(url)
            .json(&WebhookPayload { content: text })
            .send()
            .await
            .context("webhook request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let raw = resp.text().await.unwrap_or_default();
            return Err(anyhow!("webhook POST failed: {status} body={raw}"));
        }
        Ok(())
    }

    pub async fn dispatch(&self, note: &Notification) -> Result<()> {
        debug!("Dispatching {:?}/{:?}: {}", note.channel, note.severity, note.title);
        self.send(&note.render()).await
    }

    /// Liveness message for a cycle with zero new incidents. No-op unless
    /// enabled.
    pub async fn heartbeat(&self) -> Result<()> {
        if !self.heartbeat {
            return Ok(());
        }
        info!("No new incidents – sending heartbeat");
        self.send(HEARTBEAT_TEXT).await
    }
}

impl std::fmt::Display for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dispatcher(target={}, heartbeat={})",
            if self.is_dry_run() { "stdout" } else { "discord" },
            self.heartbeat,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn note() -> Notification {
        Notification {
            channel: Channel::Energy,
            severity: Severity::Fatal,
            country_flag: "🇺🇸".into(),
            title: "Refinery blast kills 5 in Texas".into(),
            link: "https://news.example.org/a".into(),
            source_count: 2,
            published_at: Published::Unknown,
        }
    }

    #[test]
    fn renders_header_link_and_sources() {
        let text = note().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "⚡ 能源/儲能情報");
        assert_eq!(lines[1], "**【🚨 重大傷亡】** 🇺🇸");
        assert_eq!(
            lines[2],
            "[Refinery blast kills 5 in Texas](<https://news.example.org/a>)"
        );
        assert_eq!(lines[3], "📰 2 家媒體報導");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn single_source_known_date() {
        let mut n = note();
        n.source_count = 1;
        n.published_at = Published::At(DateTime::from_timestamp(1_736_152_200, 0).unwrap());
        let text = n.render();
        assert!(!text.contains("家媒體報導"));
        assert!(text.ends_with("🕒 2025-01-06 08:30 UTC"), "{text}");
    }

    #[test]
    fn long_titles_are_truncated_on_char_boundaries() {
        let mut n = note();
        n.title = "工廠大火".repeat(1000);
        n.link.clear();
        let text = n.render();
        assert!(text.contains('…'));
        assert!(text.chars().count() < 2000);
    }

    #[tokio::test]
    async fn dry_run_counts_as_delivered() {
        let d = Dispatcher::new(None, Duration::from_secs(1), false).unwrap();
        assert!(d.is_dry_run());
        assert!(d.dispatch(&note()).await.is_ok());
        assert!(d.heartbeat().await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_webhook_is_an_error() {
        let d = Dispatcher::new(
            Some("http://127.0.0.1:9/webhook".into()),
            Duration::from_millis(500),
            false,
        )
        .unwrap();
        assert!(d.dispatch(&note()).await.is_err());
    }
}
