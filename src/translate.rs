//! Optional headline translation through a
//! [LibreTranslate](https://libretranslate.com/)-compatible server.
//!
//! Failures are never fatal: on timeout, HTTP error or an unexpected body
//! the original title is returned unchanged (**fail-open**).
//!
//! ```env
//! TRANSLATE_ENABLED=true
//! TRANSLATE_ENDPOINT=http://127.0.0.1:5000   # default
//! TRANSLATE_TARGET=zh-Hant                   # default
//! TRANSLATE_TIMEOUT_MS=3000                  # default
//! ```

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Primary language subtag: `zh-TW` → `zh`, `en_US` → `en`.
fn language_of(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

pub struct Translator {
    client: Client,
    endpoint: String,
    target: String,
    enabled: bool,
    timeout: Duration,
}

impl Translator {
    /// | Env var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `TRANSLATE_ENABLED`    | `false`                 |
    /// | `TRANSLATE_ENDPOINT`   | `http://127.0.0.1:5000` |
    /// | `TRANSLATE_TARGET`     | `zh-Hant`               |
    /// | `TRANSLATE_TIMEOUT_MS` | `3000`                  |
    pub fn from_env() -> Self {
        let enabled = std::env::var("TRANSLATE_ENABLED")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let endpoint = std::env::var("TRANSLATE_ENDPOINT")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".into());
        let target = std::env::var("TRANSLATE_TARGET").unwrap_or_else(|_| "zh-Hant".into());
        let timeout_ms: u64 = std::env::var("TRANSLATE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Self::new(enabled, endpoint, target, Duration::from_millis(timeout_ms))
    }

    pub fn new(enabled: bool, endpoint: String, target: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            target,
            enabled,
            timeout,
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(false, String::new(), String::new(), Duration::ZERO)
    }

    /// `true` when enabled and `locale` is in a different language than the
    /// target.
    pub fn needs_translation(&self, locale: &str) -> bool {
        self.enabled && language_of(locale) != language_of(&self.target)
    }

    /// Translate `title`, falling back to it on any failure.
    pub async fn translate(&self, title: &str, locale: &str) -> String {
        if !self.needs_translation(locale) {
            return title.to_string();
        }

        let request = TranslateRequest {
            q: title,
            source: "auto",
            target: &self.target,
            format: "text",
        };
        let url = format!("{}/translate", self.endpoint);

        let response = match self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!("Translation returned {} (fail-open)", resp.status());
                return title.to_string();
            }
            Err(e) => {
                warn!("Translation request failed (fail-open): {e}");
                return title.to_string();
            }
        };

        match response.json::<TranslateResponse>().await {
            Ok(body) if !body.translated_text.trim().is_empty() => {
                debug!("Translated '{title}' → '{}'", body.translated_text);
                body.translated_text
            }
            Ok(_) => {
                warn!("Translation came back empty (fail-open)");
                title.to_string()
            }
            Err(e) => {
                warn!("Translation response parse failed (fail-open): {e}");
                title.to_string()
            }
        }
    }
}

impl std::fmt::Display for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Translator(enabled={}, target={}, endpoint={}, timeout={}ms)",
            self.enabled,
            self.target,
            self.endpoint,
            self.timeout.as_millis(),
        )
    }
}
