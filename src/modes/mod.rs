mod dump;
mod once;
mod replay;
mod shared;
mod watch;

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Once,
    Watch,
    Dump,
    Replay,
}

impl RunMode {
    fn from_env() -> Self {
        let raw = std::env::var("RUN_MODE").unwrap_or_else(|_| "once".into());
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "watch" | "loop" => Self::Watch,
            "dump" => Self::Dump,
            "replay" => Self::Replay,
            _ => Self::Once,
        }
    }
}

pub async fn run_from_env() -> Result<()> {
    match RunMode::from_env() {
        RunMode::Once => once::run().await,
        RunMode::Watch => watch::run().await,
        RunMode::Dump => dump::run().await,
        RunMode::Replay => replay::run().await,
    }
}
