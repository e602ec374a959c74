use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::classifier::PolicyKind;

/// Runtime configuration, from CLI flags with environment fallbacks.
#[derive(Debug, Parser)]
#[command(name = "newswatch", about = "Keyword-filtered RSS news ingestion service")]
pub struct Config {
    /// Address the HTTP API listens on.
    #[arg(long, env = "NEWSWATCH_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// PostgreSQL connection string. Falls back to an in-memory store when
    /// unset.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Relevance policy applied during ingestion.
    #[arg(long, env = "NEWSWATCH_POLICY", value_enum, default_value_t = PolicyKind::Strict)]
    pub policy: PolicyKind,

    /// Seconds between scheduled ingestion runs; also the minimum interval
    /// enforced between run starts.
    #[arg(long, env = "NEWSWATCH_FETCH_INTERVAL_SECS", default_value_t = 300)]
    pub fetch_interval_secs: u64,

    /// Trailing window, in seconds, an article must have been stored
    /// within to be included in a push digest. 300 is the scheduled tier;
    /// 1800 reproduces the manual-send tier.
    #[arg(long, env = "NEWSWATCH_NOTIFY_WINDOW_SECS", default_value_t = 300)]
    pub notify_window_secs: u64,

    /// Seconds between scheduled digest dispatches. Defaults to the notify
    /// window so consecutive digests do not overlap.
    #[arg(long, env = "NEWSWATCH_NOTIFY_INTERVAL_SECS")]
    pub notify_interval_secs: Option<u64>,

    /// Path to the VAPID ES256 private key (PEM). Push delivery is
    /// disabled when unset.
    #[arg(long, env = "VAPID_PRIVATE_KEY_PEM")]
    pub vapid_private_key_pem: Option<PathBuf>,

    /// Operator contact carried in the VAPID `sub` claim.
    #[arg(long, env = "VAPID_EMAIL", default_value = "admin@example.com")]
    pub vapid_email: String,
}

impl Config {
    pub fn notify_interval_secs(&self) -> u64 {
        self.notify_interval_secs.unwrap_or(self.notify_window_secs)
    }
}
