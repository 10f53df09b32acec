//! Client configuration and logging bootstrap.
//!
//! Plain configuration values — nothing here has dynamic behavior. Defaults
//! suit local development; the env vars below override them at startup.

use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::biomarker::favorites::FavoritesConfig;
use crate::job::PollConfig;
use crate::net::retry::RetryPolicy;

pub const APP_NAME: &str = "Labwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local backend during development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Per-conversation chat history cap.
pub const DEFAULT_MAX_CHAT_MESSAGES: usize = 100;
/// Per-profile upload history cap.
pub const DEFAULT_MAX_UPLOAD_RECORDS: usize = 10;
/// History records older than this are swept.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// All tunables the client core consumes.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub retry: RetryPolicy,
    pub poll: PollConfig,
    pub favorites: FavoritesConfig,
    pub max_chat_messages: usize,
    pub max_upload_records: usize,
    pub retention_days: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            retry: RetryPolicy::default(),
            poll: PollConfig::default(),
            favorites: FavoritesConfig::default(),
            max_chat_messages: DEFAULT_MAX_CHAT_MESSAGES,
            max_upload_records: DEFAULT_MAX_UPLOAD_RECORDS,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl ClientConfig {
    /// Defaults with environment overrides:
    /// `LABWISE_API_URL`, `LABWISE_MAX_RETRIES`, `LABWISE_POLL_INTERVAL_MS`,
    /// `LABWISE_POLL_TIMEOUT_MS`, `LABWISE_MAX_FAVORITES`.
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a key lookup — env in production, a map in
    /// tests. Missing, empty, or unparseable values keep the default.
    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get("LABWISE_API_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        if let Some(n) = parse_override::<u32>(get("LABWISE_MAX_RETRIES")) {
            self.retry.max_retries = n;
        }
        if let Some(ms) = parse_override::<u64>(get("LABWISE_POLL_INTERVAL_MS")) {
            self.poll.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_override::<u64>(get("LABWISE_POLL_TIMEOUT_MS")) {
            self.poll.timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse_override::<usize>(get("LABWISE_MAX_FAVORITES")) {
            self.favorites.max_slots = n;
        }
    }
}

fn parse_override<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.parse().ok())
}

/// Application data directory: `~/Labwise/` (user-visible).
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Where the history store keeps its per-key logs.
pub fn history_dir() -> PathBuf {
    app_data_dir().join("history")
}

pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Initialize tracing with `RUST_LOG` override support. Call once from the
/// app shell.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .init();
    tracing::info!("{} client core v{}", APP_NAME, APP_VERSION);
}
