//! Application configuration loaded from environment variables.
//!
//! One schema with explicit defaults. Every value has exactly one name;
//! anything unparseable is rejected at load time instead of probed at use
//! time.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use monitor::{BackoffPolicy, NotifierConfig, PollerConfig};

const DEFAULT_CARD_SELECTOR: &str = r#"a[data-testid$="_order-snippet"]"#;

#[derive(Debug, Clone)]
pub struct Config {
    /// Listing page to open and reload.
    pub page_url: String,

    /// Selector matching one order card.
    pub card_selector: String,

    /// Browser profile directory; holds the logged-in session.
    pub session_state_path: PathBuf,

    /// Headless after the first interactive login.
    pub headless: bool,

    pub element_wait_timeout: Duration,
    pub poll_base: Duration,
    pub poll_jitter: Duration,
    pub backoff_min: Duration,
    pub backoff_max: Duration,

    pub dedup_path: PathBuf,
    pub order_log_path: PathBuf,
    pub cursor_path: PathBuf,
    pub debug_dir: PathBuf,

    pub notify_poll: Duration,

    pub max_restarts: u32,
    pub restart_delay: Duration,

    pub bot_token: String,
    pub admin_chat_id: i64,

    /// Explicit browser binary; autodetected when unset.
    pub chrome_executable: Option<PathBuf>,

    /// Explicit poller binary; defaults to a sibling of the control binary.
    pub poller_bin: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            page_url: env::var("PAGE_URL").context("PAGE_URL must be set")?,
            card_selector: env::var("CARD_SELECTOR")
                .unwrap_or_else(|_| DEFAULT_CARD_SELECTOR.to_string()),
            session_state_path: path_var("SESSION_STATE_PATH", "browser_profile"),
            headless: env::var("HEADLESS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("HEADLESS must be true or false")?,
            element_wait_timeout: millis_var("ELEMENT_WAIT_TIMEOUT_MS", 60_000)?,
            poll_base: secs_var("POLL_BASE_SECS", 10)?,
            poll_jitter: secs_var("POLL_JITTER_SECS", 5)?,
            backoff_min: secs_var("BACKOFF_MIN_SECS", 180)?,
            backoff_max: secs_var("BACKOFF_MAX_SECS", 900)?,
            dedup_path: path_var("DEDUP_PATH", "seen_ids.json"),
            order_log_path: path_var("ORDER_LOG_PATH", "new_orders.jsonl"),
            cursor_path: path_var("CURSOR_PATH", "notify_state.json"),
            debug_dir: path_var("DEBUG_DIR", "debug"),
            notify_poll: secs_var("NOTIFY_POLL_SECS", 3)?,
            max_restarts: env::var("MAX_RESTARTS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("MAX_RESTARTS must be a number")?,
            restart_delay: secs_var("RESTART_DELAY_SECS", 10)?,
            bot_token: env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            admin_chat_id: env::var("ADMIN_CHAT_ID")
                .context("ADMIN_CHAT_ID must be set")?
                .parse()
                .context("ADMIN_CHAT_ID must be a numeric chat id")?,
            chrome_executable: env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
            poller_bin: env::var("POLLER_BIN").ok().map(PathBuf::from),
        })
    }

    /// Poll-loop settings for the monitor pipeline.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::new(&self.page_url, &self.card_selector)
            .with_element_wait_timeout(self.element_wait_timeout)
            .with_poll_interval(self.poll_base, self.poll_jitter)
            .with_backoff(BackoffPolicy::new(self.backoff_min, self.backoff_max))
    }

    /// Delivery-loop settings for the monitor pipeline.
    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig::default().with_poll_interval(self.notify_poll)
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn secs_var(name: &str, default: u64) -> Result<Duration> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{name} must be a number of seconds"))?;
    Ok(Duration::from_secs(secs))
}

fn millis_var(name: &str, default: u64) -> Result<Duration> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let millis: u64 = raw
        .parse()
        .with_context(|| format!("{name} must be a number of milliseconds"))?;
    Ok(Duration::from_millis(millis))
}
