//! Configuration for the pipeline components.

use std::path::PathBuf;
use std::time::Duration;

use crate::backoff::BackoffPolicy;

/// Configuration for the poll cycle loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Listing page to open and reload.
    pub page_url: String,

    /// Selector matching one listing card.
    pub card_selector: String,

    /// Max wait for listing elements per cycle.
    pub element_wait_timeout: Duration,

    /// Success-path sleep: fixed base plus uniform jitter, so polling does
    /// not leave a mechanically regular signature.
    pub poll_base: Duration,
    pub poll_jitter: Duration,

    /// Failure-path delays.
    pub backoff: BackoffPolicy,

    /// Lowercase markers in the page title or URL that mean the session was
    /// invalidated and we landed on a login page.
    pub login_markers: Vec<String>,

    /// Cooldown bounds after a detected session loss. Long, so we do not
    /// hammer a site that just logged us out.
    pub session_cooldown: (Duration, Duration),

    /// Cooldown bounds after a plain "no elements rendered" timeout.
    pub reopen_cooldown: (Duration, Duration),
}

impl PollerConfig {
    pub fn new(page_url: impl Into<String>, card_selector: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            card_selector: card_selector.into(),
            element_wait_timeout: Duration::from_secs(60),
            poll_base: Duration::from_secs(10),
            poll_jitter: Duration::from_secs(5),
            backoff: BackoffPolicy::default(),
            login_markers: ["login", "signin", "sign-in", "auth", "вход", "войти", "авторизация"]
                .into_iter()
                .map(String::from)
                .collect(),
            session_cooldown: (Duration::from_secs(300), Duration::from_secs(600)),
            reopen_cooldown: (Duration::from_secs(15), Duration::from_secs(45)),
        }
    }

    pub fn with_element_wait_timeout(mut self, timeout: Duration) -> Self {
        self.element_wait_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, base: Duration, jitter: Duration) -> Self {
        self.poll_base = base;
        self.poll_jitter = jitter;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_login_markers(
        mut self,
        markers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.login_markers = markers.into_iter().map(|m| m.into()).collect();
        self
    }

    pub fn with_session_cooldown(mut self, min: Duration, max: Duration) -> Self {
        self.session_cooldown = (min, max);
        self
    }

    pub fn with_reopen_cooldown(mut self, min: Duration, max: Duration) -> Self {
        self.reopen_cooldown = (min, max);
        self
    }
}

/// Configuration for the cursor-tailing delivery loop.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Sleep between tail passes; independent of the poller's interval.
    pub poll_interval: Duration,

    /// Sleep after a failed pass before retrying.
    pub error_cooldown: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            error_cooldown: Duration::from_secs(5),
        }
    }
}

impl NotifierConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_error_cooldown(mut self, cooldown: Duration) -> Self {
        self.error_cooldown = cooldown;
        self
    }
}

/// Configuration for the child-process supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Program to spawn.
    pub program: PathBuf,
    pub args: Vec<String>,

    /// Tag used when re-emitting the child's output lines.
    pub child_name: String,

    /// Restart budget before supervision gives up. The circuit breaker
    /// against a crash loop burning resources indefinitely.
    pub max_restarts: u32,

    /// Pause between an exit and the next spawn.
    pub restart_delay: Duration,

    /// How long a terminated child gets before it is force-killed.
    pub kill_grace: Duration,
}

impl SupervisorConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            child_name: "poller".to_string(),
            max_restarts: 50,
            restart_delay: Duration::from_secs(10),
            kill_grace: Duration::from_secs(5),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_child_name(mut self, name: impl Into<String>) -> Self {
        self.child_name = name.into();
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}
