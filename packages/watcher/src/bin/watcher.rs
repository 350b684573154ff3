//! Control process: poller supervision and Telegram delivery in one place.
//!
//! Two cooperative tasks share this process: the supervisor keeps the
//! poller child alive (bounded restarts), the notifier tails the order log
//! and forwards new orders to Telegram. They coordinate only through the
//! shutdown token; data flows through the order log file. If the supervisor
//! trips its restart breaker, delivery keeps running.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monitor::{Cursor, Notifier, OrderLog, Supervisor, SupervisorConfig};
use telegram::{TelegramOptions, TelegramService};
use watcher_core::{Config, KeywordFilter, OrderFormatter, TelegramMessenger};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = Config::from_env()?;
    info!("watcher starting: supervisor + notifier in one process");

    let shutdown = CancellationToken::new();

    let supervisor_config = SupervisorConfig::new(poller_program(&config)?)
        .with_max_restarts(config.max_restarts)
        .with_restart_delay(config.restart_delay);
    let mut supervisor = Supervisor::new(supervisor_config);
    let supervisor_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { supervisor.run(shutdown).await }
    });

    let service = TelegramService::new(TelegramOptions {
        bot_token: config.bot_token.clone(),
        chat_id: config.admin_chat_id,
    });
    let notifier = Notifier::new(
        OrderLog::new(&config.order_log_path),
        Cursor::new(&config.cursor_path),
        TelegramMessenger::new(service),
        OrderFormatter::new(&config.page_url).context("PAGE_URL must be a valid URL")?,
        config.notifier_config(),
    )
    .with_filter(Arc::new(KeywordFilter::bots()));
    let notifier_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { notifier.run(shutdown).await }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");
    shutdown.cancel();

    let _ = supervisor_task.await;
    let _ = notifier_task.await;
    info!("shutdown complete");
    Ok(())
}

/// The poller binary: explicit override, or a sibling of this executable.
fn poller_program(config: &Config) -> Result<PathBuf> {
    if let Some(bin) = &config.poller_bin {
        return Ok(bin.clone());
    }
    let current = std::env::current_exe().context("cannot locate current executable")?;
    let dir = current
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.join("poller"))
}
