//! Poller child process: scrapes the board and appends accepted orders.
//!
//! Runs one strictly sequential poll cycle at a time and owns the dedup set
//! and the order log. The `watcher` binary supervises this process and
//! restarts it on crash; delivery happens over there, never here.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monitor::{DedupStore, OrderLog, Poller};
use watcher_core::browser::{ChromeBrowser, PageSnapshot};
use watcher_core::{session, Config, KeywordFilter, SnippetExtractor};

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
    info!(url = %config.page_url, "starting board poller");

    session::ensure_session(&config).await?;

    let (browser, page) = ChromeBrowser::launch(
        &config.session_state_path,
        config.headless,
        config.chrome_executable.as_deref(),
    )
    .await
    .context("failed to launch browser")?;
    let diagnostics = Arc::new(PageSnapshot::new(page.cdp_page(), &config.debug_dir));

    let dedup = DedupStore::load(&config.dedup_path)?;
    info!(count = dedup.len(), "loaded seen ids");

    let mut poller = Poller::new(
        page,
        SnippetExtractor,
        KeywordFilter::bots(),
        dedup,
        OrderLog::new(&config.order_log_path),
        config.poller_config(),
    )
    .with_diagnostics(diagnostics);

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    poller.run(shutdown).await;

    browser.close().await;
    Ok(())
}

fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_stop_signal().await;
        info!("stop signal received");
        shutdown.cancel();
    });
}

/// The supervisor terminates us with SIGTERM; interactive runs use ctrl-c.
#[cfg(unix)]
async fn wait_for_stop_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_stop_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
