//! One-time interactive login bootstrap.
//!
//! The browser profile directory is the session marker: when it is absent,
//! the operator logs in once in a visible window and the profile keeps the
//! cookies for every later headless run.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::browser::ChromeBrowser;
use crate::config::Config;

pub fn session_ready(profile_dir: &Path) -> bool {
    profile_dir.is_dir()
}

/// Run the interactive first-login flow unless a session already exists.
pub async fn ensure_session(config: &Config) -> Result<()> {
    if session_ready(&config.session_state_path) {
        return Ok(());
    }

    println!();
    println!("=== FIRST RUN: LOGIN REQUIRED ===");
    println!("1) Log into your account in the browser window that just opened.");
    println!("2) Navigate to the order listing (the cards must be visible).");
    println!("3) Come back here and press Enter.");
    println!();

    let (browser, page) = ChromeBrowser::launch(
        &config.session_state_path,
        false,
        config.chrome_executable.as_deref(),
    )
    .await
    .context("failed to launch browser for login")?;

    use monitor::PageDriver;
    page.open(&config.page_url)
        .await
        .context("failed to open the listing page for login")?;

    wait_for_enter().await?;

    browser.close().await;
    info!(profile = %config.session_state_path.display(), "session profile saved");
    Ok(())
}

async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await
    .context("stdin task failed")?
    .context("failed to read from stdin")?;
    Ok(())
}
