//! Cursor-tailing delivery loop.
//!
//! Independently tails the order log from the last persisted byte offset and
//! forwards unseen records to the messaging channel. Shares nothing with the
//! poller besides the log file, so delivery can fail and restart without
//! touching the scrape side.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::StoreResult;
use crate::store::{Cursor, OrderLog};
use crate::traits::{Messenger, RecordFilter, RecordFormatter};
use crate::types::config::NotifierConfig;

/// Forwards new order log entries to the messaging channel.
///
/// Cursor policy: the offset is persisted once per completed pass, after the
/// sends. A crash mid-pass re-delivers the whole pass (at-least-once); a
/// send that failed inside a completed pass is logged and not retried.
pub struct Notifier<M, F> {
    log: OrderLog,
    cursor: Cursor,
    messenger: M,
    formatter: F,
    filter: Option<Arc<dyn RecordFilter>>,
    config: NotifierConfig,
}

impl<M, F> Notifier<M, F>
where
    M: Messenger,
    F: RecordFormatter,
{
    pub fn new(
        log: OrderLog,
        cursor: Cursor,
        messenger: M,
        formatter: F,
        config: NotifierConfig,
    ) -> Self {
        Self {
            log,
            cursor,
            messenger,
            formatter,
            filter: None,
            config,
        }
    }

    /// Gate deliveries behind a predicate as well. Records already logged
    /// but not yet delivered pick up predicate changes this way.
    pub fn with_filter(mut self, filter: Arc<dyn RecordFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// One tail pass. Returns the number of records forwarded.
    pub async fn tick(&self) -> StoreResult<usize> {
        let persisted = self.cursor.load();
        let mut offset = persisted;

        let size = self.log.size()?;
        if size < offset {
            warn!(offset, size, "order log shrank, resetting cursor");
            offset = 0;
        }

        let (records, end) = self.log.read_from(offset)?;

        let mut sent = 0;
        for record in &records {
            if let Some(filter) = &self.filter {
                if !filter.matches(record) {
                    debug!(id = %record.id, "record skipped by delivery filter");
                    continue;
                }
            }

            let text = self.formatter.format(record);
            match self.messenger.send(&text).await {
                Ok(()) => {
                    sent += 1;
                    debug!(id = %record.id, "order forwarded");
                }
                Err(e) => warn!(id = %record.id, error = %e, "failed to forward order"),
            }
        }

        if end != persisted {
            self.cursor.store(end)?;
        }

        Ok(sent)
    }

    /// Tail forever; a failed pass is retried after a cooldown, never fatal.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            log = %self.log.path().display(),
            interval = ?self.config.poll_interval,
            "notifier starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let sleep_for = match self.tick().await {
                Ok(0) => self.config.poll_interval,
                Ok(count) => {
                    info!(count, "forwarded new orders");
                    self.config.poll_interval
                }
                Err(e) => {
                    error!(error = %e, "notifier pass failed");
                    self.config.error_cooldown
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        info!("notifier stopped");
    }
}
