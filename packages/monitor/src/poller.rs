//! The poll cycle: refresh, wait, harvest, extract, dedup, filter, append.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff;
use crate::error::CycleError;
use crate::store::{DedupStore, OrderLog};
use crate::traits::{
    DiagnosticSink, ListingExtractor, NoopDiagnostics, PageDriver, RecordFilter,
};
use crate::types::config::PollerConfig;
use crate::types::record::Record;

/// What one cycle observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Cycle completed; count of newly accepted records.
    Accepted(usize),

    /// Listing elements never appeared within the wait timeout.
    NoListings { login_detected: bool },
}

/// Drives the scrape loop: one strictly sequential cycle at a time, sole
/// writer of the order log and sole owner of the dedup set.
pub struct Poller<D, X, F> {
    driver: D,
    extractor: X,
    filter: F,
    dedup: DedupStore,
    log: OrderLog,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: PollerConfig,
    attempt: u32,
}

impl<D, X, F> Poller<D, X, F>
where
    D: PageDriver,
    X: ListingExtractor,
    F: RecordFilter,
{
    pub fn new(
        driver: D,
        extractor: X,
        filter: F,
        dedup: DedupStore,
        log: OrderLog,
        config: PollerConfig,
    ) -> Self {
        Self {
            driver,
            extractor,
            filter,
            dedup,
            log,
            diagnostics: Arc::new(NoopDiagnostics),
            config,
            attempt: 0,
        }
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn seen_count(&self) -> usize {
        self.dedup.len()
    }

    /// Navigate to the listing page.
    pub async fn open_board(&self) -> Result<(), CycleError> {
        self.driver.open(&self.config.page_url).await?;
        Ok(())
    }

    /// One refresh-harvest-filter-dedup-append cycle.
    pub async fn cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        self.driver.reload().await?;

        let visible = self
            .driver
            .wait_for_selector(&self.config.card_selector, self.config.element_wait_timeout)
            .await?;
        if !visible {
            self.diagnostics.capture("no_cards").await;
            let login_detected = self.session_lost().await;
            return Ok(CycleOutcome::NoListings { login_detected });
        }

        let harvested = self.driver.harvest(&self.config.card_selector).await?;
        debug!(total = harvested.len(), "cards on page");

        let mut fresh: Vec<Record> = Vec::new();
        for raw in &harvested {
            let Some(record) = self.extractor.extract(raw) else {
                continue;
            };
            if record.id.is_empty() || self.dedup.contains(&record.id) {
                continue;
            }
            if fresh.iter().any(|seen| seen.id == record.id) {
                continue;
            }
            if !self.filter.matches(&record) {
                // Rejected ids are never remembered, so a later predicate
                // change can still admit them.
                continue;
            }
            fresh.push(record);
        }

        if !fresh.is_empty() {
            // An id enters the set only once its record is durably logged;
            // a failed append leaves the record eligible for the next cycle.
            self.log.append(&fresh)?;
            for record in &fresh {
                self.dedup.insert(record.id.clone());
            }
            self.dedup.flush()?;

            info!(count = fresh.len(), "new orders accepted");
            for record in &fresh {
                info!(id = %record.id, title = record.title.as_deref().unwrap_or(""), "accepted order");
            }
        }

        Ok(CycleOutcome::Accepted(fresh.len()))
    }

    /// Heuristic: did the wait time out because we were bounced to a login
    /// page? Driver errors here are swallowed - this is a best-effort check
    /// on an already-degraded page.
    async fn session_lost(&self) -> bool {
        let title = self.driver.current_title().await.unwrap_or_default();
        let url = self.driver.current_url().await.unwrap_or_default();
        let title = title.to_lowercase();
        let url = url.to_lowercase();

        self.config
            .login_markers
            .iter()
            .any(|marker| title.contains(marker) || url.contains(marker))
    }

    /// Drive cycles until cancelled. A single failure never ends the loop;
    /// only cancellation does.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(url = %self.config.page_url, "poller starting");

        if let Err(e) = self.open_board().await {
            // The first cycle's reload will retry; backoff takes over if the
            // page stays unreachable.
            error!(error = %e, "failed to open listing page");
        }

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let sleep_for = match self.cycle().await {
                Ok(CycleOutcome::Accepted(_)) => {
                    self.attempt = 0;
                    backoff::human_interval(self.config.poll_base, self.config.poll_jitter)
                }
                Ok(CycleOutcome::NoListings {
                    login_detected: true,
                }) => {
                    let (min, max) = self.config.session_cooldown;
                    warn!("listing elements missing and login page detected, long cooldown");
                    backoff::cooldown_between(min, max)
                }
                Ok(CycleOutcome::NoListings {
                    login_detected: false,
                }) => {
                    warn!("listing elements missing, reopening page");
                    if let Err(e) = self.open_board().await {
                        warn!(error = %e, "failed to reopen listing page");
                    }
                    let (min, max) = self.config.reopen_cooldown;
                    backoff::cooldown_between(min, max)
                }
                Err(e) => {
                    error!(error = %e, attempt = self.attempt, "cycle failed, backing off");
                    let delay = self.config.backoff.delay(self.attempt);
                    self.attempt = self.config.backoff.next_attempt(self.attempt);
                    delay
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        if let Err(e) = self.dedup.flush() {
            error!(error = %e, "failed to flush seen ids on shutdown");
        }
        info!("poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AcceptAll, ContainsFilter, MockPage, PlainExtractor};
    use crate::types::record::RawListing;

    fn listing(id: &str, title: &str) -> RawListing {
        RawListing::new().with_attr("id", id).with_text("title", title)
    }

    fn poller_with(
        page: MockPage,
        filter: ContainsFilter,
        dir: &tempfile::TempDir,
    ) -> Poller<MockPage, PlainExtractor, ContainsFilter> {
        let dedup = DedupStore::load(dir.path().join("seen_ids.json")).unwrap();
        let log = OrderLog::new(dir.path().join("orders.jsonl"));
        Poller::new(
            page,
            PlainExtractor,
            filter,
            dedup,
            log,
            PollerConfig::new("https://board.example/orders", "a.card"),
        )
    }

    #[tokio::test]
    async fn duplicate_ids_are_accepted_once() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new()
            .with_batch(vec![listing("1", "chat-bot helper"), listing("2", "bot tuning")])
            .with_batch(vec![listing("1", "chat-bot helper"), listing("3", "bot fixes")]);

        let mut poller = poller_with(page, ContainsFilter::new("bot"), &dir);

        assert_eq!(poller.cycle().await.unwrap(), CycleOutcome::Accepted(2));
        assert_eq!(poller.cycle().await.unwrap(), CycleOutcome::Accepted(1));

        let (records, _) = OrderLog::new(dir.path().join("orders.jsonl"))
            .read_from(0)
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn rejected_records_are_not_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new()
            .with_batch(vec![listing("1", "chat-bot helper"), listing("2", "plain job")]);

        let mut poller = poller_with(page, ContainsFilter::new("bot"), &dir);
        assert_eq!(poller.cycle().await.unwrap(), CycleOutcome::Accepted(1));

        let dedup = DedupStore::load(dir.path().join("seen_ids.json")).unwrap();
        assert!(dedup.contains("1"));
        assert!(!dedup.contains("2"));

        // A loosened predicate admits the previously rejected id.
        let page = MockPage::new().with_batch(vec![listing("2", "plain job")]);
        let dedup = DedupStore::load(dir.path().join("seen_ids.json")).unwrap();
        let log = OrderLog::new(dir.path().join("orders.jsonl"));
        let mut poller = Poller::new(
            page,
            PlainExtractor,
            AcceptAll,
            dedup,
            log,
            PollerConfig::new("https://board.example/orders", "a.card"),
        );
        assert_eq!(poller.cycle().await.unwrap(), CycleOutcome::Accepted(1));
    }

    #[tokio::test]
    async fn records_without_id_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new().with_batch(vec![
            RawListing::new().with_text("title", "bot work, no id"),
            listing("7", "bot work"),
        ]);

        let mut poller = poller_with(page, ContainsFilter::new("bot"), &dir);
        assert_eq!(poller.cycle().await.unwrap(), CycleOutcome::Accepted(1));
    }

    #[tokio::test]
    async fn timeout_reports_login_when_marker_present() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new().with_timeout().with_timeout();
        page.set_location("Sign in - Board", "https://board.example/login?next=orders");

        let mut poller = poller_with(page, ContainsFilter::new("bot"), &dir);
        assert_eq!(
            poller.cycle().await.unwrap(),
            CycleOutcome::NoListings {
                login_detected: true
            }
        );

        let dir2 = tempfile::tempdir().unwrap();
        let page = MockPage::new().with_timeout();
        page.set_location("Orders", "https://board.example/orders");
        let mut poller = poller_with(page, ContainsFilter::new("bot"), &dir2);
        assert_eq!(
            poller.cycle().await.unwrap(),
            CycleOutcome::NoListings {
                login_detected: false
            }
        );
    }
}
