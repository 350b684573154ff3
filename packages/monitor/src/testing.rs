//! Mock implementations for testing.
//!
//! Configurable stand-ins for the external collaborators so the pipeline
//! can be exercised without a browser or a messaging API.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PageResult, SendError, SendResult};
use crate::traits::{ListingExtractor, Messenger, PageDriver, RecordFilter, RecordFormatter};
use crate::types::record::{normalize_text, RawListing, Record};

#[derive(Debug, Default)]
struct MockPageState {
    /// Scripted cycles: `Some(batch)` renders those listings, `None` is a
    /// wait timeout.
    batches: VecDeque<Option<Vec<RawListing>>>,
    title: String,
    url: String,
    opened: Vec<String>,
    reloads: usize,
}

/// Scripted page driver.
///
/// Each cycle consumes one scripted entry; an exhausted script behaves like
/// a page that never renders its listings.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    state: Arc<RwLock<MockPageState>>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one cycle that renders these listings.
    pub fn with_batch(self, listings: Vec<RawListing>) -> Self {
        self.state
            .write()
            .unwrap()
            .batches
            .push_back(Some(listings));
        self
    }

    /// Script one cycle where the wait times out.
    pub fn with_timeout(self) -> Self {
        self.state.write().unwrap().batches.push_back(None);
        self
    }

    /// Set what `current_title` / `current_url` report.
    pub fn set_location(&self, title: impl Into<String>, url: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        state.title = title.into();
        state.url = url.into();
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.state.read().unwrap().opened.clone()
    }

    pub fn reload_count(&self) -> usize {
        self.state.read().unwrap().reloads
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn open(&self, url: &str) -> PageResult<()> {
        self.state.write().unwrap().opened.push(url.to_string());
        Ok(())
    }

    async fn reload(&self) -> PageResult<()> {
        self.state.write().unwrap().reloads += 1;
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> PageResult<bool> {
        let mut state = self.state.write().unwrap();
        match state.batches.front() {
            Some(Some(_)) => Ok(true),
            Some(None) => {
                // Consume the scripted timeout so the next cycle moves on.
                state.batches.pop_front();
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn current_title(&self) -> PageResult<String> {
        Ok(self.state.read().unwrap().title.clone())
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.state.read().unwrap().url.clone())
    }

    async fn harvest(&self, _selector: &str) -> PageResult<Vec<RawListing>> {
        let mut state = self.state.write().unwrap();
        Ok(state.batches.pop_front().flatten().unwrap_or_default())
    }
}

/// Messenger recording every send; failures are injected by substring.
#[derive(Debug, Clone, Default)]
pub struct MockMessenger {
    sent: Arc<RwLock<Vec<String>>>,
    attempts: Arc<RwLock<usize>>,
    fail_containing: Arc<RwLock<Option<String>>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any send whose text contains the needle.
    pub fn with_failure_on(self, needle: impl Into<String>) -> Self {
        *self.fail_containing.write().unwrap() = Some(needle.into());
        self
    }

    /// Texts that were delivered successfully, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.read().unwrap().clone()
    }

    /// Total send attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        *self.attempts.read().unwrap()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, text: &str) -> SendResult<()> {
        *self.attempts.write().unwrap() += 1;

        let should_fail = self
            .fail_containing
            .read()
            .unwrap()
            .as_deref()
            .is_some_and(|needle| text.contains(needle));
        if should_fail {
            return Err(SendError::Rejected("injected failure".to_string()));
        }

        self.sent.write().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Extractor reading records straight from well-known harvest keys:
/// the `id` attribute plus `title` / `description` / `price` text snippets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainExtractor;

impl ListingExtractor for PlainExtractor {
    fn extract(&self, raw: &RawListing) -> Option<Record> {
        let id = normalize_text(raw.attr("id")?);
        if id.is_empty() {
            return None;
        }

        let mut record = Record::new(id);
        if let Some(title) = raw.text("title") {
            record = record.with_title(normalize_text(title));
        }
        if let Some(description) = raw.text("description") {
            record = record.with_description(normalize_text(description));
        }
        if let Some(price) = raw.text("price") {
            record = record.with_price(normalize_text(price));
        }
        Some(record)
    }
}

/// Filter accepting records whose searchable text contains the needle
/// (case-insensitive).
#[derive(Debug, Clone)]
pub struct ContainsFilter {
    needle: String,
}

impl ContainsFilter {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into().to_lowercase(),
        }
    }
}

impl RecordFilter for ContainsFilter {
    fn matches(&self, record: &Record) -> bool {
        record.search_text().to_lowercase().contains(&self.needle)
    }
}

/// Filter accepting everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RecordFilter for AcceptAll {
    fn matches(&self, _record: &Record) -> bool {
        true
    }
}

/// Formatter rendering `id: title` - predictable for assertions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl RecordFormatter for PlainFormatter {
    fn format(&self, record: &Record) -> String {
        match &record.title {
            Some(title) => format!("{}: {}", record.id, title),
            None => record.id.clone(),
        }
    }
}
