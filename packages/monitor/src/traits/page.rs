//! Page driver trait - the rendering layer as an opaque capability.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PageResult;
use crate::types::record::RawListing;

/// Driver for the rendered listing page.
///
/// Implementations own the browser; the poller only navigates, waits, and
/// harvests. All methods take `&self` so drivers can be shared and mocks can
/// use interior mutability.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the document to load.
    async fn open(&self, url: &str) -> PageResult<()>;

    /// Soft refresh of the current page.
    async fn reload(&self) -> PageResult<()>;

    /// Wait until at least one element matches the selector.
    ///
    /// Returns `Ok(false)` on timeout; a timeout is an expected outcome, not
    /// an error.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> PageResult<bool>;

    /// Title of the current document, empty when unavailable.
    async fn current_title(&self) -> PageResult<String>;

    /// URL the page currently shows, empty when unavailable.
    async fn current_url(&self) -> PageResult<String>;

    /// Harvest all currently rendered elements matching the selector.
    async fn harvest(&self, selector: &str) -> PageResult<Vec<RawListing>>;
}
