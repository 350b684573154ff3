//! chromiumoxide-backed page driver and failure diagnostics.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use monitor::error::{PageError, PageResult};
use monitor::{DiagnosticSink, PageDriver, RawListing};

/// How one text snippet is located inside a card.
#[derive(Debug, Clone)]
pub enum SnippetQuery {
    /// First descendant matching a CSS selector.
    Css(String),

    /// First descendant of the given tag whose text contains the needle.
    /// CSS cannot express this; it runs as a small JS function on the card.
    TextContains { tag: String, needle: String },
}

/// Which parts of a listing card the driver captures.
///
/// Attributes come off the card element itself; text snippets come from the
/// first descendant each query finds. The defaults follow the board's card
/// markup.
#[derive(Debug, Clone)]
pub struct SnippetSelectors {
    pub attrs: Vec<String>,
    pub texts: Vec<(String, SnippetQuery)>,
}

impl Default for SnippetSelectors {
    fn default() -> Self {
        let css = |key: &str, selector: &str| {
            (key.to_string(), SnippetQuery::Css(selector.to_string()))
        };
        Self {
            attrs: ["data-testid", "id", "aria-label", "href"]
                .into_iter()
                .map(String::from)
                .collect(),
            texts: vec![
                css("title", "h3"),
                css("price", r#"span[aria-hidden="true"]"#),
                css("description", "p"),
                css("location", r#"li[aria-label^="Дистанционно"]"#),
                css("preferred_time", r#"li[aria-label^="Удобное время"]"#),
                (
                    "posted_ago".to_string(),
                    SnippetQuery::TextContains {
                        tag: "span".to_string(),
                        needle: "назад".to_string(),
                    },
                ),
                css("client_name", "div:has(svg) span"),
            ],
        }
    }
}

/// Owns the browser process and drives its CDP event loop.
pub struct ChromeBrowser {
    browser: Browser,
    events: JoinHandle<()>,
}

impl ChromeBrowser {
    /// Launch a browser bound to the given profile directory. The profile
    /// keeps cookies, so one interactive login survives later headless
    /// runs.
    pub async fn launch(
        profile_dir: &Path,
        headless: bool,
        executable: Option<&Path>,
    ) -> anyhow::Result<(Self, ChromePage)> {
        let mut builder = BrowserConfig::builder().user_data_dir(profile_dir);
        if !headless {
            builder = builder.with_head();
        }
        if let Some(executable) = executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(|e| anyhow::anyhow!(e))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        Ok((Self { browser, events }, ChromePage::new(page)))
    }

    /// Close the browser and stop the event loop.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "failed waiting for browser exit");
        }
        self.events.abort();
    }
}

/// [`PageDriver`] over one CDP page.
#[derive(Clone)]
pub struct ChromePage {
    page: Page,
    selectors: SnippetSelectors,
    poll_step: Duration,
}

impl ChromePage {
    fn new(page: Page) -> Self {
        Self {
            page,
            selectors: SnippetSelectors::default(),
            poll_step: Duration::from_millis(500),
        }
    }

    pub fn with_selectors(mut self, selectors: SnippetSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Raw CDP page handle, for the diagnostics sink.
    pub fn cdp_page(&self) -> Page {
        self.page.clone()
    }
}

fn driver_err(e: chromiumoxide::error::CdpError) -> PageError {
    PageError::Driver(Box::new(e))
}

/// Text of the first descendant with the given tag whose content contains
/// the needle.
///
/// Runs as a JS function on the card element; the CDP query layer only
/// speaks CSS. A failed lookup means "no such snippet", never an error.
async fn text_containing(element: &Element, tag: &str, needle: &str) -> Option<String> {
    let function = format!(
        r#"function() {{
            for (const node of this.querySelectorAll({tag})) {{
                const text = node.textContent;
                if (text && text.includes({needle})) {{
                    return text;
                }}
            }}
            return null;
        }}"#,
        tag = serde_json::to_string(tag).ok()?,
        needle = serde_json::to_string(needle).ok()?,
    );

    let returns = element.call_js_fn(function, false).await.ok()?;
    returns
        .result
        .value
        .and_then(|value| value.as_str().map(str::to_string))
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn open(&self, url: &str) -> PageResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| PageError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| PageError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn reload(&self) -> PageResult<()> {
        self.page
            .reload()
            .await
            .map_err(|e| PageError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> PageResult<bool> {
        // CDP has no wait primitive; poll for attachment. Attachment is far
        // more stable than visibility under overlays and lazy loading.
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_step).await;
        }
    }

    async fn current_title(&self) -> PageResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(driver_err)?
            .unwrap_or_default())
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(driver_err)?
            .unwrap_or_default())
    }

    async fn harvest(&self, selector: &str) -> PageResult<Vec<RawListing>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(driver_err)?;

        let mut listings = Vec::with_capacity(elements.len());
        for element in elements {
            let mut raw = RawListing::new();
            for name in &self.selectors.attrs {
                if let Ok(Some(value)) = element.attribute(name).await {
                    raw.set_attr(name.clone(), value);
                }
            }
            for (key, query) in &self.selectors.texts {
                let text = match query {
                    SnippetQuery::Css(selector) => {
                        match element.find_element(selector).await {
                            Ok(child) => child.inner_text().await.ok().flatten(),
                            Err(_) => None,
                        }
                    }
                    SnippetQuery::TextContains { tag, needle } => {
                        text_containing(&element, tag, needle).await
                    }
                };
                if let Some(text) = text {
                    raw.set_text(key.clone(), text);
                }
            }
            listings.push(raw);
        }
        Ok(listings)
    }
}

/// Saves a timestamped screenshot and HTML dump when a cycle goes wrong.
///
/// Failures in here are ignored by contract: diagnostics must never take
/// the pipeline down.
pub struct PageSnapshot {
    page: Page,
    dir: PathBuf,
}

impl PageSnapshot {
    pub fn new(page: Page, dir: impl Into<PathBuf>) -> Self {
        Self {
            page,
            dir: dir.into(),
        }
    }
}

#[async_trait]
impl DiagnosticSink for PageSnapshot {
    async fn capture(&self, tag: &str) {
        if std::fs::create_dir_all(&self.dir).is_err() {
            return;
        }
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

        let params = ScreenshotParams::builder().full_page(true).build();
        if let Ok(bytes) = self.page.screenshot(params).await {
            let _ = std::fs::write(self.dir.join(format!("{tag}_{stamp}.png")), bytes);
        }
        if let Ok(html) = self.page.content().await {
            let _ = std::fs::write(self.dir.join(format!("{tag}_{stamp}.html")), html);
        }
        debug!(tag, dir = %self.dir.display(), "saved failure snapshot");
    }
}
