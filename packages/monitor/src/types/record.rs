//! Record types - discovered listings and their raw harvest.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One discovered listing.
///
/// `id` is the stable external identifier and the dedup key; every other
/// field is descriptive and optional. A listing without an id never reaches
/// any store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_ago: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Record {
    /// Create a record with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            price: None,
            location: None,
            preferred_time: None,
            posted_ago: None,
            client_name: None,
            href: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_preferred_time(mut self, preferred_time: impl Into<String>) -> Self {
        self.preferred_time = Some(preferred_time.into());
        self
    }

    pub fn with_posted_ago(mut self, posted_ago: impl Into<String>) -> Self {
        self.posted_ago = Some(posted_ago.into());
        self
    }

    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// The descriptive fields a match predicate scans, joined with newlines.
    pub fn search_text(&self) -> String {
        [
            self.title.as_deref(),
            self.description.as_deref(),
            self.location.as_deref(),
            self.client_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Collapse whitespace runs (including NBSP and narrow NBSP) and trim.
///
/// Listing boards pad prices and labels with non-breaking spaces; every text
/// field goes through this before it enters a [`Record`].
pub fn normalize_text(s: &str) -> String {
    s.replace(['\u{a0}', '\u{202f}'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw harvest of one rendered listing element.
///
/// The page driver fills attribute and text snippets under keys of its own
/// choosing; the extractor decides what they mean. Keeping this a plain bag
/// of strings keeps the driver ignorant of the record schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    attrs: HashMap<String, String>,
    texts: HashMap<String, String>,
}

impl RawListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_text(key, value);
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.texts.insert(key.into(), value.into());
    }

    /// Attribute captured from the element itself.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Text snippet captured from a child of the element.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }
}
