//! Field extraction from harvested order cards.

use monitor::{normalize_text, ListingExtractor, RawListing, Record};

/// Extracts a [`Record`] from the attribute/text bag the browser driver
/// harvests off one card (see [`crate::browser::SnippetSelectors`] for the
/// keys).
///
/// The card's `data-testid` is `<order id>_order-snippet`; the prefix is the
/// stable id. Cards without it fall back to the `id` attribute, and cards
/// with neither are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnippetExtractor;

impl ListingExtractor for SnippetExtractor {
    fn extract(&self, raw: &RawListing) -> Option<Record> {
        let id = match raw.attr("data-testid").and_then(|t| t.split_once('_')) {
            Some((head, _)) if !head.is_empty() => head,
            _ => raw.attr("id")?,
        };
        let id = normalize_text(id);
        if id.is_empty() {
            return None;
        }

        let mut record = Record::new(id);

        if let Some(title) = clean(raw.attr("aria-label").or_else(|| raw.text("title"))) {
            record = record.with_title(title);
        }
        if let Some(href) = raw.attr("href") {
            record = record.with_href(href);
        }
        if let Some(price) = clean(raw.text("price")) {
            record = record.with_price(price);
        }
        if let Some(description) = clean(raw.text("description")) {
            record = record.with_description(description);
        }
        if let Some(location) = clean(raw.text("location")) {
            record = record.with_location(location);
        }
        if let Some(preferred_time) = clean(raw.text("preferred_time")) {
            record = record.with_preferred_time(preferred_time);
        }
        if let Some(posted_ago) = clean(raw.text("posted_ago")) {
            record = record.with_posted_ago(posted_ago);
        }
        if let Some(client_name) = clean(raw.text("client_name")) {
            record = record.with_client_name(client_name);
        }

        Some(record)
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    let normalized = normalize_text(value?);
    (!normalized.is_empty()).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_comes_from_the_testid_prefix() {
        let raw = RawListing::new()
            .with_attr("data-testid", "98765_order-snippet")
            .with_attr("aria-label", "Build a chat bot")
            .with_attr("href", "/order/98765")
            .with_text("price", "до\u{a0}30 000 ₽")
            .with_text("description", "  Need   a bot\nfor bookings  ");

        let record = SnippetExtractor.extract(&raw).unwrap();
        assert_eq!(record.id, "98765");
        assert_eq!(record.title.as_deref(), Some("Build a chat bot"));
        assert_eq!(record.href.as_deref(), Some("/order/98765"));
        assert_eq!(record.price.as_deref(), Some("до 30 000 ₽"));
        assert_eq!(record.description.as_deref(), Some("Need a bot for bookings"));
    }

    #[test]
    fn falls_back_to_the_id_attribute() {
        let raw = RawListing::new()
            .with_attr("data-testid", "no-underscore-here")
            .with_attr("id", "abc-1");
        assert_eq!(SnippetExtractor.extract(&raw).unwrap().id, "abc-1");
    }

    #[test]
    fn title_falls_back_to_the_heading_text() {
        let raw = RawListing::new()
            .with_attr("id", "1")
            .with_text("title", "Heading title");
        let record = SnippetExtractor.extract(&raw).unwrap();
        assert_eq!(record.title.as_deref(), Some("Heading title"));
    }

    #[test]
    fn cards_without_any_id_are_dropped() {
        let raw = RawListing::new().with_text("title", "orphan card");
        assert!(SnippetExtractor.extract(&raw).is_none());

        let blank = RawListing::new().with_attr("id", "   ");
        assert!(SnippetExtractor.extract(&blank).is_none());
    }
}
