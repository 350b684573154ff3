//! Telegram message rendering for discovered orders.

use monitor::{Record, RecordFormatter};
use url::Url;

/// Long descriptions are cut here; Telegram rejects messages past 4096
/// chars and the tail of a long brief rarely matters.
const MAX_DESCRIPTION_CHARS: usize = 3000;

/// Renders an order as Telegram HTML: bold labels, escaped user content,
/// and listing links resolved against the board origin.
#[derive(Debug, Clone)]
pub struct OrderFormatter {
    base: Url,
}

impl OrderFormatter {
    /// `page_url` is the listing page; relative card links resolve against
    /// it.
    pub fn new(page_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(page_url)?,
        })
    }

    fn absolute_link(&self, href: &str) -> String {
        self.base
            .join(href)
            .map(|joined| joined.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

impl RecordFormatter for OrderFormatter {
    fn format(&self, order: &Record) -> String {
        let mut lines = vec![format!(
            "🧾 <b>Title:</b> {}",
            escape(order.title.as_deref().unwrap_or("(untitled)"))
        )];

        if let Some(price) = &order.price {
            lines.push(format!("💰 <b>Budget:</b> {}", escape(price)));
        }

        if let Some(description) = &order.description {
            let mut text: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                text.push('…');
            }
            lines.push("\n📝 <b>Description:</b>".to_string());
            lines.push(escape(&text));
        }

        if let Some(href) = &order.href {
            lines.push(format!("🔗 <b>Link:</b> {}", escape(&self.absolute_link(href))));
        }

        lines.push(format!("🆔 <b>ID:</b> <code>{}</code>", escape(&order.id)));

        if let Some(preferred_time) = &order.preferred_time {
            lines.push(format!("🗓 <b>Preferred time:</b> {}", escape(preferred_time)));
        }
        if let Some(posted_ago) = &order.posted_ago {
            lines.push(format!("⏱ <b>Posted:</b> {}", escape(posted_ago)));
        }

        lines.join("\n")
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
