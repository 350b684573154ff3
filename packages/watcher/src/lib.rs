//! Application wiring for the board watcher.
//!
//! The `monitor` crate owns the pipeline mechanics; this crate owns the
//! semantics of one specific board: which page, which cards, which keywords
//! count as a match, how an order reads in Telegram, and the chromiumoxide
//! driver that renders it all.

pub mod browser;
pub mod config;
pub mod extract;
pub mod filter;
pub mod format;
pub mod messenger;
pub mod session;

pub use browser::{ChromeBrowser, ChromePage, PageSnapshot, SnippetQuery, SnippetSelectors};
pub use config::Config;
pub use extract::SnippetExtractor;
pub use filter::KeywordFilter;
pub use format::OrderFormatter;
pub use messenger::TelegramMessenger;
