//! Trait seams for the external collaborators.
//!
//! The pipeline never talks to a browser, a DOM, or a messaging API
//! directly; everything outside the poll/dedup/deliver core comes in
//! through one of these traits.

pub mod diagnostics;
pub mod extract;
pub mod filter;
pub mod messenger;
pub mod page;

pub use diagnostics::{DiagnosticSink, NoopDiagnostics};
pub use extract::ListingExtractor;
pub use filter::RecordFilter;
pub use messenger::{Messenger, RecordFormatter};
pub use page::PageDriver;
