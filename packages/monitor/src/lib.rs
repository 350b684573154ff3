//! Order-Board Monitoring and Delivery Pipeline
//!
//! Watches a dynamic listing page for newly posted orders, keeps each
//! discovery durable, and relays accepted orders to a messaging channel,
//! surviving page-load failures, session loss, and process crashes.
//!
//! # Design Philosophy
//!
//! **Files are the only rendezvous point.**
//!
//! - The poller runs as an isolated child process and is the sole writer of
//!   the order log and the sole owner of the dedup set.
//! - The notifier tails the log through a persisted byte cursor; it shares
//!   no memory with the poller, so either side can crash and restart
//!   independently.
//! - Page rendering, field extraction, the match predicate, and the
//!   messaging channel are consumed through narrow trait seams so the
//!   pipeline itself stays deterministic and testable.
//!
//! # Modules
//!
//! - [`traits`] - Seams for the external collaborators (page driver,
//!   extractor, filter, messenger, diagnostics)
//! - [`types`] - Records and component configuration
//! - [`store`] - Durable dedup set, append-only order log, notify cursor
//! - [`backoff`] - Recovery delays and randomized cooldowns
//! - [`poller`] - The refresh-harvest-filter-dedup-append cycle
//! - [`notifier`] - Cursor-tailing delivery loop
//! - [`supervisor`] - Bounded restarts for the poller child process
//! - [`testing`] - Mock implementations for tests

pub mod backoff;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod store;
pub mod supervisor;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{CycleError, PageError, SendError, StoreError};
pub use traits::{
    diagnostics::{DiagnosticSink, NoopDiagnostics},
    extract::ListingExtractor,
    filter::RecordFilter,
    messenger::{Messenger, RecordFormatter},
    page::PageDriver,
};
pub use types::{
    config::{NotifierConfig, PollerConfig, SupervisorConfig},
    record::{normalize_text, RawListing, Record},
};

pub use backoff::BackoffPolicy;
pub use notifier::Notifier;
pub use poller::{CycleOutcome, Poller};
pub use store::{Cursor, DedupStore, OrderLog};
pub use supervisor::Supervisor;
