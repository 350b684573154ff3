//! Durable state: dedup set, append-only order log, notify cursor.
//!
//! All three are small UTF-8 files with single-writer access; the poller
//! owns the dedup set and the log, the notifier owns the cursor. Running a
//! second poller against the same data directory is unsupported.

pub mod cursor;
pub mod dedup;
pub mod order_log;

pub use cursor::Cursor;
pub use dedup::DedupStore;
pub use order_log::OrderLog;
