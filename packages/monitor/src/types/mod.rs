//! Data types for the monitoring pipeline.

pub mod config;
pub mod record;

pub use config::{NotifierConfig, PollerConfig, SupervisorConfig};
pub use record::{normalize_text, RawListing, Record};
