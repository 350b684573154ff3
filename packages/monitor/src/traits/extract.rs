//! Extractor trait - turning a raw harvest into a record.

use crate::types::record::{RawListing, Record};

/// Turns one harvested element into a [`Record`].
pub trait ListingExtractor: Send + Sync {
    /// `None` when the element carries no usable identifier; such elements
    /// are dropped before they reach any store.
    fn extract(&self, raw: &RawListing) -> Option<Record>;
}
