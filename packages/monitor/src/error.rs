//! Typed errors for the monitoring pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors surfaced by a page driver.
#[derive(Debug, Error)]
pub enum PageError {
    /// Navigation or reload failed
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The browser session is gone (closed, crashed, disconnected)
    #[error("browser session lost: {0}")]
    Session(String),

    /// Any other driver-level failure
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from the persistent stores (dedup set, order log, cursor).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of state to be persisted failed
    #[error("could not encode state for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the outbound messaging channel.
#[derive(Debug, Error)]
pub enum SendError {
    /// The request never reached the channel
    #[error("send transport failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The channel answered but refused the message
    #[error("channel rejected message: {0}")]
    Rejected(String),
}

/// Any failure inside one poll cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for page driver operations.
pub type PageResult<T> = std::result::Result<T, PageError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for messaging operations.
pub type SendResult<T> = std::result::Result<T, SendError>;
