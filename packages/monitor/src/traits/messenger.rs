//! Messaging channel traits.

use async_trait::async_trait;

use crate::error::SendResult;
use crate::types::record::Record;

/// Outbound "send text" capability with no read or ack semantics assumed.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, text: &str) -> SendResult<()>;
}

/// Renders a record into the outbound message markup.
pub trait RecordFormatter: Send + Sync {
    fn format(&self, record: &Record) -> String;
}
