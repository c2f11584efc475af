//! Consumer-side contract.

use async_trait::async_trait;
use common::EventEnvelope;

use crate::error::HandlerError;

/// A subscriber invoked once per event per consumer group.
///
/// Implementations must be safe under concurrent invocation for different
/// correlation ids and under redelivery of the same event after a partial
/// failure; no dedup layer is provided. Kinds a consumer is not interested
/// in must be silently ignored (return `Ok`), never treated as an error.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    /// Handles one delivered event.
    async fn handle(&self, event: &EventEnvelope) -> Result<(), HandlerError>;
}
