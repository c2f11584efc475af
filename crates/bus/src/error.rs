//! Bus and handler error types.

use thiserror::Error;

/// Errors raised by the bus itself.
#[derive(Debug, Error)]
pub enum BusError {
    /// The event could not be handed to the transport.
    #[error("Publish to topic '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },
}

/// Outcome classification for a failed delivery attempt.
///
/// The split drives the redelivery decision: business-rule failures are
/// terminal for the current attempt (the handler already took its
/// compensating action or the request was simply invalid), while
/// infrastructure failures are expected to succeed on a later attempt.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Business-rule failure. Never redelivered.
    #[error("business rule violation: {0}")]
    Business(String),

    /// Infrastructure failure. Eligible for redelivery.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl HandlerError {
    /// Returns true if the bus should redeliver after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HandlerError::Transient(_))
    }
}
