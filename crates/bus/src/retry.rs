//! Redelivery policy and exhausted-attempt recovery.

use std::time::Duration;

use async_trait::async_trait;
use common::{EventEnvelope, Topic};

use crate::error::HandlerError;

/// Redelivery budget and backoff for one consumer group.
///
/// Applies uniformly to every consumer: on a retryable handler error the
/// event is redelivered after `base_delay * multiplier^(attempt - 1)`,
/// up to `max_attempts` total attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first delivery.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub base_delay: Duration,

    /// Backoff multiplier applied per subsequent attempt.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy with negligible delays, for tests.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            multiplier: 2,
        }
    }

    /// Returns the delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * self.multiplier.pow(attempt.saturating_sub(1))
    }
}

/// Invoked when a delivery has exhausted its attempt budget.
///
/// The default implementation logs and abandons the event. A store-backed
/// hook (poison-message persistence) can be slotted in without touching
/// consumers.
#[async_trait]
pub trait RecoveryHook: Send + Sync {
    /// Called once per abandoned delivery.
    async fn on_exhausted(
        &self,
        topic: Topic,
        group: &str,
        event: &EventEnvelope,
        error: &HandlerError,
    );
}

/// Recovery hook that logs the abandoned event and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRecovery;

#[async_trait]
impl RecoveryHook for LoggingRecovery {
    async fn on_exhausted(
        &self,
        topic: Topic,
        group: &str,
        event: &EventEnvelope,
        error: &HandlerError,
    ) {
        tracing::error!(
            %topic,
            group,
            event_type = event.event_type(),
            correlation_id = %event.correlation_id,
            %error,
            "abandoning event after exhausted redelivery attempts"
        );
    }
}
