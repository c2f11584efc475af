//! Order error types.

use common::OrderId;
use thiserror::Error;

use crate::status::OrderStatus;

/// One failed validation rule, addressed to a request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Path of the offending field, e.g. `order_items[2].quantity`.
    pub field: String,

    /// Human-readable rule description.
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The create request broke one or more business rules. Carries every
    /// violation, not just the first.
    #[error("Order validation failed: {}", format_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// The requested status is not a recognized enum value.
    #[error("Invalid order status: {0}")]
    UnknownStatus(String),

    /// The transition is not allowed by the lifecycle table.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// No order matches the given lookup key.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// A concurrent writer modified the order first.
    #[error("Concurrent modification of order {order_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// The order-created event could not be published.
    #[error("Failed to publish order event: {0}")]
    Publish(String),

    /// The backing store could not be reached.
    #[error("Storage unavailable: {0}")]
    Storage(String),
}

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
