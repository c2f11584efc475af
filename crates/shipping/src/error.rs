//! Shipping error types.

use common::{CorrelationId, ShipmentId};
use event_bus::HandlerError;
use thiserror::Error;

use crate::status::ShipmentStatus;

/// Errors that can occur during shipping operations.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// No shipment matches the given lookup key.
    #[error("Shipment not found: {0}")]
    NotFound(String),

    /// A shipment already exists for the correlation id.
    #[error("Shipment already exists for correlation id {0}")]
    AlreadyExists(CorrelationId),

    /// The shipment is not in the state the transition requires. A caller
    /// error, not a transient fault.
    #[error("Cannot {action} shipment in status {current}")]
    InvalidState {
        action: &'static str,
        current: ShipmentStatus,
    },

    /// A concurrent writer modified the shipment first.
    #[error("Concurrent modification of shipment {shipment_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        shipment_id: ShipmentId,
        expected: u64,
        actual: u64,
    },

    /// The backing store could not be reached.
    #[error("Storage unavailable: {0}")]
    Storage(String),
}

/// Result type for shipping operations.
pub type Result<T> = std::result::Result<T, ShippingError>;

impl From<ShippingError> for HandlerError {
    fn from(err: ShippingError) -> Self {
        match err {
            ShippingError::NotFound(_)
            | ShippingError::AlreadyExists(_)
            | ShippingError::InvalidState { .. } => HandlerError::Business(err.to_string()),
            ShippingError::VersionConflict { .. } | ShippingError::Storage(_) => {
                HandlerError::Transient(err.to_string())
            }
        }
    }
}
