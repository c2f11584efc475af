//! Inventory error types.

use common::ProductId;
use event_bus::HandlerError;
use thiserror::Error;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// No product exists with the given business key.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Available stock does not cover the requested quantity.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Product counters and the ledger disagree. Must not occur under the
    /// locking discipline; surfaced loudly instead of silently corrected.
    #[error("Counter mismatch for product {product_id}: {detail}")]
    CounterMismatch { product_id: ProductId, detail: String },

    /// The backing store could not be reached.
    #[error("Storage unavailable: {0}")]
    Storage(String),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

impl From<InventoryError> for HandlerError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(_) | InventoryError::InsufficientStock { .. } => {
                HandlerError::Business(err.to_string())
            }
            InventoryError::CounterMismatch { .. } | InventoryError::Storage(_) => {
                HandlerError::Transient(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_do_not_trigger_redelivery() {
        let err: HandlerError = InventoryError::ProductNotFound(ProductId::new("SKU-1")).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn integrity_and_storage_errors_trigger_redelivery() {
        let err: HandlerError = InventoryError::Storage("connection refused".into()).into();
        assert!(err.is_retryable());

        let err: HandlerError = InventoryError::CounterMismatch {
            product_id: ProductId::new("SKU-1"),
            detail: "reserved below ledger balance".into(),
        }
        .into();
        assert!(err.is_retryable());
    }
}
