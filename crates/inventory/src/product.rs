//! Product stock counters.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// A stocked product with its reservation counter.
///
/// Invariant: `0 <= reserved_quantity <= stock_quantity` at all times;
/// available stock is the difference. The mutating methods enforce the
/// invariant and must only be called while holding the product's exclusive
/// lock in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Business key, unique per product.
    pub product_id: ProductId,

    /// Human-readable product name.
    pub product_name: String,

    /// Units physically on hand.
    pub stock_quantity: u32,

    /// Units held by outstanding reservations.
    pub reserved_quantity: u32,

    /// Stock level below which the product should be reordered.
    pub reorder_level: u32,

    /// Current unit price.
    pub unit_price: Money,

    /// When the product record was created.
    pub created_at: DateTime<Utc>,

    /// When the counters last changed.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with the given starting stock and no reservations.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        stock_quantity: u32,
        reorder_level: u32,
        unit_price: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            stock_quantity,
            reserved_quantity: 0,
            reorder_level,
            unit_price,
            created_at: now,
            updated_at: now,
        }
    }

    /// Units available for new reservations.
    pub fn available(&self) -> u32 {
        self.stock_quantity - self.reserved_quantity
    }

    /// Returns true if the requested quantity can be reserved.
    pub fn can_reserve(&self, quantity: u32) -> bool {
        self.available() >= quantity
    }

    /// Returns true if on-hand stock has fallen to the reorder level.
    pub fn needs_reorder(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }

    /// Places a temporary, reversible hold on stock.
    pub fn reserve(&mut self, quantity: u32) -> Result<()> {
        if !self.can_reserve(quantity) {
            return Err(InventoryError::InsufficientStock {
                product_id: self.product_id.clone(),
                requested: quantity,
                available: self.available(),
            });
        }
        self.reserved_quantity += quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reverses a hold placed by [`reserve`](Self::reserve).
    pub fn release(&mut self, quantity: u32) -> Result<()> {
        if self.reserved_quantity < quantity {
            return Err(InventoryError::CounterMismatch {
                product_id: self.product_id.clone(),
                detail: format!(
                    "cannot release {quantity} units, only {} reserved",
                    self.reserved_quantity
                ),
            });
        }
        self.reserved_quantity -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Converts a reservation into a permanent stock deduction.
    pub fn confirm(&mut self, quantity: u32) -> Result<()> {
        if self.reserved_quantity < quantity {
            return Err(InventoryError::CounterMismatch {
                product_id: self.product_id.clone(),
                detail: format!(
                    "cannot confirm {quantity} units, only {} reserved",
                    self.reserved_quantity
                ),
            });
        }
        self.stock_quantity -= quantity;
        self.reserved_quantity -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }
}
