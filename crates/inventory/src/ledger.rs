//! Append-only stock movement ledger.
//!
//! Every reservation, release, and confirmation is recorded as an immutable
//! row keyed by the order's correlation id. The outstanding balance per
//! correlation id (RESERVED minus RELEASED minus CONFIRMED, per product) is
//! the source of truth for compensation and confirmation, which is what
//! makes both operations safe under redelivery.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CorrelationId, ProductId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// The kind of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    /// Temporary hold placed on stock.
    Reserved,

    /// Hold reversed (compensation).
    Released,

    /// Hold converted into a permanent stock deduction.
    Confirmed,
}

/// One immutable ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    /// Row identity.
    pub id: Uuid,

    /// The product the movement applies to.
    pub product_id: ProductId,

    /// Movement kind.
    pub kind: MovementKind,

    /// Quantity moved.
    pub quantity: u32,

    /// The order correlation id the movement is attributable to.
    pub reference_id: CorrelationId,

    /// Free-text note.
    pub note: String,

    /// When the movement was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl StockMovement {
    fn new(
        product_id: ProductId,
        kind: MovementKind,
        quantity: u32,
        reference_id: CorrelationId,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            kind,
            quantity,
            reference_id,
            note: note.into(),
            recorded_at: Utc::now(),
        }
    }

    /// Creates a RESERVED row.
    pub fn reserved(
        product_id: ProductId,
        quantity: u32,
        reference_id: CorrelationId,
        note: impl Into<String>,
    ) -> Self {
        Self::new(product_id, MovementKind::Reserved, quantity, reference_id, note)
    }

    /// Creates a RELEASED row.
    pub fn released(
        product_id: ProductId,
        quantity: u32,
        reference_id: CorrelationId,
        note: impl Into<String>,
    ) -> Self {
        Self::new(product_id, MovementKind::Released, quantity, reference_id, note)
    }

    /// Creates a CONFIRMED row.
    pub fn confirmed(
        product_id: ProductId,
        quantity: u32,
        reference_id: CorrelationId,
        note: impl Into<String>,
    ) -> Self {
        Self::new(product_id, MovementKind::Confirmed, quantity, reference_id, note)
    }
}

/// Computes the outstanding reservation per product for a set of movements.
///
/// Only strictly positive balances are returned; a fully released or
/// confirmed correlation id yields an empty map.
pub fn outstanding_balance(movements: &[StockMovement]) -> BTreeMap<ProductId, u32> {
    let mut balance: BTreeMap<ProductId, i64> = BTreeMap::new();
    for m in movements {
        let entry = balance.entry(m.product_id.clone()).or_insert(0);
        match m.kind {
            MovementKind::Reserved => *entry += m.quantity as i64,
            MovementKind::Released | MovementKind::Confirmed => *entry -= m.quantity as i64,
        }
    }
    balance
        .into_iter()
        .filter(|(_, qty)| *qty > 0)
        .map(|(id, qty)| (id, qty as u32))
        .collect()
}

/// Persistence seam for the movement ledger.
#[async_trait]
pub trait MovementLedger: Send + Sync {
    /// Appends one row. Rows are never updated or deleted.
    async fn append(&self, movement: StockMovement) -> Result<()>;

    /// Returns every row for a correlation id, oldest first.
    async fn movements_for(&self, reference_id: CorrelationId) -> Result<Vec<StockMovement>>;

    /// Outstanding reservation per product for a correlation id.
    async fn outstanding_for(
        &self,
        reference_id: CorrelationId,
    ) -> Result<BTreeMap<ProductId, u32>> {
        Ok(outstanding_balance(&self.movements_for(reference_id).await?))
    }

    /// Returns true if any RESERVED row exists for the correlation id,
    /// i.e. a reservation attempt already ran for this order.
    async fn has_reserved(&self, reference_id: CorrelationId) -> Result<bool> {
        Ok(self
            .movements_for(reference_id)
            .await?
            .iter()
            .any(|m| m.kind == MovementKind::Reserved))
    }
}

/// In-memory ledger for tests and the demo binary.
#[derive(Clone, Default)]
pub struct InMemoryMovementLedger {
    rows: Arc<RwLock<Vec<StockMovement>>>,
}

impl InMemoryMovementLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows in the ledger.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Rows of one kind for a correlation id.
    pub async fn rows_of_kind(
        &self,
        reference_id: CorrelationId,
        kind: MovementKind,
    ) -> Vec<StockMovement> {
        self.rows
            .read()
            .await
            .iter()
            .filter(|m| m.reference_id == reference_id && m.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MovementLedger for InMemoryMovementLedger {
    async fn append(&self, movement: StockMovement) -> Result<()> {
        self.rows.write().await.push(movement);
        Ok(())
    }

    async fn movements_for(&self, reference_id: CorrelationId) -> Result<Vec<StockMovement>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|m| m.reference_id == reference_id)
            .cloned()
            .collect())
    }
}
