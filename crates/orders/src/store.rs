//! Order storage with optimistic versioning.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CorrelationId, OrderId};
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};
use crate::order::Order;

/// Persistence seam for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order.
    async fn insert(&self, order: Order) -> Result<()>;

    /// Looks an order up by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Looks an order up by correlation id.
    async fn get_by_correlation(&self, correlation_id: CorrelationId) -> Result<Option<Order>>;

    /// Persists a modified order at its loaded version, returning it at the
    /// new version. Rejects stale writes with
    /// [`OrderError::VersionConflict`].
    async fn update(&self, order: Order) -> Result<Order>;
}

/// In-memory order store for tests and the demo binary.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn get_by_correlation(&self, correlation_id: CorrelationId) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.correlation_id == correlation_id)
            .cloned())
    }

    async fn update(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order.id)
            .ok_or_else(|| OrderError::NotFound(order.id.to_string()))?;

        if current.version != order.version {
            return Err(OrderError::VersionConflict {
                order_id: order.id,
                expected: order.version,
                actual: current.version,
            });
        }

        order.version += 1;
        order.updated_at = chrono::Utc::now();
        orders.insert(order.id, order.clone());
        Ok(order)
    }
}
