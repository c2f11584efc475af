//! Shipment storage with optimistic versioning.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CorrelationId;
use tokio::sync::RwLock;

use crate::error::{Result, ShippingError};
use crate::shipment::Shipment;

/// Persistence seam for shipments.
///
/// `update` is the compare-and-swap half of the storage contract: the
/// caller passes the shipment at the version it was loaded at, and the
/// write is rejected with [`ShippingError::VersionConflict`] if a
/// concurrent writer got there first.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Inserts a new shipment. Fails with [`ShippingError::AlreadyExists`]
    /// if one exists for the correlation id.
    async fn insert(&self, shipment: Shipment) -> Result<()>;

    /// Looks a shipment up by correlation id.
    async fn get_by_correlation(&self, correlation_id: CorrelationId) -> Result<Option<Shipment>>;

    /// Looks a shipment up by tracking number.
    async fn get_by_tracking(&self, tracking_number: &str) -> Result<Option<Shipment>>;

    /// Persists a modified shipment, returning it at its new version.
    async fn update(&self, shipment: Shipment) -> Result<Shipment>;
}

/// In-memory shipment store for tests and the demo binary.
#[derive(Clone, Default)]
pub struct InMemoryShipmentStore {
    shipments: Arc<RwLock<HashMap<CorrelationId, Shipment>>>,
}

impl InMemoryShipmentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shipments in the store.
    pub async fn shipment_count(&self) -> usize {
        self.shipments.read().await.len()
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    async fn insert(&self, shipment: Shipment) -> Result<()> {
        let mut shipments = self.shipments.write().await;
        if shipments.contains_key(&shipment.correlation_id) {
            return Err(ShippingError::AlreadyExists(shipment.correlation_id));
        }
        shipments.insert(shipment.correlation_id, shipment);
        Ok(())
    }

    async fn get_by_correlation(&self, correlation_id: CorrelationId) -> Result<Option<Shipment>> {
        Ok(self.shipments.read().await.get(&correlation_id).cloned())
    }

    async fn get_by_tracking(&self, tracking_number: &str) -> Result<Option<Shipment>> {
        Ok(self
            .shipments
            .read()
            .await
            .values()
            .find(|s| s.tracking_number == tracking_number)
            .cloned())
    }

    async fn update(&self, mut shipment: Shipment) -> Result<Shipment> {
        let mut shipments = self.shipments.write().await;
        let current = shipments
            .get(&shipment.correlation_id)
            .ok_or_else(|| ShippingError::NotFound(shipment.correlation_id.to_string()))?;

        if current.version != shipment.version {
            return Err(ShippingError::VersionConflict {
                shipment_id: shipment.id,
                expected: shipment.version,
                actual: current.version,
            });
        }

        shipment.version += 1;
        shipment.updated_at = chrono::Utc::now();
        shipments.insert(shipment.correlation_id, shipment.clone());
        Ok(shipment)
    }
}
