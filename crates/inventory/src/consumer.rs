//! Bus consumer for the inventory service.

use std::sync::Arc;

use async_trait::async_trait;
use common::{EventEnvelope, EventPayload};
use event_bus::{EventConsumer, HandlerError};

use crate::engine::ReservationEngine;

/// Consumer group name for the inventory service.
pub const GROUP: &str = "inventory-service-group";

/// Dispatches order-created (from the `orders` topic) and order-shipped
/// (from the `shipping` topic) to the reservation engine. Every other kind
/// is silently ignored.
pub struct InventoryConsumer {
    engine: Arc<ReservationEngine>,
}

impl InventoryConsumer {
    /// Creates a consumer over the engine.
    pub fn new(engine: Arc<ReservationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl EventConsumer for InventoryConsumer {
    async fn handle(&self, event: &EventEnvelope) -> Result<(), HandlerError> {
        match &event.payload {
            EventPayload::OrderCreated(data) => self
                .engine
                .on_order_created(event, data)
                .await
                .map_err(Into::into),
            EventPayload::OrderShipped(_) => self
                .engine
                .on_order_shipped(event.correlation_id)
                .await
                .map_err(Into::into),
            _ => Ok(()),
        }
    }
}
