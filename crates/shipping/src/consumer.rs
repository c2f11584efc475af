//! Bus consumer for the shipping service.

use std::sync::Arc;

use async_trait::async_trait;
use common::{EventEnvelope, EventPayload};
use event_bus::{EventConsumer, HandlerError};

use crate::manager::ShipmentManager;

/// Consumer group name for the shipping service.
pub const GROUP: &str = "shipping-service-group";

/// Dispatches order-confirmed events to the shipment manager. Every other
/// kind is silently ignored.
pub struct ShippingConsumer {
    manager: Arc<ShipmentManager>,
}

impl ShippingConsumer {
    /// Creates a consumer over the manager.
    pub fn new(manager: Arc<ShipmentManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl EventConsumer for ShippingConsumer {
    async fn handle(&self, event: &EventEnvelope) -> Result<(), HandlerError> {
        match &event.payload {
            EventPayload::OrderConfirmed(data) => self
                .manager
                .on_order_confirmed(event, data)
                .await
                .map(|_| ())
                .map_err(Into::into),
            _ => Ok(()),
        }
    }
}
