//! Bus consumer for the notification service.
//!
//! Subscribes to all three topics; in-transit updates are tracking noise
//! and do not notify.

use std::sync::Arc;

use async_trait::async_trait;
use common::{EventEnvelope, EventPayload};
use event_bus::{EventConsumer, HandlerError};

use crate::dispatcher::NotificationDispatcher;

/// Consumer group name for the notification service.
pub const GROUP: &str = "notification-service-group";

/// Dispatches every notified event kind to its handler.
pub struct NotificationConsumer {
    dispatcher: Arc<NotificationDispatcher>,
}

impl NotificationConsumer {
    /// Creates a consumer over the dispatcher.
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventConsumer for NotificationConsumer {
    async fn handle(&self, event: &EventEnvelope) -> Result<(), HandlerError> {
        let outcome = match &event.payload {
            EventPayload::OrderCreated(data) => {
                self.dispatcher.on_order_created(event, data).await
            }
            EventPayload::OrderConfirmed(data) => {
                self.dispatcher.on_order_confirmed(event, data).await
            }
            EventPayload::OrderRejected(data) => {
                self.dispatcher.on_order_rejected(event, data).await
            }
            EventPayload::OrderShipped(data) => {
                self.dispatcher.on_order_shipped(event, data).await
            }
            EventPayload::OrderDelivered(data) => {
                self.dispatcher.on_order_delivered(event, data).await
            }
            EventPayload::OrderInTransit(_) => return Ok(()),
        };
        outcome.map(|_| ()).map_err(Into::into)
    }
}
