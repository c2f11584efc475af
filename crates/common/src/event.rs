//! The cross-service event contract.
//!
//! Every event carries the same envelope fields (event id, correlation id,
//! order id, timestamp) plus a kind-specific payload. The payload is a closed
//! tagged union with an explicit discriminator so a single topic can
//! multiplex heterogeneous payloads; consumers match on the variants they
//! care about and ignore the rest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customer::CustomerInfo;
use crate::types::{CorrelationId, EventId, Money, OrderId, OrderLine, ShipmentId};

/// An event on the wire: envelope fields plus the kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Opaque unique identifier of this event instance.
    pub event_id: EventId,

    /// Saga key, stable across the whole order lifecycle.
    pub correlation_id: CorrelationId,

    /// The order this event belongs to.
    pub order_id: OrderId,

    /// When the event was produced.
    pub timestamp: DateTime<Utc>,

    /// Kind-specific payload.
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl EventEnvelope {
    /// Creates an envelope around a payload, stamping a fresh event id and
    /// the current time.
    pub fn new(correlation_id: CorrelationId, order_id: OrderId, payload: EventPayload) -> Self {
        Self {
            event_id: EventId::new(),
            correlation_id,
            order_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Returns the event kind discriminator.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

/// The closed set of event kinds exchanged between services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "data")]
pub enum EventPayload {
    /// An order was accepted by the orders service; starts the saga.
    OrderCreated(OrderCreatedData),

    /// Inventory was reserved for every line item.
    OrderConfirmed(OrderConfirmedData),

    /// The order could not be fulfilled; any reservations were released.
    OrderRejected(OrderRejectedData),

    /// The shipment left the warehouse; reservations become deductions.
    OrderShipped(OrderShippedData),

    /// The shipment is moving through the carrier network.
    OrderInTransit(OrderInTransitData),

    /// The shipment reached the customer (terminal).
    OrderDelivered(OrderDeliveredData),
}

impl EventPayload {
    /// Returns the wire discriminator for this kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::OrderCreated(_) => "OrderCreated",
            EventPayload::OrderConfirmed(_) => "OrderConfirmed",
            EventPayload::OrderRejected(_) => "OrderRejected",
            EventPayload::OrderShipped(_) => "OrderShipped",
            EventPayload::OrderInTransit(_) => "OrderInTransit",
            EventPayload::OrderDelivered(_) => "OrderDelivered",
        }
    }
}

/// Data for OrderCreated events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// Customer contact and shipping details.
    pub customer_info: CustomerInfo,
    /// The ordered line items.
    pub order_items: Vec<OrderLine>,
    /// Declared order total.
    pub total_amount: Money,
}

/// Data for OrderConfirmed events. Echoes the original order payload so
/// downstream services never have to look the order up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedData {
    /// Customer contact and shipping details.
    pub customer_info: CustomerInfo,
    /// The ordered line items.
    pub order_items: Vec<OrderLine>,
    /// Declared order total, unchanged from the created event.
    pub total_amount: Money,
}

/// Data for OrderRejected events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRejectedData {
    /// Human-readable reason listing every failing product.
    pub reason: String,
    /// Email the rejection notice should go to.
    pub customer_email: String,
}

/// Data for OrderShipped events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    /// The shipment record this event originates from.
    pub shipment_id: ShipmentId,
    /// Carrier tracking number.
    pub tracking_number: String,
    /// Carrier code.
    pub carrier: String,
    /// Destination address.
    pub shipping_address: String,
}

/// Data for OrderInTransit events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInTransitData {
    /// The shipment record this event originates from.
    pub shipment_id: ShipmentId,
    /// Carrier tracking number.
    pub tracking_number: String,
    /// Last known location label.
    pub current_location: String,
    /// Estimated delivery date, ISO formatted.
    pub estimated_delivery: String,
}

/// Data for OrderDelivered events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeliveredData {
    /// The shipment record this event originates from.
    pub shipment_id: ShipmentId,
    /// Carrier tracking number.
    pub tracking_number: String,
    /// Address the shipment was delivered to.
    pub delivered_to: String,
    /// Who signed for the delivery.
    pub signed_by: String,
}

// Convenience constructors
impl EventEnvelope {
    /// Creates an OrderCreated envelope.
    pub fn order_created(
        correlation_id: CorrelationId,
        order_id: OrderId,
        customer_info: CustomerInfo,
        order_items: Vec<OrderLine>,
        total_amount: Money,
    ) -> Self {
        Self::new(
            correlation_id,
            order_id,
            EventPayload::OrderCreated(OrderCreatedData {
                customer_info,
                order_items,
                total_amount,
            }),
        )
    }

    /// Creates an OrderConfirmed envelope echoing the created payload.
    pub fn order_confirmed(
        correlation_id: CorrelationId,
        order_id: OrderId,
        original: &OrderCreatedData,
    ) -> Self {
        Self::new(
            correlation_id,
            order_id,
            EventPayload::OrderConfirmed(OrderConfirmedData {
                customer_info: original.customer_info.clone(),
                order_items: original.order_items.clone(),
                total_amount: original.total_amount,
            }),
        )
    }

    /// Creates an OrderRejected envelope.
    pub fn order_rejected(
        correlation_id: CorrelationId,
        order_id: OrderId,
        reason: impl Into<String>,
        customer_email: impl Into<String>,
    ) -> Self {
        Self::new(
            correlation_id,
            order_id,
            EventPayload::OrderRejected(OrderRejectedData {
                reason: reason.into(),
                customer_email: customer_email.into(),
            }),
        )
    }

    /// Creates an OrderShipped envelope.
    pub fn order_shipped(
        correlation_id: CorrelationId,
        order_id: OrderId,
        shipment_id: ShipmentId,
        tracking_number: impl Into<String>,
        carrier: impl Into<String>,
        shipping_address: impl Into<String>,
    ) -> Self {
        Self::new(
            correlation_id,
            order_id,
            EventPayload::OrderShipped(OrderShippedData {
                shipment_id,
                tracking_number: tracking_number.into(),
                carrier: carrier.into(),
                shipping_address: shipping_address.into(),
            }),
        )
    }

    /// Creates an OrderInTransit envelope.
    pub fn order_in_transit(
        correlation_id: CorrelationId,
        order_id: OrderId,
        shipment_id: ShipmentId,
        tracking_number: impl Into<String>,
        current_location: impl Into<String>,
        estimated_delivery: impl Into<String>,
    ) -> Self {
        Self::new(
            correlation_id,
            order_id,
            EventPayload::OrderInTransit(OrderInTransitData {
                shipment_id,
                tracking_number: tracking_number.into(),
                current_location: current_location.into(),
                estimated_delivery: estimated_delivery.into(),
            }),
        )
    }

    /// Creates an OrderDelivered envelope.
    pub fn order_delivered(
        correlation_id: CorrelationId,
        order_id: OrderId,
        shipment_id: ShipmentId,
        tracking_number: impl Into<String>,
        delivered_to: impl Into<String>,
        signed_by: impl Into<String>,
    ) -> Self {
        Self::new(
            correlation_id,
            order_id,
            EventPayload::OrderDelivered(OrderDeliveredData {
                shipment_id,
                tracking_number: tracking_number.into(),
                delivered_to: delivered_to.into(),
                signed_by: signed_by.into(),
            }),
        )
    }
}
