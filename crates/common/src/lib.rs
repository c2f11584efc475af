//! Shared types for the order fulfillment services.
//!
//! Every service communicates only through the event contract defined here;
//! nothing else is shared across service boundaries. The contract carries a
//! correlation id that threads one order through every service's records.

pub mod customer;
pub mod event;
pub mod topics;
pub mod types;

pub use customer::CustomerInfo;
pub use event::{
    EventEnvelope, EventPayload, OrderConfirmedData, OrderCreatedData, OrderDeliveredData,
    OrderInTransitData, OrderRejectedData, OrderShippedData,
};
pub use topics::Topic;
pub use types::{
    CorrelationId, EventId, Money, NotificationId, OrderId, OrderLine, ProductId, ShipmentId,
};
