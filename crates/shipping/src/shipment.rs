//! Shipment record.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CorrelationId, Money, OrderId, ShipmentId};
use serde::{Deserialize, Serialize};

use crate::status::ShipmentStatus;

/// A shipment, created lazily on order confirmation.
///
/// One shipment per correlation id; the tracking number is unique across
/// shipments. Mutations go through [`ShipmentManager`](crate::ShipmentManager)
/// and are persisted with an optimistic version check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Shipment identity.
    pub id: ShipmentId,

    /// The order's saga key. Unique per shipment.
    pub correlation_id: CorrelationId,

    /// The order being shipped.
    pub order_id: OrderId,

    /// Carrier tracking number. Unique.
    pub tracking_number: String,

    /// Assigned carrier code.
    pub carrier: String,

    /// Lifecycle status.
    pub status: ShipmentStatus,

    /// Name of the person the shipment is addressed to.
    pub recipient: String,

    /// Destination address.
    pub shipping_address: String,

    /// Estimated package weight in kilograms.
    pub weight_kg: f64,

    /// Shipping cost charged for this shipment.
    pub shipping_cost: Money,

    /// When the shipment left the warehouse.
    pub shipped_at: Option<DateTime<Utc>>,

    /// Estimated delivery date computed at creation.
    pub estimated_delivery_date: NaiveDate,

    /// Actual delivery date, stamped on delivery.
    pub actual_delivery_date: Option<NaiveDate>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record last changed.
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter.
    pub version: u64,
}
