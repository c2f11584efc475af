//! Order record.

use chrono::{DateTime, Utc};
use common::{CorrelationId, CustomerInfo, Money, OrderId, OrderLine};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// An order as the orders service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Saga key. Accepted from the caller or generated at creation.
    pub correlation_id: CorrelationId,

    pub customer_info: CustomerInfo,
    pub order_items: Vec<OrderLine>,

    /// Declared total, validated against the line items at creation.
    pub total_amount: Money,

    pub status: OrderStatus,

    /// Free-text notes; manual status overrides append here.
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter.
    pub version: u64,
}
