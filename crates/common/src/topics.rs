//! Bus topic names.

use serde::{Deserialize, Serialize};

/// The topics events are published to.
///
/// Each topic has a single producing service; every interested service
/// subscribes with its own named consumer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Produced by the orders service (order-created).
    Orders,

    /// Produced by the inventory service (order-confirmed, order-rejected).
    Inventory,

    /// Produced by the shipping service (order-shipped, order-in-transit,
    /// order-delivered).
    Shipping,
}

impl Topic {
    /// Returns the wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Orders => "orders.events",
            Topic::Inventory => "inventory.events",
            Topic::Shipping => "shipping.events",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
