//! Shipment state machine.

use serde::{Deserialize, Serialize};

/// The state of a shipment in its lifecycle.
///
/// State transitions:
/// ```text
/// Preparing ──► Shipped ──► InTransit ──► (OutForDelivery) ──► Delivered
///      │            │            │               │
///      └────────────┴────────────┴───────────────┴──► Returned / Cancelled
/// ```
///
/// `Delivered`, `Returned`, and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShipmentStatus {
    /// Shipment created, waiting to leave the warehouse.
    #[default]
    Preparing,

    /// Shipment handed to the carrier.
    Shipped,

    /// Moving through the carrier network.
    InTransit,

    /// On the delivery vehicle.
    OutForDelivery,

    /// Delivered to the customer (terminal).
    Delivered,

    /// Returned to sender (terminal).
    Returned,

    /// Cancelled (terminal).
    Cancelled,
}

impl ShipmentStatus {
    /// Returns true if the shipment can be shipped from this state.
    pub fn can_ship(&self) -> bool {
        matches!(self, ShipmentStatus::Preparing)
    }

    /// Returns true if the shipment can be marked in transit.
    pub fn can_mark_in_transit(&self) -> bool {
        matches!(self, ShipmentStatus::Shipped)
    }

    /// Returns true if the shipment can be marked delivered.
    pub fn can_mark_delivered(&self) -> bool {
        matches!(self, ShipmentStatus::InTransit | ShipmentStatus::OutForDelivery)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Returned | ShipmentStatus::Cancelled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Preparing => "Preparing",
            ShipmentStatus::Shipped => "Shipped",
            ShipmentStatus::InTransit => "InTransit",
            ShipmentStatus::OutForDelivery => "OutForDelivery",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Returned => "Returned",
            ShipmentStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_preparing() {
        assert_eq!(ShipmentStatus::default(), ShipmentStatus::Preparing);
    }

    #[test]
    fn only_preparing_can_ship() {
        assert!(ShipmentStatus::Preparing.can_ship());
        assert!(!ShipmentStatus::Shipped.can_ship());
        assert!(!ShipmentStatus::InTransit.can_ship());
        assert!(!ShipmentStatus::Delivered.can_ship());
    }

    #[test]
    fn only_shipped_can_mark_in_transit() {
        assert!(!ShipmentStatus::Preparing.can_mark_in_transit());
        assert!(ShipmentStatus::Shipped.can_mark_in_transit());
        assert!(!ShipmentStatus::InTransit.can_mark_in_transit());
    }

    #[test]
    fn delivery_requires_in_transit_or_out_for_delivery() {
        assert!(!ShipmentStatus::Preparing.can_mark_delivered());
        assert!(!ShipmentStatus::Shipped.can_mark_delivered());
        assert!(ShipmentStatus::InTransit.can_mark_delivered());
        assert!(ShipmentStatus::OutForDelivery.can_mark_delivered());
        assert!(!ShipmentStatus::Delivered.can_mark_delivered());
    }

    #[test]
    fn terminal_states() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Returned.is_terminal());
        assert!(ShipmentStatus::Cancelled.is_terminal());
        assert!(!ShipmentStatus::Preparing.is_terminal());
        assert!(!ShipmentStatus::InTransit.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(ShipmentStatus::OutForDelivery.to_string(), "OutForDelivery");
    }
}
