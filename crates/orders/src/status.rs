//! Order state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// The state of an order in its lifecycle.
///
/// Allowed transitions:
/// ```text
/// CREATED    ──► CONFIRMED | REJECTED | CANCELLED
/// CONFIRMED  ──► SHIPPED | CANCELLED
/// SHIPPED    ──► IN_TRANSIT | DELIVERED
/// IN_TRANSIT ──► DELIVERED
/// ```
///
/// `REJECTED`, `DELIVERED`, and `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Created,
    Confirmed,
    Rejected,
    Shipped,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the lifecycle table allows moving to `next` from here.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Created, Confirmed | Rejected | Cancelled)
                | (Confirmed, Shipped | Cancelled)
                | (Shipped, InTransit | Delivered)
                | (InTransit, Delivered)
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Rejected | OrderStatus::Delivered | OrderStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    /// Case-insensitive parse of the wire spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(OrderStatus::Created),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "REJECTED" => Ok(OrderStatus::Rejected),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "IN_TRANSIT" => Ok(OrderStatus::InTransit),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(OrderError::UnknownStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_fans_out_to_three_states() {
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Rejected));
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn shipped_can_skip_in_transit() {
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::InTransit));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [
            OrderStatus::Rejected,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                OrderStatus::Created,
                OrderStatus::Confirmed,
                OrderStatus::Shipped,
                OrderStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            "in_transit".parse::<OrderStatus>().unwrap(),
            OrderStatus::InTransit
        );
        assert_eq!(
            "Cancelled".parse::<OrderStatus>().unwrap(),
            OrderStatus::Cancelled
        );
        assert!(matches!(
            "SHIPPING".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus(_))
        ));
    }
}
