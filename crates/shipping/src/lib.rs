//! Shipment lifecycle manager.
//!
//! Owns shipment records. Reacts to order-confirmed events by lazily
//! creating a shipment in PREPARING, and exposes the explicit transition
//! operations (ship, mark-in-transit, mark-delivered) that drive the
//! lifecycle and emit shipping events. Each transition method is the single
//! authority for its precondition; violating it is a business error that
//! never triggers bus redelivery.

pub mod carrier;
pub mod consumer;
pub mod error;
pub mod manager;
pub mod shipment;
pub mod status;
pub mod store;

pub use carrier::{Carrier, CarrierDirectory};
pub use consumer::ShippingConsumer;
pub use error::ShippingError;
pub use manager::ShipmentManager;
pub use shipment::Shipment;
pub use status::ShipmentStatus;
pub use store::{InMemoryShipmentStore, ShipmentStore};
