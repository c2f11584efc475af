//! Inventory reservation and compensation engine.
//!
//! Owns per-product stock/reservation counters and an append-only movement
//! ledger. Reacts to order-created events by reserving stock (or rejecting
//! the whole order), and to order-shipped events by converting reservations
//! into permanent stock deductions. Rejection-path compensation and the
//! standalone release operation are idempotent because they work off the
//! outstanding ledger balance per correlation id, never a processed flag.

pub mod consumer;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod product;
pub mod store;

pub use consumer::InventoryConsumer;
pub use engine::ReservationEngine;
pub use error::InventoryError;
pub use ledger::{InMemoryMovementLedger, MovementKind, MovementLedger, StockMovement};
pub use product::Product;
pub use store::{InMemoryProductStore, ProductStore};
