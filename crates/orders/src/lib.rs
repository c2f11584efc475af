//! Order intake and lifecycle.
//!
//! Accepts orders, validates them, persists them CREATED, and emits the
//! order-created event that starts the fulfillment saga. The creator never
//! blocks on inventory or shipping; downstream outcomes surface
//! asynchronously through the other services' records. A manual
//! status-override path exists for operational correction and enforces the
//! transition table.

pub mod error;
pub mod order;
pub mod service;
pub mod status;
pub mod store;

pub use error::{FieldViolation, OrderError};
pub use order::Order;
pub use service::{CreateOrderRequest, OrderService};
pub use status::OrderStatus;
pub use store::{InMemoryOrderStore, OrderStore};
