//! At-least-once event bus abstraction.
//!
//! The real transport (topic partitioning, offset management, rebalancing)
//! is an external dependency; this crate defines the delivery contract the
//! services rely on: named consumer groups, redelivery of failed attempts up
//! to a budget with exponential backoff, a classifier separating business
//! failures (never redelivered) from infrastructure failures (redelivered),
//! and a recovery hook for exhausted attempts.
//!
//! [`InMemoryEventBus`] implements the contract in-process for tests and the
//! demo binary.

pub mod consumer;
pub mod error;
pub mod memory;
pub mod retry;

pub use consumer::EventConsumer;
pub use error::{BusError, HandlerError};
pub use memory::{EventBus, InMemoryEventBus};
pub use retry::{LoggingRecovery, RecoveryHook, RetryPolicy};
