//! Notification dispatcher.
//!
//! Reacts to every order lifecycle event by rendering a message from the
//! template catalog and attempting delivery through a pluggable channel.
//! The row is persisted PENDING before the first attempt so a crash after
//! the attempt is still observable. Failed deliveries are rescheduled with
//! linear backoff until the retry budget is spent; a due-retry sweep
//! re-attempts scheduled rows.

pub mod channel;
pub mod consumer;
pub mod dispatcher;
pub mod error;
pub mod store;
pub mod template;
pub mod types;

pub use channel::{DeliveryChannel, SentMessage, SimulatedEmailChannel};
pub use consumer::NotificationConsumer;
pub use dispatcher::NotificationDispatcher;
pub use error::NotificationError;
pub use store::{InMemoryNotificationStore, NotificationStore};
pub use template::{InMemoryTemplateCatalog, Template, TemplateCatalog};
pub use types::{Channel, Notification, NotificationKind, NotificationStatus};
