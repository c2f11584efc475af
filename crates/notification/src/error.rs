//! Notification error types.

use common::NotificationId;
use event_bus::HandlerError;
use thiserror::Error;

use crate::types::{Channel, NotificationKind};

/// Errors that can occur while dispatching notifications.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No active template is configured for the (kind, channel) pair. A
    /// configuration error; redelivering the event will not fix it.
    #[error("No active template found for kind {kind} on channel {channel}")]
    TemplateNotFound {
        kind: NotificationKind,
        channel: Channel,
    },

    /// No notification row with the given id.
    #[error("Notification not found: {0}")]
    NotFound(NotificationId),

    /// A concurrent writer modified the notification first.
    #[error("Concurrent modification of notification {id}: expected version {expected}, found {actual}")]
    VersionConflict {
        id: NotificationId,
        expected: u64,
        actual: u64,
    },

    /// The backing store could not be reached.
    #[error("Storage unavailable: {0}")]
    Storage(String),
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotificationError>;

impl From<NotificationError> for HandlerError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::TemplateNotFound { .. } | NotificationError::NotFound(_) => {
                HandlerError::Business(err.to_string())
            }
            NotificationError::VersionConflict { .. } | NotificationError::Storage(_) => {
                HandlerError::Transient(err.to_string())
            }
        }
    }
}
