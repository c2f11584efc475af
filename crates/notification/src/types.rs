//! Notification records and their enums.

use chrono::{DateTime, Utc};
use common::{CorrelationId, NotificationId, OrderId};
use serde::{Deserialize, Serialize};

/// The lifecycle event a notification corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    OrderCreated,
    OrderConfirmed,
    OrderShipped,
    OrderDelivered,
    OrderRejected,
}

impl NotificationKind {
    /// All kinds the dispatcher notifies on.
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::OrderCreated,
        NotificationKind::OrderConfirmed,
        NotificationKind::OrderShipped,
        NotificationKind::OrderDelivered,
        NotificationKind::OrderRejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderCreated => "OrderCreated",
            NotificationKind::OrderConfirmed => "OrderConfirmed",
            NotificationKind::OrderShipped => "OrderShipped",
            NotificationKind::OrderDelivered => "OrderDelivered",
            NotificationKind::OrderRejected => "OrderRejected",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The delivery medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Email,
    Sms,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Email => write!(f, "Email"),
            Channel::Sms => write!(f, "Sms"),
        }
    }
}

/// Delivery status of a notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NotificationStatus {
    /// Persisted, delivery not yet attempted or in flight.
    #[default]
    Pending,

    /// Delivered (terminal).
    Sent,

    /// A delivery attempt failed; another is scheduled.
    RetryScheduled,

    /// The retry budget is spent (terminal, surfaced for operators).
    Failed,
}

/// A single notification delivery, one row per (correlation id, event kind)
/// delivery. Duplicate rows for the same pair are an accepted artifact of
/// at-least-once event delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub correlation_id: CorrelationId,
    pub order_id: OrderId,

    /// Address delivery goes to.
    pub recipient: String,

    pub kind: NotificationKind,
    pub channel: Channel,
    pub status: NotificationStatus,

    /// Rendered subject line.
    pub subject: String,

    /// Rendered message body.
    pub content: String,

    /// Failed attempts so far.
    pub retry_count: u32,

    /// Attempt budget before the row goes FAILED.
    pub max_retries: u32,

    /// When the next attempt is due, while RETRY_SCHEDULED.
    pub next_retry_at: Option<DateTime<Utc>>,

    /// Last delivery error, if any attempt failed.
    pub error_message: Option<String>,

    /// When delivery succeeded.
    pub sent_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter.
    pub version: u64,
}

/// Default attempt budget.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

impl Notification {
    /// Creates a PENDING notification ready for its first delivery attempt.
    pub fn pending(
        correlation_id: CorrelationId,
        order_id: OrderId,
        recipient: impl Into<String>,
        kind: NotificationKind,
        channel: Channel,
        subject: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NotificationId::new(),
            correlation_id,
            order_id,
            recipient: recipient.into(),
            kind,
            channel,
            status: NotificationStatus::Pending,
            subject: subject.into(),
            content: content.into(),
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            next_retry_at: None,
            error_message: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// True while the row can still be retried.
    pub fn retries_remaining(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_starts_with_full_budget() {
        let n = Notification::pending(
            CorrelationId::new(),
            OrderId::new(),
            "a@b.c",
            NotificationKind::OrderCreated,
            Channel::Email,
            "s",
            "c",
        );
        assert_eq!(n.status, NotificationStatus::Pending);
        assert_eq!(n.retry_count, 0);
        assert!(n.retries_remaining());
        assert!(n.next_retry_at.is_none());
    }

    #[test]
    fn kind_display_matches_event_discriminators() {
        assert_eq!(NotificationKind::OrderRejected.to_string(), "OrderRejected");
        assert_eq!(NotificationKind::ALL.len(), 5);
    }
}
