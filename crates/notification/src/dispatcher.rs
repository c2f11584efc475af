//! Per-event notification handlers and the retry sweep.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{
    EventEnvelope, OrderConfirmedData, OrderCreatedData, OrderDeliveredData, OrderId,
    OrderRejectedData, OrderShippedData,
};

use crate::channel::DeliveryChannel;
use crate::error::{NotificationError, Result};
use crate::store::NotificationStore;
use crate::template::{self, TemplateCatalog};
use crate::types::{Notification, NotificationKind, NotificationStatus};

/// Linear backoff: the wait grows by five minutes per failed attempt.
fn retry_backoff(retry_count: u32) -> Duration {
    Duration::minutes(5 * i64::from(retry_count))
}

/// Renders, persists, and delivers notifications for lifecycle events.
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    templates: Arc<dyn TemplateCatalog>,
    channel: Arc<dyn DeliveryChannel>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        templates: Arc<dyn TemplateCatalog>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            store,
            templates,
            channel,
        }
    }

    #[tracing::instrument(skip(self, event, data), fields(correlation_id = %event.correlation_id))]
    pub async fn on_order_created(
        &self,
        event: &EventEnvelope,
        data: &OrderCreatedData,
    ) -> Result<Notification> {
        let mut vars = BTreeMap::new();
        vars.insert("customer_name".into(), data.customer_info.full_name());
        vars.insert("order_id".into(), event.order_id.to_string());
        vars.insert("total_amount".into(), data.total_amount.to_string());
        vars.insert("item_count".into(), data.order_items.len().to_string());

        self.notify(
            event,
            &data.customer_info.email,
            NotificationKind::OrderCreated,
            &vars,
        )
        .await
    }

    #[tracing::instrument(skip(self, event, data), fields(correlation_id = %event.correlation_id))]
    pub async fn on_order_confirmed(
        &self,
        event: &EventEnvelope,
        data: &OrderConfirmedData,
    ) -> Result<Notification> {
        let mut vars = BTreeMap::new();
        vars.insert("order_id".into(), event.order_id.to_string());
        vars.insert("total_amount".into(), data.total_amount.to_string());
        vars.insert("estimated_delivery".into(), "5-7 business days".into());

        self.notify(
            event,
            &data.customer_info.email,
            NotificationKind::OrderConfirmed,
            &vars,
        )
        .await
    }

    #[tracing::instrument(skip(self, event, data), fields(correlation_id = %event.correlation_id))]
    pub async fn on_order_rejected(
        &self,
        event: &EventEnvelope,
        data: &OrderRejectedData,
    ) -> Result<Notification> {
        let mut vars = BTreeMap::new();
        vars.insert("order_id".into(), event.order_id.to_string());
        vars.insert("rejection_reason".into(), data.reason.clone());

        self.notify(
            event,
            &data.customer_email,
            NotificationKind::OrderRejected,
            &vars,
        )
        .await
    }

    #[tracing::instrument(skip(self, event, data), fields(correlation_id = %event.correlation_id))]
    pub async fn on_order_shipped(
        &self,
        event: &EventEnvelope,
        data: &OrderShippedData,
    ) -> Result<Notification> {
        let mut vars = BTreeMap::new();
        vars.insert("order_id".into(), event.order_id.to_string());
        vars.insert("tracking_number".into(), data.tracking_number.clone());
        vars.insert("carrier".into(), data.carrier.clone());
        vars.insert("shipping_address".into(), data.shipping_address.clone());

        // Shipping events carry no customer contact.
        let recipient = fallback_recipient(event.order_id);
        self.notify(event, &recipient, NotificationKind::OrderShipped, &vars)
            .await
    }

    #[tracing::instrument(skip(self, event, data), fields(correlation_id = %event.correlation_id))]
    pub async fn on_order_delivered(
        &self,
        event: &EventEnvelope,
        data: &OrderDeliveredData,
    ) -> Result<Notification> {
        let mut vars = BTreeMap::new();
        vars.insert("order_id".into(), event.order_id.to_string());
        vars.insert("delivery_date".into(), Utc::now().date_naive().to_string());
        vars.insert("tracking_number".into(), data.tracking_number.clone());

        let recipient = fallback_recipient(event.order_id);
        self.notify(event, &recipient, NotificationKind::OrderDelivered, &vars)
            .await
    }

    /// Re-attempts every RETRY_SCHEDULED row due at `now`. Returns how many
    /// rows were attempted. The caller decides the cadence.
    #[tracing::instrument(skip(self))]
    pub async fn process_due_retries(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.store.find_due_retries(now).await?;
        let attempted = due.len();
        for notification in due {
            self.attempt(notification).await?;
        }
        if attempted > 0 {
            tracing::info!(attempted, "processed due notification retries");
        }
        Ok(attempted)
    }

    /// Renders the template, persists a PENDING row, then attempts delivery.
    ///
    /// The PENDING write happens before the attempt so a crash mid-send
    /// leaves an observable row for reconciliation.
    async fn notify(
        &self,
        event: &EventEnvelope,
        recipient: &str,
        kind: NotificationKind,
        vars: &BTreeMap<String, String>,
    ) -> Result<Notification> {
        let channel = self.channel.channel();
        let template = self
            .templates
            .find_active(kind, channel)
            .await?
            .ok_or(NotificationError::TemplateNotFound { kind, channel })?;

        let notification = Notification::pending(
            event.correlation_id,
            event.order_id,
            recipient,
            kind,
            channel,
            template::render(&template.subject_template, vars),
            template::render(&template.content_template, vars),
        );
        self.store.insert(notification.clone()).await?;

        self.attempt(notification).await
    }

    /// One delivery attempt. Success goes SENT; failure schedules a retry
    /// or, once the budget is spent, goes FAILED.
    async fn attempt(&self, mut notification: Notification) -> Result<Notification> {
        let delivered = self
            .channel
            .deliver(
                &notification.recipient,
                &notification.subject,
                &notification.content,
            )
            .await;

        if delivered {
            notification.status = NotificationStatus::Sent;
            notification.sent_at = Some(Utc::now());
            metrics::counter!("notifications_sent_total").increment(1);
            tracing::info!(
                notification_id = %notification.id,
                recipient = notification.recipient,
                "notification sent"
            );
        } else {
            notification.retry_count += 1;
            notification.error_message =
                Some(format!("Failed to send via {}", notification.channel));

            if notification.retries_remaining() {
                notification.status = NotificationStatus::RetryScheduled;
                notification.next_retry_at =
                    Some(Utc::now() + retry_backoff(notification.retry_count));
                tracing::warn!(
                    notification_id = %notification.id,
                    retry = notification.retry_count,
                    max = notification.max_retries,
                    "notification delivery failed, retry scheduled"
                );
            } else {
                notification.status = NotificationStatus::Failed;
                notification.next_retry_at = None;
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::error!(
                    notification_id = %notification.id,
                    retries = notification.max_retries,
                    "notification failed permanently"
                );
            }
        }

        self.store.update(notification).await
    }
}

/// Derived address for events that do not carry customer contact details.
fn fallback_recipient(order_id: OrderId) -> String {
    format!("customer-{order_id}@example.com")
}
