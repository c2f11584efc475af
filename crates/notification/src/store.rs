//! Notification storage with optimistic versioning.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CorrelationId, NotificationId, OrderId};
use tokio::sync::RwLock;

use crate::error::{NotificationError, Result};
use crate::types::{Notification, NotificationStatus};

/// Persistence seam for notification rows.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Inserts a new row.
    async fn insert(&self, notification: Notification) -> Result<()>;

    /// Looks a row up by id.
    async fn get(&self, id: NotificationId) -> Result<Option<Notification>>;

    /// Persists a modified row at its loaded version, returning it at the
    /// new version. Rejects stale writes with
    /// [`NotificationError::VersionConflict`].
    async fn update(&self, notification: Notification) -> Result<Notification>;

    /// All rows for a saga, oldest first.
    async fn find_by_correlation(&self, correlation_id: CorrelationId) -> Result<Vec<Notification>>;

    /// All rows for an order, oldest first.
    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Notification>>;

    /// All rows in a status, oldest first.
    async fn find_by_status(&self, status: NotificationStatus) -> Result<Vec<Notification>>;

    /// RETRY_SCHEDULED rows whose next attempt is due at `now`, oldest
    /// first. The sweep collaborator feeds these back into delivery.
    async fn find_due_retries(&self, now: DateTime<Utc>) -> Result<Vec<Notification>>;
}

/// In-memory notification store for tests and the demo binary.
#[derive(Clone, Default)]
pub struct InMemoryNotificationStore {
    rows: Arc<RwLock<HashMap<NotificationId, Notification>>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// SENT rows for a saga.
    pub async fn sent_count_for(&self, correlation_id: CorrelationId) -> usize {
        self.rows
            .read()
            .await
            .values()
            .filter(|n| {
                n.correlation_id == correlation_id && n.status == NotificationStatus::Sent
            })
            .count()
    }

    async fn collect_sorted<F>(&self, keep: F) -> Vec<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        let mut rows: Vec<Notification> = self
            .rows
            .read()
            .await
            .values()
            .filter(|n| keep(n))
            .cloned()
            .collect();
        rows.sort_by_key(|n| n.created_at);
        rows
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: Notification) -> Result<()> {
        self.rows
            .write()
            .await
            .insert(notification.id, notification);
        Ok(())
    }

    async fn get(&self, id: NotificationId) -> Result<Option<Notification>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update(&self, mut notification: Notification) -> Result<Notification> {
        let mut rows = self.rows.write().await;
        let current = rows
            .get(&notification.id)
            .ok_or(NotificationError::NotFound(notification.id))?;

        if current.version != notification.version {
            return Err(NotificationError::VersionConflict {
                id: notification.id,
                expected: notification.version,
                actual: current.version,
            });
        }

        notification.version += 1;
        notification.updated_at = Utc::now();
        rows.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn find_by_correlation(&self, correlation_id: CorrelationId) -> Result<Vec<Notification>> {
        Ok(self
            .collect_sorted(|n| n.correlation_id == correlation_id)
            .await)
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Notification>> {
        Ok(self.collect_sorted(|n| n.order_id == order_id).await)
    }

    async fn find_by_status(&self, status: NotificationStatus) -> Result<Vec<Notification>> {
        Ok(self.collect_sorted(|n| n.status == status).await)
    }

    async fn find_due_retries(&self, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        Ok(self
            .collect_sorted(|n| {
                n.status == NotificationStatus::RetryScheduled
                    && n.next_retry_at.is_some_and(|due| due <= now)
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::types::{Channel, NotificationKind};

    fn sample(correlation_id: CorrelationId) -> Notification {
        Notification::pending(
            correlation_id,
            OrderId::new(),
            "a@b.c",
            NotificationKind::OrderCreated,
            Channel::Email,
            "subject",
            "content",
        )
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writes() {
        let store = InMemoryNotificationStore::new();
        let n = sample(CorrelationId::new());
        store.insert(n.clone()).await.unwrap();

        let mut loaded = store.get(n.id).await.unwrap().unwrap();
        loaded.status = NotificationStatus::Sent;
        let updated = store.update(loaded.clone()).await.unwrap();
        assert_eq!(updated.version, 1);

        loaded.status = NotificationStatus::Failed;
        let err = store.update(loaded).await.unwrap_err();
        assert!(matches!(err, NotificationError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn due_retries_filters_on_status_and_deadline() {
        let store = InMemoryNotificationStore::new();
        let now = Utc::now();

        let mut due = sample(CorrelationId::new());
        due.status = NotificationStatus::RetryScheduled;
        due.next_retry_at = Some(now - Duration::minutes(1));
        store.insert(due.clone()).await.unwrap();

        let mut not_yet = sample(CorrelationId::new());
        not_yet.status = NotificationStatus::RetryScheduled;
        not_yet.next_retry_at = Some(now + Duration::minutes(10));
        store.insert(not_yet).await.unwrap();

        let mut failed = sample(CorrelationId::new());
        failed.status = NotificationStatus::Failed;
        failed.next_retry_at = Some(now - Duration::minutes(1));
        store.insert(failed).await.unwrap();

        let found = store.find_due_retries(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);
    }

    #[tokio::test]
    async fn lookups_by_correlation_and_status() {
        let store = InMemoryNotificationStore::new();
        let correlation_id = CorrelationId::new();
        store.insert(sample(correlation_id)).await.unwrap();
        store.insert(sample(correlation_id)).await.unwrap();
        store.insert(sample(CorrelationId::new())).await.unwrap();

        assert_eq!(
            store.find_by_correlation(correlation_id).await.unwrap().len(),
            2
        );
        assert_eq!(
            store
                .find_by_status(NotificationStatus::Pending)
                .await
                .unwrap()
                .len(),
            3
        );
        assert_eq!(store.sent_count_for(correlation_id).await, 0);
    }
}
