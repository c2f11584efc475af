//! Outbound delivery channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::Channel;

/// An outbound medium with a boolean success/failure result. The dispatcher
/// turns a `false` into a scheduled retry, so implementations should not
/// retry internally.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Which channel this implementation serves.
    fn channel(&self) -> Channel;

    /// Attempts one delivery. Returns whether it succeeded.
    async fn deliver(&self, recipient: &str, subject: &str, content: &str) -> bool;
}

/// A message accepted by [`SimulatedEmailChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub content: String,
}

/// Email channel that logs instead of sending. Deliveries succeed unless
/// failure is toggled on.
#[derive(Clone, Default)]
pub struct SimulatedEmailChannel {
    failing: Arc<AtomicBool>,
    sent: Arc<RwLock<Vec<SentMessage>>>,
}

impl SimulatedEmailChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delivery fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages accepted so far.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.read().await.len()
    }
}

#[async_trait]
impl DeliveryChannel for SimulatedEmailChannel {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn deliver(&self, recipient: &str, subject: &str, content: &str) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            tracing::warn!(recipient, "simulated email delivery failure");
            return false;
        }

        tracing::info!(recipient, subject, "email sent (simulated)");
        self.sent.write().await.push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
        });
        true
    }
}
