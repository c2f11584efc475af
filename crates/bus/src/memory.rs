//! In-memory event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{EventEnvelope, Topic};
use tokio::sync::RwLock;

use crate::consumer::EventConsumer;
use crate::error::{BusError, HandlerError};
use crate::retry::{LoggingRecovery, RecoveryHook, RetryPolicy};

/// Publish side of the bus, the only part services depend on.
///
/// Publishing is fire-and-forget from the caller's point of view: delivery
/// failures are the subscriber's problem (handled by redelivery and the
/// recovery hook), and publish failures are logged by callers rather than
/// retried synchronously.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes one event to a topic, delivering it once per consumer group.
    async fn publish(&self, topic: Topic, event: EventEnvelope) -> Result<(), BusError>;
}

struct Subscription {
    group: String,
    consumer: Arc<dyn EventConsumer>,
}

#[derive(Default)]
struct BusState {
    subscriptions: HashMap<Topic, Vec<Subscription>>,
    published: Vec<(Topic, EventEnvelope)>,
}

/// In-process bus with named consumer groups and retrying delivery.
///
/// Delivery is inline: `publish` returns after every group has either
/// handled the event, failed terminally on a business error, or exhausted
/// its redelivery budget. That makes the whole choreography deterministic
/// for tests while preserving the at-least-once contract (a handler that
/// fails transiently sees the same event again).
#[derive(Clone)]
pub struct InMemoryEventBus {
    state: Arc<RwLock<BusState>>,
    policy: RetryPolicy,
    recovery: Arc<dyn RecoveryHook>,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventBus {
    /// Creates a bus with the default retry policy and logging recovery.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BusState::default())),
            policy: RetryPolicy::default(),
            recovery: Arc::new(LoggingRecovery),
        }
    }

    /// Replaces the retry policy used for every subscription.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the exhausted-attempt recovery hook.
    pub fn with_recovery(mut self, recovery: Arc<dyn RecoveryHook>) -> Self {
        self.recovery = recovery;
        self
    }

    /// Registers a consumer group on a topic.
    ///
    /// Each event published to the topic is delivered once per registered
    /// group, independently of the other groups.
    pub async fn subscribe(
        &self,
        topic: Topic,
        group: impl Into<String>,
        consumer: Arc<dyn EventConsumer>,
    ) {
        let group = group.into();
        tracing::debug!(%topic, group, "registering consumer group");
        self.state
            .write()
            .await
            .subscriptions
            .entry(topic)
            .or_default()
            .push(Subscription { group, consumer });
    }

    /// Returns every event published to a topic, in publish order.
    pub async fn published(&self, topic: Topic) -> Vec<EventEnvelope> {
        self.state
            .read()
            .await
            .published
            .iter()
            .filter(|(t, _)| *t == topic)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Returns events of one kind published to a topic.
    pub async fn published_of_type(&self, topic: Topic, event_type: &str) -> Vec<EventEnvelope> {
        self.published(topic)
            .await
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Total number of events published across all topics.
    pub async fn published_count(&self) -> usize {
        self.state.read().await.published.len()
    }

    async fn deliver(&self, topic: Topic, group: &str, consumer: &dyn EventConsumer, event: &EventEnvelope) {
        for attempt in 1..=self.policy.max_attempts {
            match consumer.handle(event).await {
                Ok(()) => {
                    if attempt > 1 {
                        metrics::counter!("bus_redeliveries_recovered_total").increment(1);
                    }
                    return;
                }
                Err(HandlerError::Business(reason)) => {
                    tracing::warn!(
                        %topic,
                        group,
                        event_type = event.event_type(),
                        correlation_id = %event.correlation_id,
                        reason,
                        "delivery failed on business rule, not redelivering"
                    );
                    return;
                }
                Err(err @ HandlerError::Transient(_)) => {
                    metrics::counter!("bus_delivery_failures_total").increment(1);
                    if attempt == self.policy.max_attempts {
                        self.recovery.on_exhausted(topic, group, event, &err).await;
                        return;
                    }
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        %topic,
                        group,
                        event_type = event.event_type(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %err,
                        "delivery failed, scheduling redelivery"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: Topic, event: EventEnvelope) -> Result<(), BusError> {
        tracing::debug!(
            %topic,
            event_type = event.event_type(),
            correlation_id = %event.correlation_id,
            "publishing event"
        );
        metrics::counter!("bus_events_published_total").increment(1);

        // Snapshot subscriptions so no lock is held while handlers run;
        // handlers are free to publish follow-up events.
        let subscribers: Vec<(String, Arc<dyn EventConsumer>)> = {
            let mut state = self.state.write().await;
            state.published.push((topic, event.clone()));
            state
                .subscriptions
                .get(&topic)
                .map(|subs| {
                    subs.iter()
                        .map(|s| (s.group.clone(), Arc::clone(&s.consumer)))
                        .collect()
                })
                .unwrap_or_default()
        };

        for (group, consumer) in subscribers {
            self.deliver(topic, &group, consumer.as_ref(), &event).await;
        }

        Ok(())
    }
}
