//! Message templates with literal placeholder substitution.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{Channel, NotificationKind};

/// A subject/content template pair for one (kind, channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub kind: NotificationKind,
    pub channel: Channel,

    /// Subject line with `{placeholder}` markers.
    pub subject_template: String,

    /// Body with `{placeholder}` markers.
    pub content_template: String,

    /// Inactive templates are invisible to lookup.
    pub active: bool,
}

impl Template {
    pub fn new(
        kind: NotificationKind,
        channel: Channel,
        subject_template: impl Into<String>,
        content_template: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            channel,
            subject_template: subject_template.into(),
            content_template: content_template.into(),
            active: true,
        }
    }
}

/// Replaces every `{key}` marker with its value. Unknown markers are left
/// in place so a half-filled message is visible rather than silently blank.
pub fn render(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in variables {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }
    rendered
}

/// Lookup seam for active templates.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Returns the active template for the pair, if one is configured.
    async fn find_active(&self, kind: NotificationKind, channel: Channel)
        -> Result<Option<Template>>;

    /// Registers or replaces a template.
    async fn upsert(&self, template: Template) -> Result<()>;
}

/// In-memory template catalog for tests and the demo binary.
#[derive(Clone, Default)]
pub struct InMemoryTemplateCatalog {
    templates: Arc<RwLock<HashMap<(NotificationKind, Channel), Template>>>,
}

impl InMemoryTemplateCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog seeded with the stock email templates for every notified
    /// kind.
    pub async fn with_defaults() -> Self {
        let catalog = Self::new();
        for template in default_email_templates() {
            // Insert into a fresh map cannot conflict.
            let _ = catalog.upsert(template).await;
        }
        catalog
    }
}

#[async_trait]
impl TemplateCatalog for InMemoryTemplateCatalog {
    async fn find_active(
        &self,
        kind: NotificationKind,
        channel: Channel,
    ) -> Result<Option<Template>> {
        Ok(self
            .templates
            .read()
            .await
            .get(&(kind, channel))
            .filter(|t| t.active)
            .cloned())
    }

    async fn upsert(&self, template: Template) -> Result<()> {
        self.templates
            .write()
            .await
            .insert((template.kind, template.channel), template);
        Ok(())
    }
}

/// The stock email templates.
pub fn default_email_templates() -> Vec<Template> {
    vec![
        Template::new(
            NotificationKind::OrderCreated,
            Channel::Email,
            "Order {order_id} received",
            "Hi {customer_name},\n\nWe have received your order {order_id} \
             ({item_count} items, total {total_amount}) and are checking \
             availability now.",
        ),
        Template::new(
            NotificationKind::OrderConfirmed,
            Channel::Email,
            "Order {order_id} confirmed",
            "Good news! Your order {order_id} (total {total_amount}) is \
             confirmed and will be prepared for shipping. Estimated delivery: \
             {estimated_delivery}.",
        ),
        Template::new(
            NotificationKind::OrderShipped,
            Channel::Email,
            "Order {order_id} shipped",
            "Your order {order_id} has shipped via {carrier}.\nTracking \
             number: {tracking_number}\nDelivery address: {shipping_address}",
        ),
        Template::new(
            NotificationKind::OrderDelivered,
            Channel::Email,
            "Order {order_id} delivered",
            "Your order {order_id} was delivered on {delivery_date}. \
             Tracking number: {tracking_number}. Thank you for shopping \
             with us!",
        ),
        Template::new(
            NotificationKind::OrderRejected,
            Channel::Email,
            "Order {order_id} could not be fulfilled",
            "We are sorry. Your order {order_id} was rejected: \
             {rejection_reason}. You have not been charged.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_substitutes_every_marker() {
        let out = render(
            "Order {order_id} via {carrier}",
            &vars(&[("order_id", "o-1"), ("carrier", "UPS")]),
        );
        assert_eq!(out, "Order o-1 via UPS");
    }

    #[test]
    fn unknown_markers_stay_visible() {
        let out = render("Hi {customer_name}", &vars(&[("order_id", "o-1")]));
        assert_eq!(out, "Hi {customer_name}");
    }

    #[tokio::test]
    async fn defaults_cover_every_kind_on_email() {
        let catalog = InMemoryTemplateCatalog::with_defaults().await;
        for kind in NotificationKind::ALL {
            assert!(
                catalog
                    .find_active(kind, Channel::Email)
                    .await
                    .unwrap()
                    .is_some(),
                "missing default template for {kind}"
            );
        }
    }

    #[tokio::test]
    async fn inactive_templates_are_invisible() {
        let catalog = InMemoryTemplateCatalog::new();
        let mut template = Template::new(
            NotificationKind::OrderCreated,
            Channel::Email,
            "s",
            "c",
        );
        template.active = false;
        catalog.upsert(template).await.unwrap();

        assert!(
            catalog
                .find_active(NotificationKind::OrderCreated, Channel::Email)
                .await
                .unwrap()
                .is_none()
        );
    }
}
