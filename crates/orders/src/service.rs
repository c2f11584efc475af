//! Order intake and the manual status-override path.

use std::sync::Arc;

use chrono::Utc;
use common::{CorrelationId, CustomerInfo, EventEnvelope, Money, OrderId, OrderLine, Topic};
use event_bus::EventBus;

use crate::error::{FieldViolation, OrderError, Result};
use crate::order::Order;
use crate::status::OrderStatus;
use crate::store::OrderStore;

/// A request to create an order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub customer_info: CustomerInfo,
    pub order_items: Vec<OrderLine>,

    /// Declared total. Must equal the sum of line totals exactly.
    pub total_amount: Money,

    /// Caller-supplied saga key; generated when absent.
    pub correlation_id: Option<CorrelationId>,

    pub notes: Option<String>,
}

/// Accepts orders and starts the fulfillment saga.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    bus: Arc<dyn EventBus>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>, bus: Arc<dyn EventBus>) -> Self {
        Self { orders, bus }
    }

    /// Validates the request, persists the order CREATED, and emits
    /// order-created with the full line-item payload.
    ///
    /// The caller gets the persisted order back immediately; fulfillment
    /// outcomes surface asynchronously.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        validate(&request)?;

        let correlation_id = request.correlation_id.unwrap_or_default();
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            correlation_id,
            customer_info: request.customer_info,
            order_items: request.order_items,
            total_amount: request.total_amount,
            status: OrderStatus::Created,
            notes: request.notes,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        self.orders.insert(order.clone()).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, correlation_id = %correlation_id, "order created");

        let event = EventEnvelope::order_created(
            correlation_id,
            order.id,
            order.customer_info.clone(),
            order.order_items.clone(),
            order.total_amount,
        );
        self.bus
            .publish(Topic::Orders, event)
            .await
            .map_err(|err| OrderError::Publish(err.to_string()))?;

        Ok(order)
    }

    /// Looks an order up by id.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Looks an order up by correlation id.
    pub async fn get_by_correlation(&self, correlation_id: CorrelationId) -> Result<Order> {
        self.orders
            .get_by_correlation(correlation_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(correlation_id.to_string()))
    }

    /// Manual status override for operational correction. Enforces the
    /// transition table; independent of the event-driven flow.
    #[tracing::instrument(skip(self, reason))]
    pub async fn update_status(
        &self,
        id: OrderId,
        requested: &str,
        reason: Option<&str>,
    ) -> Result<Order> {
        let next: OrderStatus = requested.parse()?;
        let mut order = self.get_order(id).await?;

        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        order.status = next;
        if let Some(reason) = reason {
            let notes = order.notes.take().unwrap_or_default();
            order.notes = Some(format!("{notes}\nStatus updated to {next}: {reason}"));
        }

        let order = self.orders.update(order).await?;
        tracing::info!(order_id = %id, status = %next, "order status updated");
        Ok(order)
    }
}

/// Checks every rule and reports all violations at once.
fn validate(request: &CreateOrderRequest) -> Result<()> {
    let mut violations = Vec::new();

    let calculated: Money = request.order_items.iter().map(|l| l.line_total()).sum();
    if calculated != request.total_amount {
        violations.push(FieldViolation::new(
            "total_amount",
            format!(
                "does not match sum of order items (declared {}, calculated {})",
                request.total_amount, calculated
            ),
        ));
    }

    for (index, line) in request.order_items.iter().enumerate() {
        if line.quantity == 0 {
            violations.push(FieldViolation::new(
                format!("order_items[{index}].quantity"),
                "must be positive",
            ));
        }
        if line.unit_price <= Money::zero() {
            violations.push(FieldViolation::new(
                format!("order_items[{index}].unit_price"),
                "must be positive",
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(OrderError::Validation(violations))
    }
}

#[cfg(test)]
mod tests {
    use event_bus::{InMemoryEventBus, RetryPolicy};

    use super::*;
    use crate::store::InMemoryOrderStore;

    struct Harness {
        service: OrderService,
        bus: InMemoryEventBus,
    }

    impl Harness {
        fn new() -> Self {
            let bus = InMemoryEventBus::new().with_policy(RetryPolicy::fast());
            let service = OrderService::new(
                Arc::new(InMemoryOrderStore::new()),
                Arc::new(bus.clone()),
            );
            Self { service, bus }
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            street: "12 Analytical Way".into(),
            city: "London".into(),
            postal_code: "EC1A".into(),
            country: "UK".into(),
        }
    }

    fn valid_request() -> CreateOrderRequest {
        let order_items = vec![
            OrderLine::new("SKU-1", "Widget", 2, Money::from_cents(1000)),
            OrderLine::new("SKU-2", "Gadget", 1, Money::from_cents(2500)),
        ];
        let total_amount = order_items.iter().map(|l| l.line_total()).sum();
        CreateOrderRequest {
            customer_info: customer(),
            order_items,
            total_amount,
            correlation_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_persists_and_emits_order_created() {
        let h = Harness::new();
        let order = h.service.create_order(valid_request()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.total_amount, Money::from_cents(4500));

        let created = h.bus.published_of_type(Topic::Orders, "OrderCreated").await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].correlation_id, order.correlation_id);
        assert_eq!(created[0].order_id, order.id);
    }

    #[tokio::test]
    async fn caller_supplied_correlation_id_is_kept() {
        let h = Harness::new();
        let correlation_id = CorrelationId::new();
        let mut request = valid_request();
        request.correlation_id = Some(correlation_id);

        let order = h.service.create_order(request).await.unwrap();
        assert_eq!(order.correlation_id, correlation_id);
    }

    #[tokio::test]
    async fn mismatched_total_is_rejected() {
        let h = Harness::new();
        let mut request = valid_request();
        request.total_amount = Money::from_cents(1);

        let err = h.service.create_order(request).await.unwrap_err();
        let OrderError::Validation(violations) = err else {
            panic!("expected validation error");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "total_amount");
        assert!(h.bus.published(Topic::Orders).await.is_empty());
    }

    #[tokio::test]
    async fn every_violation_is_reported_at_once() {
        let h = Harness::new();
        let order_items = vec![
            OrderLine::new("SKU-1", "Widget", 0, Money::from_cents(1000)),
            OrderLine::new("SKU-2", "Gadget", 1, Money::zero()),
        ];
        let request = CreateOrderRequest {
            customer_info: customer(),
            order_items,
            total_amount: Money::from_cents(999),
            correlation_id: None,
            notes: None,
        };

        let err = h.service.create_order(request).await.unwrap_err();
        let OrderError::Validation(violations) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "total_amount",
                "order_items[0].quantity",
                "order_items[1].unit_price",
            ]
        );
    }

    #[tokio::test]
    async fn manual_override_follows_the_transition_table() {
        let h = Harness::new();
        let order = h.service.create_order(valid_request()).await.unwrap();

        let confirmed = h
            .service
            .update_status(order.id, "confirmed", Some("stock verified by hand"))
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert!(
            confirmed
                .notes
                .as_deref()
                .unwrap()
                .contains("Status updated to CONFIRMED: stock verified by hand")
        );

        // CREATED -> SHIPPED is not in the table.
        let other = h.service.create_order(valid_request()).await.unwrap();
        let err = h
            .service
            .update_status(other.id, "SHIPPED", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Created,
                to: OrderStatus::Shipped,
            }
        ));
    }

    #[tokio::test]
    async fn manual_chain_walks_created_to_delivered() {
        let h = Harness::new();
        let order = h.service.create_order(valid_request()).await.unwrap();

        for status in ["CONFIRMED", "SHIPPED", "DELIVERED"] {
            h.service.update_status(order.id, status, None).await.unwrap();
        }

        let delivered = h.service.get_order(order.id).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert!(delivered.status.is_terminal());
        assert_eq!(delivered.version, 3);
    }

    #[tokio::test]
    async fn unknown_status_is_rejected_before_lookup() {
        let h = Harness::new();
        let err = h
            .service
            .update_status(OrderId::new(), "TELEPORTED", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::UnknownStatus(_)));
    }

    #[tokio::test]
    async fn terminal_orders_reject_further_overrides() {
        let h = Harness::new();
        let order = h.service.create_order(valid_request()).await.unwrap();
        h.service
            .update_status(order.id, "CANCELLED", Some("customer changed their mind"))
            .await
            .unwrap();

        let err = h
            .service
            .update_status(order.id, "CONFIRMED", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }
}
