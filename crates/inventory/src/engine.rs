//! The reservation/compensation engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{CorrelationId, EventEnvelope, OrderCreatedData, OrderId, ProductId, Topic};
use event_bus::EventBus;

use crate::error::{InventoryError, Result};
use crate::ledger::{MovementLedger, StockMovement};
use crate::store::ProductStore;

/// Reacts to order lifecycle events by reserving, releasing, and confirming
/// stock, and emits order-confirmed / order-rejected events on the
/// `inventory` topic.
pub struct ReservationEngine {
    products: Arc<dyn ProductStore>,
    ledger: Arc<dyn MovementLedger>,
    bus: Arc<dyn EventBus>,
}

impl ReservationEngine {
    /// Creates a new engine over the given stores and bus.
    pub fn new(
        products: Arc<dyn ProductStore>,
        ledger: Arc<dyn MovementLedger>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            products,
            ledger,
            bus,
        }
    }

    /// Handles an order-created event: reserve every line item or reject the
    /// whole order.
    ///
    /// The flow is two-phase. A fail-fast pass checks availability for all
    /// items with no locks and no side effects, collecting every failing
    /// product into one rejection reason. If the pass succeeds, each product
    /// is re-validated and reserved under its exclusive lock; losing the
    /// race at that point releases whatever this attempt reserved and
    /// rejects. Any other failure mid-reservation takes the same
    /// compensate-then-reject path, so counters are never left inconsistent.
    #[tracing::instrument(skip(self, event, data), fields(correlation_id = %event.correlation_id))]
    pub async fn on_order_created(
        &self,
        event: &EventEnvelope,
        data: &OrderCreatedData,
    ) -> Result<()> {
        // Redelivery guard: a RESERVED row means a previous delivery already
        // ran the reservation. An empty balance means the order already
        // moved on (confirmed or released). A balance covering every line
        // item means only the confirm publish may have been lost, so re-emit.
        // A short balance means the prior delivery crashed mid-reservation;
        // the missing lines still need reserving before any confirmation.
        if self.ledger.has_reserved(event.correlation_id).await? {
            let outstanding = self.ledger.outstanding_for(event.correlation_id).await?;
            if outstanding.is_empty() {
                tracing::info!("reservation already settled, skipping");
                return Ok(());
            }
            if data
                .order_items
                .iter()
                .all(|item| outstanding.get(&item.product_id).copied() == Some(item.quantity))
            {
                tracing::info!("reservation already recorded, re-emitting confirmation");
                self.emit_confirmed(event, data).await;
                return Ok(());
            }

            tracing::warn!("partial reservation found, reserving the missing lines");
            match self
                .reserve_items(event.correlation_id, event.order_id, data, &outstanding)
                .await
            {
                Ok(()) => {
                    metrics::counter!("inventory_reservations_total").increment(1);
                    self.emit_confirmed(event, data).await;
                }
                Err(err) => self.compensate_and_reject(event, data, err).await?,
            }
            return Ok(());
        }

        // Fail-fast pass: no partial side effects on rejection.
        let mut failing = Vec::new();
        for item in &data.order_items {
            match self.products.get(&item.product_id).await? {
                None => failing.push(format!("{} (not found)", item.product_id)),
                Some(product) => {
                    if !product.can_reserve(item.quantity) {
                        failing.push(format!(
                            "{} (requested: {}, available: {})",
                            item.product_id,
                            item.quantity,
                            product.available()
                        ));
                    }
                }
            }
        }
        if !failing.is_empty() {
            let reason = format!("Insufficient stock for products: {}", failing.join(", "));
            self.emit_rejected(event, data, reason).await;
            return Ok(());
        }

        match self
            .reserve_items(event.correlation_id, event.order_id, data, &BTreeMap::new())
            .await
        {
            Ok(()) => {
                metrics::counter!("inventory_reservations_total").increment(1);
                self.emit_confirmed(event, data).await;
            }
            Err(err) => self.compensate_and_reject(event, data, err).await?,
        }
        Ok(())
    }

    /// Handles an order-shipped event: converts the outstanding reservation
    /// for the correlation id into a permanent stock deduction.
    ///
    /// Idempotent: the outstanding ledger balance is empty once confirmed,
    /// so redelivery is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn on_order_shipped(&self, correlation_id: CorrelationId) -> Result<()> {
        let outstanding = self.ledger.outstanding_for(correlation_id).await?;
        if outstanding.is_empty() {
            tracing::debug!("no outstanding reservation, nothing to confirm");
            return Ok(());
        }

        for (product_id, quantity) in outstanding {
            let mut product = self.products.lock(&product_id).await?;
            product.confirm(quantity)?;
            self.ledger
                .append(StockMovement::confirmed(
                    product_id.clone(),
                    quantity,
                    correlation_id,
                    "Confirmed stock for shipped order",
                ))
                .await?;
            tracing::info!(%product_id, quantity, "confirmed reserved stock");
        }
        metrics::counter!("inventory_confirmations_total").increment(1);
        Ok(())
    }

    /// Releases the outstanding reservation for a correlation id.
    ///
    /// Used as rejection-path compensation and available as a standalone
    /// operation. Idempotent: once released there is no RESERVED row without
    /// a matching RELEASED/CONFIRMED row, so the balance is empty and
    /// re-running is a no-op.
    #[tracing::instrument(skip(self, note))]
    pub async fn release_reservation(
        &self,
        correlation_id: CorrelationId,
        note: &str,
    ) -> Result<()> {
        let outstanding = self.ledger.outstanding_for(correlation_id).await?;
        if outstanding.is_empty() {
            tracing::debug!("no outstanding reservation, nothing to release");
            return Ok(());
        }

        for (product_id, quantity) in outstanding {
            let mut product = self.products.lock(&product_id).await?;
            product.release(quantity)?;
            self.ledger
                .append(StockMovement::released(
                    product_id.clone(),
                    quantity,
                    correlation_id,
                    note,
                ))
                .await?;
            tracing::info!(%product_id, quantity, "released reserved stock");
        }
        metrics::counter!("inventory_releases_total").increment(1);
        Ok(())
    }

    /// Locked re-validation and reservation of every line item, skipping
    /// quantities already covered by the outstanding ledger balance.
    async fn reserve_items(
        &self,
        correlation_id: CorrelationId,
        order_id: OrderId,
        data: &OrderCreatedData,
        outstanding: &BTreeMap<ProductId, u32>,
    ) -> Result<()> {
        for item in &data.order_items {
            let already = outstanding.get(&item.product_id).copied().unwrap_or(0);
            let missing = item.quantity.saturating_sub(already);
            if missing == 0 {
                continue;
            }
            let mut product = self.products.lock(&item.product_id).await?;

            // Re-check under the lock; a concurrent order may have won the
            // race since the fail-fast pass.
            if !product.can_reserve(missing) {
                return Err(InventoryError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    requested: missing,
                    available: product.available(),
                });
            }

            product.reserve(missing)?;
            // Record the movement while still holding the lock so the
            // counter and the ledger cannot diverge.
            if let Err(err) = self
                .ledger
                .append(StockMovement::reserved(
                    item.product_id.clone(),
                    missing,
                    correlation_id,
                    format!("Reserved for order {order_id}"),
                ))
                .await
            {
                product.release(missing)?;
                return Err(err);
            }
            tracing::info!(
                product_id = %item.product_id,
                quantity = missing,
                "reserved stock"
            );
        }
        Ok(())
    }

    /// Rejection-path compensation: release whatever is reserved for the
    /// correlation id, then publish the rejection.
    ///
    /// If the release itself fails, counters may be inconsistent, so the
    /// error propagates for redelivery instead of rejecting.
    async fn compensate_and_reject(
        &self,
        event: &EventEnvelope,
        data: &OrderCreatedData,
        err: InventoryError,
    ) -> Result<()> {
        tracing::warn!(%err, "reservation attempt failed, compensating");
        self.release_reservation(
            event.correlation_id,
            "Released reservation due to order rejection",
        )
        .await?;

        let reason = match &err {
            InventoryError::InsufficientStock { .. } | InventoryError::ProductNotFound(_) => {
                err.to_string()
            }
            other => format!("Internal error processing order: {other}"),
        };
        self.emit_rejected(event, data, reason).await;
        Ok(())
    }

    async fn emit_confirmed(&self, event: &EventEnvelope, data: &OrderCreatedData) {
        let confirmed =
            EventEnvelope::order_confirmed(event.correlation_id, event.order_id, data);
        if let Err(err) = self.bus.publish(Topic::Inventory, confirmed).await {
            // Fire-and-forget: the triggering event's own redelivery is the
            // recovery path, not a synchronous publish retry.
            tracing::error!(%err, "failed to publish order-confirmed");
        } else {
            tracing::info!("order confirmed");
        }
    }

    async fn emit_rejected(&self, event: &EventEnvelope, data: &OrderCreatedData, reason: String) {
        tracing::warn!(reason, "rejecting order");
        metrics::counter!("inventory_rejections_total").increment(1);
        let rejected = EventEnvelope::order_rejected(
            event.correlation_id,
            event.order_id,
            reason,
            data.customer_info.email.clone(),
        );
        if let Err(err) = self.bus.publish(Topic::Inventory, rejected).await {
            tracing::error!(%err, "failed to publish order-rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerInfo, Money, OrderLine, ProductId};
    use event_bus::{InMemoryEventBus, RetryPolicy};

    use super::*;
    use crate::ledger::{InMemoryMovementLedger, MovementKind};
    use crate::product::Product;
    use crate::store::{InMemoryProductStore, ProductStore};

    struct Harness {
        engine: ReservationEngine,
        products: InMemoryProductStore,
        ledger: InMemoryMovementLedger,
        bus: InMemoryEventBus,
    }

    impl Harness {
        fn new() -> Self {
            let products = InMemoryProductStore::new();
            let ledger = InMemoryMovementLedger::new();
            let bus = InMemoryEventBus::new().with_policy(RetryPolicy::fast());
            let engine = ReservationEngine::new(
                Arc::new(products.clone()),
                Arc::new(ledger.clone()),
                Arc::new(bus.clone()),
            );
            Self {
                engine,
                products,
                ledger,
                bus,
            }
        }

        async fn seed(&self, sku: &str, stock: u32) {
            self.products
                .insert(Product::new(sku, sku, stock, 2, Money::from_cents(1000)))
                .await
                .unwrap();
        }

        async fn product(&self, sku: &str) -> Product {
            self.products
                .get(&ProductId::new(sku))
                .await
                .unwrap()
                .unwrap()
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

    fn order_created(lines: Vec<OrderLine>) -> (EventEnvelope, OrderCreatedData) {
        let total: Money = lines.iter().map(|l| l.line_total()).sum();
        let data = OrderCreatedData {
            customer_info: customer(),
            order_items: lines,
            total_amount: total,
        };
        let event = EventEnvelope::order_created(
            CorrelationId::new(),
            OrderId::new(),
            data.customer_info.clone(),
            data.order_items.clone(),
            data.total_amount,
        );
        (event, data)
    }

    #[tokio::test]
    async fn successful_reservation_confirms_with_unchanged_total() {
        let h = Harness::new();
        h.seed("SKU-X", 10).await;

        let (event, data) = order_created(vec![OrderLine::new(
            "SKU-X",
            "Widget",
            2,
            Money::from_cents(1000),
        )]);
        h.engine.on_order_created(&event, &data).await.unwrap();

        let product = h.product("SKU-X").await;
        assert_eq!(product.reserved_quantity, 2);
        assert_eq!(product.stock_quantity, 10);

        let confirmed = h
            .bus
            .published_of_type(Topic::Inventory, "OrderConfirmed")
            .await;
        assert_eq!(confirmed.len(), 1);
        if let common::EventPayload::OrderConfirmed(c) = &confirmed[0].payload {
            assert_eq!(c.total_amount, data.total_amount);
        } else {
            panic!("expected OrderConfirmed");
        }
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_without_reserving() {
        let h = Harness::new();
        h.seed("SKU-X", 20).await;

        let (event, data) = order_created(vec![OrderLine::new(
            "SKU-X",
            "Widget",
            1000,
            Money::from_cents(100),
        )]);
        h.engine.on_order_created(&event, &data).await.unwrap();

        assert_eq!(h.product("SKU-X").await.reserved_quantity, 0);

        let rejected = h
            .bus
            .published_of_type(Topic::Inventory, "OrderRejected")
            .await;
        assert_eq!(rejected.len(), 1);
        if let common::EventPayload::OrderRejected(r) = &rejected[0].payload {
            assert!(r.reason.contains("SKU-X"));
            assert!(r.reason.contains("available: 20"));
        } else {
            panic!("expected OrderRejected");
        }
    }

    #[tokio::test]
    async fn reservation_is_all_or_nothing() {
        let h = Harness::new();
        h.seed("SKU-A", 10).await;
        h.seed("SKU-B", 1).await;

        let (event, data) = order_created(vec![
            OrderLine::new("SKU-A", "A", 2, Money::from_cents(1000)),
            OrderLine::new("SKU-B", "B", 5, Money::from_cents(1000)),
        ]);
        h.engine.on_order_created(&event, &data).await.unwrap();

        assert_eq!(h.product("SKU-A").await.reserved_quantity, 0);
        assert_eq!(h.product("SKU-B").await.reserved_quantity, 0);
        assert_eq!(
            h.bus
                .published_of_type(Topic::Inventory, "OrderRejected")
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_product_rejects_with_not_found_reason() {
        let h = Harness::new();

        let (event, data) = order_created(vec![OrderLine::new(
            "SKU-MISSING",
            "Ghost",
            1,
            Money::from_cents(100),
        )]);
        h.engine.on_order_created(&event, &data).await.unwrap();

        let rejected = h
            .bus
            .published_of_type(Topic::Inventory, "OrderRejected")
            .await;
        if let common::EventPayload::OrderRejected(r) = &rejected[0].payload {
            assert!(r.reason.contains("SKU-MISSING (not found)"));
        } else {
            panic!("expected OrderRejected");
        }
    }

    #[tokio::test]
    async fn redelivered_order_created_does_not_double_reserve() {
        let h = Harness::new();
        h.seed("SKU-X", 10).await;

        let (event, data) = order_created(vec![OrderLine::new(
            "SKU-X",
            "Widget",
            2,
            Money::from_cents(1000),
        )]);
        h.engine.on_order_created(&event, &data).await.unwrap();
        h.engine.on_order_created(&event, &data).await.unwrap();

        let product = h.product("SKU-X").await;
        assert_eq!(product.reserved_quantity, 2);
        assert_eq!(
            h.ledger
                .rows_of_kind(event.correlation_id, MovementKind::Reserved)
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn redelivery_after_partial_reservation_completes_the_missing_lines() {
        let h = Harness::new();
        h.seed("SKU-A", 10).await;
        h.seed("SKU-B", 10).await;

        let (event, data) = order_created(vec![
            OrderLine::new("SKU-A", "A", 2, Money::from_cents(1000)),
            OrderLine::new("SKU-B", "B", 3, Money::from_cents(1000)),
        ]);

        // A prior delivery crashed after reserving SKU-A: counter bumped and
        // RESERVED row durable, SKU-B never touched.
        {
            let mut product = h.products.lock(&ProductId::new("SKU-A")).await.unwrap();
            product.reserve(2).unwrap();
        }
        h.ledger
            .append(StockMovement::reserved(
                ProductId::new("SKU-A"),
                2,
                event.correlation_id,
                "Reserved for order",
            ))
            .await
            .unwrap();

        h.engine.on_order_created(&event, &data).await.unwrap();

        assert_eq!(h.product("SKU-A").await.reserved_quantity, 2);
        assert_eq!(h.product("SKU-B").await.reserved_quantity, 3);
        let outstanding = h.ledger.outstanding_for(event.correlation_id).await.unwrap();
        assert_eq!(outstanding.get(&ProductId::new("SKU-A")), Some(&2));
        assert_eq!(outstanding.get(&ProductId::new("SKU-B")), Some(&3));
        assert_eq!(
            h.bus
                .published_of_type(Topic::Inventory, "OrderConfirmed")
                .await
                .len(),
            1
        );
        assert!(
            h.bus
                .published_of_type(Topic::Inventory, "OrderRejected")
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn redelivery_after_partial_reservation_compensates_when_stock_ran_out() {
        let h = Harness::new();
        h.seed("SKU-A", 10).await;
        h.seed("SKU-B", 1).await;

        let (event, data) = order_created(vec![
            OrderLine::new("SKU-A", "A", 2, Money::from_cents(1000)),
            OrderLine::new("SKU-B", "B", 5, Money::from_cents(1000)),
        ]);

        {
            let mut product = h.products.lock(&ProductId::new("SKU-A")).await.unwrap();
            product.reserve(2).unwrap();
        }
        h.ledger
            .append(StockMovement::reserved(
                ProductId::new("SKU-A"),
                2,
                event.correlation_id,
                "Reserved for order",
            ))
            .await
            .unwrap();

        h.engine.on_order_created(&event, &data).await.unwrap();

        // SKU-B cannot be completed, so the partial hold on SKU-A is
        // released and the order rejected rather than confirmed short.
        assert_eq!(h.product("SKU-A").await.reserved_quantity, 0);
        assert_eq!(h.product("SKU-B").await.reserved_quantity, 0);
        assert!(
            h.ledger
                .outstanding_for(event.correlation_id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            h.bus
                .published_of_type(Topic::Inventory, "OrderConfirmed")
                .await
                .is_empty()
        );
        let rejected = h
            .bus
            .published_of_type(Topic::Inventory, "OrderRejected")
            .await;
        assert_eq!(rejected.len(), 1);
        if let common::EventPayload::OrderRejected(r) = &rejected[0].payload {
            assert!(r.reason.contains("SKU-B"));
        } else {
            panic!("expected OrderRejected");
        }
    }

    #[tokio::test]
    async fn shipped_confirms_reservation_into_deduction() {
        let h = Harness::new();
        h.seed("SKU-X", 10).await;

        let (event, data) = order_created(vec![OrderLine::new(
            "SKU-X",
            "Widget",
            2,
            Money::from_cents(1000),
        )]);
        h.engine.on_order_created(&event, &data).await.unwrap();
        h.engine.on_order_shipped(event.correlation_id).await.unwrap();

        let product = h.product("SKU-X").await;
        assert_eq!(product.stock_quantity, 8);
        assert_eq!(product.reserved_quantity, 0);

        let confirmed_rows = h
            .ledger
            .rows_of_kind(event.correlation_id, MovementKind::Confirmed)
            .await;
        assert_eq!(confirmed_rows.len(), 1);
        assert_eq!(confirmed_rows[0].quantity, 2);

        // Redelivery of the shipped event is a no-op.
        h.engine.on_order_shipped(event.correlation_id).await.unwrap();
        let product = h.product("SKU-X").await;
        assert_eq!(product.stock_quantity, 8);
        assert_eq!(
            h.ledger
                .rows_of_kind(event.correlation_id, MovementKind::Confirmed)
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let h = Harness::new();
        h.seed("SKU-X", 10).await;

        let (event, data) = order_created(vec![OrderLine::new(
            "SKU-X",
            "Widget",
            4,
            Money::from_cents(1000),
        )]);
        h.engine.on_order_created(&event, &data).await.unwrap();

        h.engine
            .release_reservation(event.correlation_id, "manual release")
            .await
            .unwrap();
        h.engine
            .release_reservation(event.correlation_id, "manual release")
            .await
            .unwrap();

        assert_eq!(h.product("SKU-X").await.reserved_quantity, 0);
        assert_eq!(
            h.ledger
                .rows_of_kind(event.correlation_id, MovementKind::Released)
                .await
                .len(),
            1
        );
        assert!(
            h.ledger
                .outstanding_for(event.correlation_id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
