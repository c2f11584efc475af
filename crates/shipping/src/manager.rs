//! Shipment lifecycle operations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{EventEnvelope, OrderConfirmedData, ShipmentId, Topic};
use event_bus::EventBus;
use uuid::Uuid;

use crate::carrier::CarrierDirectory;
use crate::error::{Result, ShippingError};
use crate::shipment::Shipment;
use crate::status::ShipmentStatus;
use crate::store::ShipmentStore;

/// Weight model: 0.1 kg per dollar of order total.
const KG_PER_DOLLAR: f64 = 0.1;

/// Cost model: $5.00 per kilogram.
const COST_CENTS_PER_KG: f64 = 500.0;

/// Standard delivery window in days.
const DELIVERY_DAYS: i64 = 5;

/// Location label reported on in-transit events.
const IN_TRANSIT_LOCATION: &str = "Distribution Center";

/// Drives shipments through their lifecycle and emits shipping events.
pub struct ShipmentManager {
    shipments: Arc<dyn ShipmentStore>,
    carriers: CarrierDirectory,
    bus: Arc<dyn EventBus>,
}

impl ShipmentManager {
    /// Creates a manager over the given store, carrier directory, and bus.
    pub fn new(
        shipments: Arc<dyn ShipmentStore>,
        carriers: CarrierDirectory,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            shipments,
            carriers,
            bus,
        }
    }

    /// Handles an order-confirmed event by creating a shipment in
    /// PREPARING.
    ///
    /// Idempotent: redelivery of the same confirmation returns the existing
    /// shipment instead of creating a duplicate.
    #[tracing::instrument(skip(self, event, data), fields(correlation_id = %event.correlation_id))]
    pub async fn on_order_confirmed(
        &self,
        event: &EventEnvelope,
        data: &OrderConfirmedData,
    ) -> Result<Shipment> {
        if let Some(existing) = self
            .shipments
            .get_by_correlation(event.correlation_id)
            .await?
        {
            tracing::info!(
                tracking_number = existing.tracking_number,
                "shipment already exists, skipping create"
            );
            return Ok(existing);
        }

        let now = Utc::now();
        let weight_kg = data.total_amount.cents() as f64 / 100.0 * KG_PER_DOLLAR;
        let shipment = Shipment {
            id: ShipmentId::new(),
            correlation_id: event.correlation_id,
            order_id: event.order_id,
            tracking_number: generate_tracking_number(),
            carrier: self.carriers.select_code(),
            status: ShipmentStatus::Preparing,
            recipient: data.customer_info.full_name(),
            shipping_address: data.customer_info.full_address(),
            weight_kg,
            shipping_cost: common::Money::from_cents((weight_kg * COST_CENTS_PER_KG).round() as i64),
            shipped_at: None,
            estimated_delivery_date: (now + Duration::days(DELIVERY_DAYS)).date_naive(),
            actual_delivery_date: None,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        match self.shipments.insert(shipment.clone()).await {
            Ok(()) => {
                metrics::counter!("shipments_created_total").increment(1);
                tracing::info!(
                    tracking_number = shipment.tracking_number,
                    carrier = shipment.carrier,
                    "shipment created"
                );
                Ok(shipment)
            }
            // Lost the create race against a concurrent redelivery.
            Err(ShippingError::AlreadyExists(_)) => {
                let existing = self
                    .shipments
                    .get_by_correlation(event.correlation_id)
                    .await?
                    .ok_or_else(|| ShippingError::NotFound(event.correlation_id.to_string()))?;
                Ok(existing)
            }
            Err(err) => Err(err),
        }
    }

    /// Ships a prepared shipment: PREPARING → SHIPPED, stamps shipped-at,
    /// emits order-shipped.
    #[tracing::instrument(skip(self))]
    pub async fn ship(&self, correlation_id: common::CorrelationId) -> Result<Shipment> {
        let mut shipment = self
            .shipments
            .get_by_correlation(correlation_id)
            .await?
            .ok_or_else(|| ShippingError::NotFound(correlation_id.to_string()))?;

        if !shipment.status.can_ship() {
            return Err(ShippingError::InvalidState {
                action: "ship",
                current: shipment.status,
            });
        }

        shipment.status = ShipmentStatus::Shipped;
        shipment.shipped_at = Some(Utc::now());
        let shipment = self.shipments.update(shipment).await?;

        let event = EventEnvelope::order_shipped(
            shipment.correlation_id,
            shipment.order_id,
            shipment.id,
            shipment.tracking_number.clone(),
            shipment.carrier.clone(),
            shipment.shipping_address.clone(),
        );
        self.emit(event).await;
        metrics::counter!("shipments_shipped_total").increment(1);
        tracing::info!(tracking_number = shipment.tracking_number, "shipment shipped");
        Ok(shipment)
    }

    /// Marks a shipment in transit: SHIPPED → IN_TRANSIT, emits the
    /// in-transit event with the location label and the ETA computed at
    /// creation.
    #[tracing::instrument(skip(self))]
    pub async fn mark_in_transit(&self, tracking_number: &str) -> Result<Shipment> {
        let mut shipment = self.get_by_tracking(tracking_number).await?;

        if !shipment.status.can_mark_in_transit() {
            return Err(ShippingError::InvalidState {
                action: "mark in-transit",
                current: shipment.status,
            });
        }

        shipment.status = ShipmentStatus::InTransit;
        let shipment = self.shipments.update(shipment).await?;

        let event = EventEnvelope::order_in_transit(
            shipment.correlation_id,
            shipment.order_id,
            shipment.id,
            shipment.tracking_number.clone(),
            IN_TRANSIT_LOCATION,
            shipment.estimated_delivery_date.to_string(),
        );
        self.emit(event).await;
        tracing::info!(tracking_number, "shipment in transit");
        Ok(shipment)
    }

    /// Marks a shipment delivered: IN_TRANSIT / OUT_FOR_DELIVERY →
    /// DELIVERED, stamps the actual delivery date, emits order-delivered.
    #[tracing::instrument(skip(self))]
    pub async fn mark_delivered(&self, tracking_number: &str) -> Result<Shipment> {
        let mut shipment = self.get_by_tracking(tracking_number).await?;

        if !shipment.status.can_mark_delivered() {
            return Err(ShippingError::InvalidState {
                action: "deliver",
                current: shipment.status,
            });
        }

        shipment.status = ShipmentStatus::Delivered;
        shipment.actual_delivery_date = Some(Utc::now().date_naive());
        let shipment = self.shipments.update(shipment).await?;

        let event = EventEnvelope::order_delivered(
            shipment.correlation_id,
            shipment.order_id,
            shipment.id,
            shipment.tracking_number.clone(),
            shipment.shipping_address.clone(),
            shipment.recipient.clone(),
        );
        self.emit(event).await;
        metrics::counter!("shipments_delivered_total").increment(1);
        tracing::info!(tracking_number, "shipment delivered");
        Ok(shipment)
    }

    /// Looks a shipment up by tracking number.
    pub async fn get_by_tracking(&self, tracking_number: &str) -> Result<Shipment> {
        self.shipments
            .get_by_tracking(tracking_number)
            .await?
            .ok_or_else(|| ShippingError::NotFound(tracking_number.to_string()))
    }

    /// Looks a shipment up by correlation id.
    pub async fn get_by_correlation(
        &self,
        correlation_id: common::CorrelationId,
    ) -> Result<Shipment> {
        self.shipments
            .get_by_correlation(correlation_id)
            .await?
            .ok_or_else(|| ShippingError::NotFound(correlation_id.to_string()))
    }

    async fn emit(&self, event: EventEnvelope) {
        if let Err(err) = self.bus.publish(Topic::Shipping, event).await {
            // Fire-and-forget: redelivery of the triggering event is the
            // recovery path.
            tracing::error!(%err, "failed to publish shipping event");
        }
    }
}

/// Generates a `TRK-` tracking number with 8 uppercase hex characters.
fn generate_tracking_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("TRK-{}", id[..8].to_uppercase())
}
