//! Demo entry point: wires every service to one in-process bus and runs an
//! order through the full saga, including a rejection and a notification
//! outage with a retry sweep.

mod config;

use std::sync::Arc;

use chrono::Utc;
use common::{CustomerInfo, Money, OrderLine, ProductId, Topic};
use event_bus::{InMemoryEventBus, LoggingRecovery};
use inventory::{
    InMemoryMovementLedger, InMemoryProductStore, InventoryConsumer, Product, ProductStore,
    ReservationEngine,
};
use notification::{
    InMemoryNotificationStore, InMemoryTemplateCatalog, NotificationConsumer,
    NotificationDispatcher, SimulatedEmailChannel,
};
use orders::{CreateOrderRequest, InMemoryOrderStore, OrderService};
use shipping::{CarrierDirectory, InMemoryShipmentStore, ShipmentManager, ShippingConsumer};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

struct Services {
    orders: OrderService,
    shipping: Arc<ShipmentManager>,
    dispatcher: Arc<NotificationDispatcher>,
    products: InMemoryProductStore,
    notifications: InMemoryNotificationStore,
    channel: SimulatedEmailChannel,
}

/// Wires all four services to a shared bus, each under its own consumer
/// group, the same shape the Kafka deployment would have.
async fn wire_services() -> Services {
    let bus = InMemoryEventBus::new().with_recovery(Arc::new(LoggingRecovery));

    let products = InMemoryProductStore::new();
    let engine = Arc::new(ReservationEngine::new(
        Arc::new(products.clone()),
        Arc::new(InMemoryMovementLedger::new()),
        Arc::new(bus.clone()),
    ));
    let inventory_consumer = Arc::new(InventoryConsumer::new(engine));
    bus.subscribe(Topic::Orders, inventory::consumer::GROUP, inventory_consumer.clone())
        .await;
    bus.subscribe(Topic::Shipping, inventory::consumer::GROUP, inventory_consumer)
        .await;

    let shipping = Arc::new(ShipmentManager::new(
        Arc::new(InMemoryShipmentStore::new()),
        CarrierDirectory::standard(),
        Arc::new(bus.clone()),
    ));
    bus.subscribe(
        Topic::Inventory,
        shipping::consumer::GROUP,
        Arc::new(ShippingConsumer::new(Arc::clone(&shipping))),
    )
    .await;

    let notifications = InMemoryNotificationStore::new();
    let channel = SimulatedEmailChannel::new();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(notifications.clone()),
        Arc::new(InMemoryTemplateCatalog::with_defaults().await),
        Arc::new(channel.clone()),
    ));
    let notification_consumer = Arc::new(NotificationConsumer::new(Arc::clone(&dispatcher)));
    for topic in [Topic::Orders, Topic::Inventory, Topic::Shipping] {
        bus.subscribe(topic, notification::consumer::GROUP, notification_consumer.clone())
            .await;
    }

    let orders = OrderService::new(Arc::new(InMemoryOrderStore::new()), Arc::new(bus.clone()));

    Services {
        orders,
        shipping,
        dispatcher,
        products,
        notifications,
        channel,
    }
}

fn demo_customer() -> CustomerInfo {
    CustomerInfo {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        street: "1 Compiler Rd".to_string(),
        city: "Arlington".to_string(),
        postal_code: "22201".to_string(),
        country: "US".to_string(),
    }
}

fn demo_request(sku: &str, quantity: u32, unit_price: Money) -> CreateOrderRequest {
    let order_items = vec![OrderLine::new(sku, sku, quantity, unit_price)];
    let total_amount = order_items.iter().map(|l| l.line_total()).sum();
    CreateOrderRequest {
        customer_info: demo_customer(),
        order_items,
        total_amount,
        correlation_id: None,
        notes: None,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let services = wire_services().await;

    for sku in ["SKU-KEYBOARD", "SKU-MONITOR"] {
        services
            .products
            .insert(Product::new(sku, sku, config.seed_stock, 5, Money::from_cents(4999)))
            .await
            .expect("seeding products");
    }

    // Scenario 1: happy path through to delivery.
    tracing::info!("scenario 1: happy path");
    let order = services
        .orders
        .create_order(demo_request("SKU-KEYBOARD", 2, Money::from_cents(4999)))
        .await
        .expect("order creation");
    let shipment = services
        .shipping
        .get_by_correlation(order.correlation_id)
        .await
        .expect("shipment created by confirmation");
    services
        .shipping
        .ship(order.correlation_id)
        .await
        .expect("ship");
    services
        .shipping
        .mark_in_transit(&shipment.tracking_number)
        .await
        .expect("in transit");
    services
        .shipping
        .mark_delivered(&shipment.tracking_number)
        .await
        .expect("delivered");
    let stock = services
        .products
        .get(&ProductId::new("SKU-KEYBOARD"))
        .await
        .expect("product lookup")
        .expect("product seeded");
    tracing::info!(
        tracking_number = shipment.tracking_number,
        stock = stock.stock_quantity,
        reserved = stock.reserved_quantity,
        "order delivered"
    );

    // Scenario 2: rejection for lack of stock.
    tracing::info!("scenario 2: rejection");
    let rejected = services
        .orders
        .create_order(demo_request("SKU-MONITOR", config.seed_stock + 1, Money::from_cents(4999)))
        .await
        .expect("order creation");
    tracing::info!(order_id = %rejected.id, "order rejected downstream, reservations released");

    // Scenario 3: notification outage and the retry sweep.
    tracing::info!("scenario 3: notification outage");
    services.channel.set_failing(true);
    services
        .orders
        .create_order(demo_request("SKU-KEYBOARD", 1, Money::from_cents(4999)))
        .await
        .expect("order creation");
    services.channel.set_failing(false);
    let swept = services
        .dispatcher
        .process_due_retries(Utc::now() + chrono::Duration::hours(1))
        .await
        .expect("retry sweep");
    tracing::info!(swept, "retry sweep delivered the queued notifications");

    let sent = services.channel.sent_count().await;
    let rows = services.notifications.row_count().await;
    tracing::info!(sent, rows, "demo complete");
}
