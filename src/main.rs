use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bookstore_orders::config::{AppConfig, NotifierKind};
use bookstore_orders::domain::book::Book;
use bookstore_orders::domain::customer::Customer;
use bookstore_orders::metrics::{self, Metrics};
use bookstore_orders::notifications::{LogNotifier, OrderNotifier, OutboxNotifier};
use bookstore_orders::services::{
    CreateOrderRequest, ImportLineRequest, InventoryService, OrderLineRequest, OrderService,
};
use bookstore_orders::store::{scylladb, CustomerStore, ScyllaCatalog, ScyllaCustomers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bookstore_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting bookstore order engine");

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    // === 1. ScyllaDB session and schema ===
    let session = Arc::new(scylladb::connect(&config).await?);

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // actix-web runs on its own runtime, in a background thread
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime could not start: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 3. Stores, notifier and services ===
    let catalog = Arc::new(ScyllaCatalog::new(session.clone()));
    let customers = Arc::new(ScyllaCustomers::new(session.clone()));
    let notifier: Arc<dyn OrderNotifier> = match config.notifier {
        NotifierKind::Outbox => Arc::new(OutboxNotifier::new(session.clone())),
        NotifierKind::Log => Arc::new(LogNotifier),
    };

    let orders = OrderService::new(catalog.clone(), customers.clone(), notifier, metrics.clone())
        .with_max_page_size(config.max_page_size);
    let inventory = InventoryService::new(catalog.clone(), customers.clone())
        .with_max_page_size(config.max_page_size);

    // === 4. Seed demo data ===
    seed_demo_data(&catalog, &customers).await?;

    // === 5. Demonstrate the order lifecycle ===
    tracing::info!("📝 Demonstrating order lifecycle");

    let invoice_code = inventory
        .create_import_invoice(
            "AD1",
            vec![ImportLineRequest {
                book_code: "SP2".into(),
                quantity: 20,
                unit_price: 35_000,
            }],
            Some("Opening stock".into()),
        )
        .await?;
    tracing::info!(invoice_code = %invoice_code, "✅ Stock imported");

    let order_code = orders
        .create_order(CreateOrderRequest {
            customer_code: "KH1".into(),
            items: vec![
                OrderLineRequest { book_code: "SP1".into(), quantity: 2 },
                OrderLineRequest { book_code: "SP2".into(), quantity: 1 },
            ],
            payment_method: "Chuyển khoản".into(),
        })
        .await?;

    orders.update_order_status("KH1", &order_code, "Shipping").await?;
    orders.confirm_received("KH1", &order_code).await?;

    let second = orders
        .create_order(CreateOrderRequest {
            customer_code: "KH1".into(),
            items: vec![OrderLineRequest { book_code: "SP1".into(), quantity: 1 }],
            payment_method: "Tiền mặt".into(),
        })
        .await?;
    orders.cancel_order("KH1", &second, "Ordered by mistake").await?;

    let page = orders.list_all_orders(1, 20).await?;
    for row in &page.items {
        tracing::info!(
            order_code = %row.order_code,
            customer_code = %row.customer_code,
            status = %row.status,
            total = row.total,
            "Order"
        );
    }

    tracing::info!("🎉 Demo complete, serving metrics until Ctrl+C");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}

/// Skipped when the demo customer already exists.
async fn seed_demo_data(catalog: &ScyllaCatalog, customers: &ScyllaCustomers) -> anyhow::Result<()> {
    if customers.get_by_code("KH1").await?.is_some() {
        tracing::info!("Demo data already present");
        return Ok(());
    }

    catalog.upsert(&Book::new("SP1", "Dế Mèn Phiêu Lưu Ký", 85_000, 50)).await?;
    catalog.upsert(&Book::new("SP2", "Số Đỏ", 62_000, 10)).await?;

    customers
        .upsert(
            &Customer::new("KH1", "Nguyen Van A", "a@example.com")
                .with_contact("0900000000", "12 Le Loi, District 1"),
        )
        .await?;
    customers
        .upsert(&Customer::new("AD1", "Store Admin", "admin@example.com").as_admin())
        .await?;

    tracing::info!("🌱 Demo data seeded");
    Ok(())
}
