use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::domain::order::{
    Order, OrderCommand, OrderError, OrderEvent, OrderItem, OrderStatusKind, PaymentMethod,
};
use crate::metrics::{Metrics, TransitionKind};
use crate::notifications::{OrderConfirmation, OrderNotifier};
use crate::store::{CatalogStore, CustomerStore};
use super::codes::CodeGenerator;
use super::pagination::{paginate, Page, PageRequest};

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: Customer document -> Order aggregate -> stock -> write back
//
// Known limitations kept on purpose:
// - Stock reservations are per book. If a later line fails, earlier lines
//   stay reserved; there is no compensation step.
// - The order list is replaced as a whole without a version check, so two
//   concurrent writers on one customer can overwrite each other.
//
// ============================================================================

pub const DEFAULT_MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub book_code: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_code: String,
    pub items: Vec<OrderLineRequest>,
    /// Free-form, e.g. "Tiền mặt" or "ChuyenKhoan".
    pub payment_method: String,
}

/// One row of the admin order listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOrderRow {
    pub order_code: String,
    pub customer_code: String,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub total: i64,
    pub status: OrderStatusKind,
    pub payment_method: PaymentMethod,
}

pub struct OrderService {
    catalog: Arc<dyn CatalogStore>,
    customers: Arc<dyn CustomerStore>,
    notifier: Arc<dyn OrderNotifier>,
    metrics: Arc<Metrics>,
    order_codes: CodeGenerator,
    max_page_size: u32,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        customers: Arc<dyn CustomerStore>,
        notifier: Arc<dyn OrderNotifier>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            catalog,
            customers,
            notifier,
            metrics,
            order_codes: CodeGenerator::new("HD"),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    // ------------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------------

    /// Place an order and return its code.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<String, OrderError> {
        let started = Instant::now();
        let customer_code = request.customer_code.clone();
        let result = self.place_order(request).await;

        match &result {
            Ok(_) => self.metrics.record_order_created(),
            Err(e) => {
                self.metrics.record_creation_failure(e.reason_label());
                if e.is_validation() {
                    tracing::debug!(customer_code = %customer_code, error = %e, "Order request rejected");
                } else {
                    tracing::warn!(
                        customer_code = %customer_code,
                        reason = e.reason_label(),
                        error = %e,
                        "Order creation failed"
                    );
                }
            }
        }
        self.metrics
            .observe_duration("create_order", started.elapsed().as_secs_f64());

        result
    }

    async fn place_order(&self, request: CreateOrderRequest) -> Result<String, OrderError> {
        let customer = self
            .customers
            .get_by_code(&request.customer_code)
            .await?
            .ok_or_else(|| OrderError::CustomerNotFound(request.customer_code.clone()))?;

        if request.items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        let payment_method = PaymentMethod::normalize(&request.payment_method)?;

        // Validate every line and freeze name/price before touching stock.
        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let book = self
                .catalog
                .get_by_code(&line.book_code)
                .await?
                .ok_or_else(|| OrderError::BookNotFound(line.book_code.clone()))?;

            if line.quantity <= 0 {
                return Err(OrderError::InvalidQuantity {
                    book_code: line.book_code.clone(),
                    quantity: line.quantity,
                });
            }

            items.push(OrderItem::snapshot(&book, line.quantity));
        }

        for item in &items {
            let reserved = self
                .catalog
                .adjust_stock_and_sold(&item.book_code, item.quantity)
                .await?;
            self.metrics.record_stock_adjustment(item.quantity, reserved);

            if !reserved {
                tracing::warn!(
                    customer_code = %customer.code,
                    book_code = %item.book_code,
                    quantity = item.quantity,
                    "Insufficient stock, order rejected"
                );
                return Err(OrderError::InsufficientStock(item.book_code.clone()));
            }
        }

        let now = Utc::now();
        let order = Order::place(self.order_codes.next(now), now, payment_method, items)?;

        let mut orders = customer.orders.clone();
        orders.push(order.clone());
        if !self.customers.replace_order_list(&customer.code, &orders).await? {
            tracing::error!(
                customer_code = %customer.code,
                order_code = %order.code,
                "Stock reserved but order list was not written"
            );
            return Err(OrderError::NotPersisted(customer.code.clone()));
        }

        tracing::info!(
            customer_code = %customer.code,
            order_code = %order.code,
            total = order.total,
            item_count = order.items.len(),
            payment_method = %order.payment_method,
            "✅ Order placed"
        );

        self.dispatch_confirmation(&customer, &order);

        Ok(order.code)
    }

    /// Hand the confirmation to the notifier on a background task. Errors
    /// are logged and counted, never returned.
    fn dispatch_confirmation(&self, customer: &Customer, order: &Order) {
        let confirmation = OrderConfirmation::new(customer, order);
        let to_address = customer.email.clone();
        let to_name = customer.full_name.clone();
        let notifier = Arc::clone(&self.notifier);
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            if let Err(e) = notifier
                .send_order_confirmation(&to_address, &to_name, &confirmation)
                .await
            {
                metrics.record_notification_failure();
                tracing::error!(
                    order_code = %confirmation.order_code,
                    to = %to_address,
                    error = %e,
                    "Order confirmation could not be sent"
                );
            }
        });
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// All orders of one customer, newest first. Unknown customers have none.
    pub async fn get_orders_by_customer(&self, customer_code: &str) -> Result<Vec<Order>, OrderError> {
        let Some(customer) = self.customers.get_by_code(customer_code).await? else {
            return Ok(Vec::new());
        };

        let mut orders = customer.orders;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Look an order up by code alone. Orders have no index of their own,
    /// so this scans every customer.
    pub async fn get_order_by_code(&self, order_code: &str) -> Result<Option<Order>, OrderError> {
        let customers = self.customers.list_all().await?;

        Ok(customers
            .into_iter()
            .flat_map(|c| c.orders)
            .find(|o| o.code == order_code))
    }

    /// Every order of every customer, newest first, one page at a time.
    pub async fn list_all_orders(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<Page<AdminOrderRow>, OrderError> {
        let request = PageRequest::clamped(page, page_size, self.max_page_size);
        let customers = self.customers.list_all().await?;

        let mut rows: Vec<AdminOrderRow> = customers
            .into_iter()
            .flat_map(|customer| {
                let Customer { code, full_name, orders, .. } = customer;
                orders.into_iter().map(move |order| AdminOrderRow {
                    order_code: order.code,
                    customer_code: code.clone(),
                    customer_name: full_name.clone(),
                    created_at: order.created_at,
                    total: order.total,
                    status: order.status.kind(),
                    payment_method: order.payment_method,
                })
            })
            .collect();

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, request))
    }

    // ------------------------------------------------------------------------
    // Status changes
    // ------------------------------------------------------------------------

    /// Admin override: sets any recognised status with no transition check
    /// and no stock changes.
    pub async fn update_order_status(
        &self,
        customer_code: &str,
        order_code: &str,
        new_status: &str,
    ) -> Result<(), OrderError> {
        let status: OrderStatusKind = new_status.parse()?;
        let (mut customer, index) = self.load_order(customer_code, order_code).await?;

        let events = customer.orders[index].execute(&OrderCommand::OverrideStatus { status }, Utc::now())?;
        self.save_orders(&customer).await?;
        self.record_transitions(&events, TransitionKind::Admin);

        tracing::info!(
            customer_code = %customer_code,
            order_code = %order_code,
            status = %status,
            "Order status overridden by admin"
        );
        Ok(())
    }

    /// Customer confirms delivery: Shipping -> Completed.
    pub async fn confirm_received(&self, customer_code: &str, order_code: &str) -> Result<(), OrderError> {
        let (mut customer, index) = self.load_order(customer_code, order_code).await?;

        let events = customer.orders[index]
            .execute(&OrderCommand::ConfirmReceived, Utc::now())
            .inspect_err(|e| {
                tracing::warn!(order_code = %order_code, error = %e, "Receipt confirmation rejected");
            })?;

        self.save_orders(&customer).await?;
        self.record_transitions(&events, TransitionKind::Guarded);

        tracing::info!(
            customer_code = %customer_code,
            order_code = %order_code,
            "✅ Order received and completed"
        );
        Ok(())
    }

    /// Customer cancels a placed order and every line's stock is released.
    ///
    /// Stock is released before the order list is written. If that write
    /// fails the caller gets `NotPersisted` and the order needs manual
    /// reconciliation.
    pub async fn cancel_order(
        &self,
        customer_code: &str,
        order_code: &str,
        reason: &str,
    ) -> Result<(), OrderError> {
        if reason.trim().is_empty() {
            return Err(OrderError::MissingCancelReason);
        }

        let (mut customer, index) = self.load_order(customer_code, order_code).await?;
        let command = OrderCommand::Cancel { reason: reason.to_string() };

        let events = customer.orders[index]
            .handle_command(&command, Utc::now())
            .inspect_err(|e| {
                tracing::warn!(order_code = %order_code, error = %e, "Cancellation rejected");
            })?;

        for item in &customer.orders[index].items {
            let released = self
                .catalog
                .adjust_stock_and_sold(&item.book_code, -item.quantity)
                .await?;
            self.metrics.record_stock_adjustment(-item.quantity, released);

            if !released {
                tracing::warn!(
                    order_code = %order_code,
                    book_code = %item.book_code,
                    quantity = item.quantity,
                    "Book missing from catalog, stock not released"
                );
            }
        }

        for event in &events {
            customer.orders[index].apply_event(event);
        }

        if let Err(e) = self.save_orders(&customer).await {
            tracing::error!(
                customer_code = %customer_code,
                order_code = %order_code,
                error = %e,
                "Stock released but cancellation not saved, manual reconciliation required"
            );
            return Err(e);
        }

        self.metrics.record_cancellation();
        self.record_transitions(&events, TransitionKind::Guarded);

        tracing::info!(
            customer_code = %customer_code,
            order_code = %order_code,
            reason = %reason,
            "Order cancelled"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    async fn load_order(&self, customer_code: &str, order_code: &str) -> Result<(Customer, usize), OrderError> {
        let customer = self
            .customers
            .get_by_code(customer_code)
            .await?
            .ok_or_else(|| OrderError::CustomerNotFound(customer_code.to_string()))?;

        let index = customer
            .orders
            .iter()
            .position(|o| o.code == order_code)
            .ok_or_else(|| OrderError::OrderNotFound(order_code.to_string()))?;

        Ok((customer, index))
    }

    async fn save_orders(&self, customer: &Customer) -> Result<(), OrderError> {
        if self
            .customers
            .replace_order_list(&customer.code, &customer.orders)
            .await?
        {
            Ok(())
        } else {
            Err(OrderError::NotPersisted(customer.code.clone()))
        }
    }

    fn record_transitions(&self, events: &[OrderEvent], kind: TransitionKind) {
        for event in events {
            let (from, to) = event.transition();
            self.metrics.record_transition(from, to, kind);
            tracing::debug!(event_type = event.event_type(), from = %from, to = %to, "Order transition");
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::domain::book::Book;
    use crate::domain::inventory::ImportInvoice;
    use crate::domain::order::{OrderStatus, ADMIN_CANCEL_REASON};
    use crate::store::{InMemoryCatalog, InMemoryCustomers};

    struct RecordingNotifier {
        sent: mpsc::UnboundedSender<(String, OrderConfirmation)>,
    }

    #[async_trait]
    impl OrderNotifier for RecordingNotifier {
        async fn send_order_confirmation(
            &self,
            to_address: &str,
            _to_name: &str,
            confirmation: &OrderConfirmation,
        ) -> anyhow::Result<()> {
            let _ = self.sent.send((to_address.to_string(), confirmation.clone()));
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl OrderNotifier for FailingNotifier {
        async fn send_order_confirmation(
            &self,
            _to_address: &str,
            _to_name: &str,
            _confirmation: &OrderConfirmation,
        ) -> anyhow::Result<()> {
            Err(anyhow!("mail relay unavailable"))
        }
    }

    /// Reads pass through; order list writes are never acknowledged.
    struct UnacknowledgedWrites(Arc<InMemoryCustomers>);

    #[async_trait]
    impl CustomerStore for UnacknowledgedWrites {
        async fn get_by_code(&self, code: &str) -> anyhow::Result<Option<Customer>> {
            self.0.get_by_code(code).await
        }
        async fn list_all(&self) -> anyhow::Result<Vec<Customer>> {
            self.0.list_all().await
        }
        async fn replace_order_list(&self, _code: &str, _orders: &[Order]) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn push_import_invoice(&self, _code: &str, _invoice: &ImportInvoice) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    struct Harness {
        service: OrderService,
        catalog: Arc<InMemoryCatalog>,
        customers: Arc<InMemoryCustomers>,
        sent: mpsc::UnboundedReceiver<(String, OrderConfirmation)>,
    }

    impl Harness {
        async fn new() -> Self {
            let catalog = Arc::new(InMemoryCatalog::new());
            catalog.upsert(Book::new("SP1", "Dế Mèn Phiêu Lưu Ký", 100, 10)).await;
            catalog.upsert(Book::new("SP2", "Số Đỏ", 50, 10)).await;

            let customers = Arc::new(InMemoryCustomers::new());
            customers
                .upsert(
                    Customer::new("KH1", "Nguyen Van A", "a@example.com")
                        .with_contact("0900000000", "1 Le Loi"),
                )
                .await;
            customers
                .upsert(Customer::new("KH2", "Tran Thi B", "b@example.com"))
                .await;

            let (tx, sent) = mpsc::unbounded_channel();
            let service = OrderService::new(
                catalog.clone(),
                customers.clone(),
                Arc::new(RecordingNotifier { sent: tx }),
                Arc::new(Metrics::new().unwrap()),
            );

            Self { service, catalog, customers, sent }
        }

        async fn stock(&self, code: &str) -> (i32, i32) {
            let book = self.catalog.get_by_code(code).await.unwrap().unwrap();
            (book.in_stock, book.sold)
        }

        async fn set_stock(&self, code: &str, in_stock: i32) {
            let mut book = self.catalog.get_by_code(code).await.unwrap().unwrap();
            book.in_stock = in_stock;
            self.catalog.upsert(book).await;
        }

        async fn order(&self, customer_code: &str, order_code: &str) -> Order {
            self.customers
                .get_by_code(customer_code)
                .await
                .unwrap()
                .unwrap()
                .find_order(order_code)
                .cloned()
                .unwrap()
        }

        async fn place(&self, customer_code: &str, lines: &[(&str, i32)]) -> Result<String, OrderError> {
            self.service.create_order(request(customer_code, lines, "Tiền mặt")).await
        }
    }

    fn request(customer_code: &str, lines: &[(&str, i32)], payment: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_code: customer_code.to_string(),
            items: lines
                .iter()
                .map(|(code, quantity)| OrderLineRequest {
                    book_code: code.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            payment_method: payment.to_string(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_order_placement() {
        let mut h = Harness::new().await;
        let before = h.service.get_orders_by_customer("KH1").await.unwrap().len();

        let code = h
            .service
            .create_order(request("KH1", &[("SP1", 2), ("SP2", 1)], "Chuyển khoản"))
            .await
            .unwrap();

        let order = h.order("KH1", &code).await;
        assert_eq!(order.total, 250);
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.payment_method, PaymentMethod::BankTransfer);
        assert!(order.totals_reconcile());
        assert!(code.starts_with("HD"));

        assert_eq!(h.stock("SP1").await, (8, 2));
        assert_eq!(h.stock("SP2").await, (9, 1));
        assert_eq!(h.service.get_orders_by_customer("KH1").await.unwrap().len(), before + 1);

        let (to, confirmation) = tokio::time::timeout(Duration::from_secs(1), h.sent.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(to, "a@example.com");
        assert_eq!(confirmation.order_code, code);
        assert_eq!(confirmation.total, 250);
    }

    #[tokio::test]
    async fn test_exact_stock_then_insufficient() {
        let h = Harness::new().await;
        h.set_stock("SP1", 5).await;

        h.place("KH1", &[("SP1", 5)]).await.unwrap();
        assert_eq!(h.stock("SP1").await, (0, 5));

        let err = h.place("KH1", &[("SP1", 1)]).await.unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock(ref code) if code == "SP1"));
        assert_eq!(h.stock("SP1").await, (0, 5));
        assert_eq!(h.service.get_orders_by_customer("KH1").await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_never_oversell() {
        let h = Harness::new().await;
        h.set_stock("SP1", 5).await;
        let service = Arc::new(h.service);

        let attempts: Vec<_> = (0..10)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service.create_order(request("KH1", &[("SP1", 1)], "cash")).await
                })
            })
            .collect();

        let mut placed = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => placed += 1,
                Err(e) => {
                    assert!(matches!(e, OrderError::InsufficientStock(_)), "{e}");
                    assert!(!e.is_validation());
                }
            }
        }

        assert_eq!(placed, 5);
        let book = h.catalog.get_by_code("SP1").await.unwrap().unwrap();
        assert_eq!((book.in_stock, book.sold), (0, 5));
    }

    #[tokio::test]
    async fn test_validation_errors_have_no_side_effects() {
        let h = Harness::new().await;

        let err = h.place("KH404", &[("SP1", 1)]).await.unwrap_err();
        assert!(matches!(err, OrderError::CustomerNotFound(_)));

        let err = h.place("KH1", &[]).await.unwrap_err();
        assert!(matches!(err, OrderError::EmptyItems));

        let err = h.place("KH1", &[("SP1", 1), ("SP2", 0)]).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { quantity: 0, .. }));

        let err = h.place("KH1", &[("SP1", 1), ("SP404", 1)]).await.unwrap_err();
        assert!(matches!(err, OrderError::BookNotFound(ref code) if code == "SP404"));

        let err = h
            .service
            .create_order(request("KH1", &[("SP1", 1)], "the moon"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidPaymentMethod(_)));
        assert!(err.is_validation());

        assert_eq!(h.stock("SP1").await, (10, 0));
        assert_eq!(h.stock("SP2").await, (10, 0));
        assert!(h.service.get_orders_by_customer("KH1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_reservation_is_not_compensated() {
        let h = Harness::new().await;
        h.set_stock("SP2", 0).await;

        let err = h.place("KH1", &[("SP1", 2), ("SP2", 1)]).await.unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock(ref code) if code == "SP2"));
        // the first line stays reserved
        assert_eq!(h.stock("SP1").await, (8, 2));
        assert!(h.service.get_orders_by_customer("KH1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prices_are_snapshotted() {
        let h = Harness::new().await;
        let code = h.place("KH1", &[("SP1", 2)]).await.unwrap();

        let mut book = h.catalog.get_by_code("SP1").await.unwrap().unwrap();
        book.price = 999;
        book.name = "Renamed".into();
        h.catalog.upsert(book).await;

        let order = h.service.get_order_by_code(&code).await.unwrap().unwrap();
        assert_eq!(order.total, 200);
        assert_eq!(order.items[0].unit_price, 100);
        assert_eq!(order.items[0].book_name, "Dế Mèn Phiêu Lưu Ký");
    }

    #[tokio::test]
    async fn test_cancel_placed_order_releases_stock() {
        let h = Harness::new().await;
        h.set_stock("SP1", 5).await;
        let code = h.place("KH1", &[("SP1", 3)]).await.unwrap();
        assert_eq!(h.stock("SP1").await, (2, 3));

        h.service.cancel_order("KH1", &code, "Đặt nhầm").await.unwrap();

        assert_eq!(h.stock("SP1").await, (5, 0));
        let order = h.order("KH1", &code).await;
        assert_eq!(order.status.kind(), OrderStatusKind::Cancelled);
        assert_eq!(order.status.cancel_reason(), Some("Đặt nhầm"));
        assert!(order.status.finished_at().is_some());
    }

    #[tokio::test]
    async fn test_cancel_rejected_outside_placed() {
        let h = Harness::new().await;
        let code = h.place("KH1", &[("SP1", 3)]).await.unwrap();

        h.service.update_order_status("KH1", &code, "Shipping").await.unwrap();
        let err = h.service.cancel_order("KH1", &code, "late").await.unwrap_err();
        assert!(matches!(err, OrderError::CannotCancelShipping));
        assert_eq!(h.order("KH1", &code).await.status, OrderStatus::Shipping);

        h.service.confirm_received("KH1", &code).await.unwrap();
        let err = h.service.cancel_order("KH1", &code, "late").await.unwrap_err();
        assert!(matches!(err, OrderError::CannotCancelCompleted));

        let other = h.place("KH1", &[("SP2", 1)]).await.unwrap();
        h.service.cancel_order("KH1", &other, "first").await.unwrap();
        let err = h.service.cancel_order("KH1", &other, "again").await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyCancelled));

        // none of the rejected cancellations moved stock
        assert_eq!(h.stock("SP1").await, (7, 3));
        assert_eq!(h.stock("SP2").await, (10, 0));
        assert_eq!(h.order("KH1", &other).await.status.cancel_reason(), Some("first"));
    }

    #[tokio::test]
    async fn test_cancel_requires_reason() {
        let h = Harness::new().await;
        let code = h.place("KH1", &[("SP1", 1)]).await.unwrap();

        let err = h.service.cancel_order("KH1", &code, "  ").await.unwrap_err();
        assert!(matches!(err, OrderError::MissingCancelReason));
        assert_eq!(h.order("KH1", &code).await.status, OrderStatus::Placed);
        assert_eq!(h.stock("SP1").await, (9, 1));
    }

    #[tokio::test]
    async fn test_confirm_received_once() {
        let h = Harness::new().await;
        let code = h.place("KH1", &[("SP1", 1)]).await.unwrap();

        let err = h.service.confirm_received("KH1", &code).await.unwrap_err();
        assert!(matches!(err, OrderError::NotShipping(OrderStatusKind::Placed)));

        h.service.update_order_status("KH1", &code, "DangGiao").await.unwrap();
        h.service.confirm_received("KH1", &code).await.unwrap();

        let completed = h.order("KH1", &code).await;
        assert!(matches!(completed.status, OrderStatus::Completed { .. }));

        let err = h.service.confirm_received("KH1", &code).await.unwrap_err();
        assert!(matches!(err, OrderError::NotShipping(OrderStatusKind::Completed)));
        assert_eq!(h.order("KH1", &code).await, completed);
    }

    #[tokio::test]
    async fn test_admin_override_bypasses_guards() {
        let h = Harness::new().await;
        let code = h.place("KH1", &[("SP1", 2)]).await.unwrap();

        h.service.update_order_status("KH1", &code, "Completed").await.unwrap();
        h.service.update_order_status("KH1", &code, "placed").await.unwrap();
        assert_eq!(h.order("KH1", &code).await.status, OrderStatus::Placed);

        h.service.update_order_status("KH1", &code, "Cancelled").await.unwrap();
        let order = h.order("KH1", &code).await;
        assert_eq!(order.status.cancel_reason(), Some(ADMIN_CANCEL_REASON));
        // overrides never touch stock
        assert_eq!(h.stock("SP1").await, (8, 2));
    }

    #[tokio::test]
    async fn test_update_status_errors() {
        let h = Harness::new().await;
        let code = h.place("KH1", &[("SP1", 1)]).await.unwrap();

        let err = h.service.update_order_status("KH1", &code, "Lost").await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus(_)));

        let err = h.service.update_order_status("KH1", "HD0", "Shipping").await.unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));

        let err = h.service.update_order_status("KH404", &code, "Shipping").await.unwrap_err();
        assert!(matches!(err, OrderError::CustomerNotFound(_)));
    }

    #[tokio::test]
    async fn test_orders_by_customer_newest_first() {
        let h = Harness::new().await;
        let first = h.place("KH1", &[("SP1", 1)]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = h.place("KH1", &[("SP2", 1)]).await.unwrap();

        let orders = h.service.get_orders_by_customer("KH1").await.unwrap();
        let codes: Vec<_> = orders.iter().map(|o| o.code.as_str()).collect();
        assert_eq!(codes, vec![second.as_str(), first.as_str()]);

        assert!(h.service.get_orders_by_customer("KH404").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_order_by_code_scans_all_customers() {
        let h = Harness::new().await;
        let code = h.place("KH2", &[("SP2", 2)]).await.unwrap();

        let order = h.service.get_order_by_code(&code).await.unwrap().unwrap();
        assert_eq!(order.total, 100);
        assert!(h.service.get_order_by_code("HD0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_orders_paginates_newest_first() {
        let h = Harness::new().await;
        let mut codes = Vec::new();
        for customer in ["KH1", "KH2", "KH1"] {
            codes.push(h.place(customer, &[("SP1", 1)]).await.unwrap());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let page = h.service.list_all_orders(1, 2).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].order_code, codes[2]);
        assert_eq!(page.items[0].customer_code, "KH1");
        assert_eq!(page.items[1].customer_name, "Tran Thi B");
        assert_eq!(page.items[1].status, OrderStatusKind::Placed);

        let last = h.service.list_all_orders(2, 2).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].order_code, codes[0]);

        let clamped = h.service.list_all_orders(0, 10_000).await.unwrap();
        assert_eq!((clamped.page, clamped.page_size), (1, DEFAULT_MAX_PAGE_SIZE));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_order() {
        let h = Harness::new().await;
        let service = OrderService::new(
            h.catalog.clone(),
            h.customers.clone(),
            Arc::new(FailingNotifier),
            Arc::new(Metrics::new().unwrap()),
        );

        let code = service.create_order(request("KH1", &[("SP1", 1)], "cash")).await.unwrap();
        assert_eq!(h.order("KH1", &code).await.status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn test_unacknowledged_cancel_leaves_stock_released() {
        let h = Harness::new().await;
        let code = h.place("KH1", &[("SP1", 3)]).await.unwrap();

        let service = OrderService::new(
            h.catalog.clone(),
            Arc::new(UnacknowledgedWrites(h.customers.clone())),
            Arc::new(FailingNotifier),
            Arc::new(Metrics::new().unwrap()),
        );

        let err = service.cancel_order("KH1", &code, "changed my mind").await.unwrap_err();
        assert!(matches!(err, OrderError::NotPersisted(ref c) if c == "KH1"));

        // stock was already given back while the order still reads Placed
        assert_eq!(h.stock("SP1").await, (10, 0));
        assert_eq!(h.order("KH1", &code).await.status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn test_unacknowledged_create_is_reported() {
        let h = Harness::new().await;
        let service = OrderService::new(
            h.catalog.clone(),
            Arc::new(UnacknowledgedWrites(h.customers.clone())),
            Arc::new(FailingNotifier),
            Arc::new(Metrics::new().unwrap()),
        );

        let err = service.create_order(request("KH1", &[("SP1", 1)], "cash")).await.unwrap_err();
        assert!(matches!(err, OrderError::NotPersisted(_)));
    }
}
