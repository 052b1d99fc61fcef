// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::domain::order::OrderStatusKind;

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the order engine
// ============================================================================
//
// Covers:
// - Order creation outcomes (by failure reason)
// - Status transitions, split into guarded (customer) and admin overrides
// - Stock reservations and releases
// - Notification failures
// - Per-operation latency
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub order_creation_failed: IntCounterVec,
    pub orders_cancelled: IntCounter,
    pub status_transitions: IntCounterVec,
    pub stock_adjustments: IntCounterVec,
    pub notification_failures: IntCounter,
    pub operation_duration: HistogramVec,
}

/// Whether a transition went through the guarded table or the admin
/// override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Guarded,
    Admin,
}

impl TransitionKind {
    fn label(&self) -> &'static str {
        match self {
            TransitionKind::Guarded => "guarded",
            TransitionKind::Admin => "admin",
        }
    }
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders placed")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_creation_failed = IntCounterVec::new(
            Opts::new("order_creation_failed_total", "Order creations rejected or failed"),
            &["reason"],
        )?;
        registry.register(Box::new(order_creation_failed.clone()))?;

        let orders_cancelled = IntCounter::new("orders_cancelled_total", "Total orders cancelled by customers")?;
        registry.register(Box::new(orders_cancelled.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions"),
            &["from", "to", "kind"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let stock_adjustments = IntCounterVec::new(
            Opts::new("stock_adjustments_total", "Stock adjustments by direction and outcome"),
            &["direction", "outcome"],
        )?;
        registry.register(Box::new(stock_adjustments.clone()))?;

        let notification_failures = IntCounter::new(
            "notification_failures_total",
            "Order confirmations that could not be handed off",
        )?;
        registry.register(Box::new(notification_failures.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("order_operation_duration_seconds", "Order engine operation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_creation_failed,
            orders_cancelled,
            status_transitions,
            stock_adjustments,
            notification_failures,
            operation_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_creation_failure(&self, reason: &str) {
        self.order_creation_failed.with_label_values(&[reason]).inc();
    }

    pub fn record_cancellation(&self) {
        self.orders_cancelled.inc();
    }

    pub fn record_transition(&self, from: OrderStatusKind, to: OrderStatusKind, kind: TransitionKind) {
        self.status_transitions
            .with_label_values(&[from.name(), to.name(), kind.label()])
            .inc();
    }

    /// `delta > 0` is a reservation, anything else a release.
    pub fn record_stock_adjustment(&self, delta: i32, applied: bool) {
        let direction = if delta > 0 { "reserve" } else { "release" };
        let outcome = if applied { "applied" } else { "rejected" };
        self.stock_adjustments.with_label_values(&[direction, outcome]).inc();
    }

    pub fn record_notification_failure(&self) {
        self.notification_failures.inc();
    }

    pub fn observe_duration(&self, operation: &str, duration_secs: f64) {
        self.operation_duration.with_label_values(&[operation]).observe(duration_secs);
    }
}
