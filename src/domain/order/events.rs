use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::value_objects::OrderStatusKind;

// ============================================================================
// Order Events - facts produced by order commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    ReceiptConfirmed(OrderReceiptConfirmed),
    Cancelled(OrderCancelled),
    StatusOverridden(OrderStatusOverridden),
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::ReceiptConfirmed(_) => "OrderReceiptConfirmed",
            OrderEvent::Cancelled(_) => "OrderCancelled",
            OrderEvent::StatusOverridden(_) => "OrderStatusOverridden",
        }
    }

    /// (from, to) status pair for this transition.
    pub fn transition(&self) -> (OrderStatusKind, OrderStatusKind) {
        match self {
            OrderEvent::ReceiptConfirmed(_) => (OrderStatusKind::Shipping, OrderStatusKind::Completed),
            OrderEvent::Cancelled(_) => (OrderStatusKind::Placed, OrderStatusKind::Cancelled),
            OrderEvent::StatusOverridden(e) => (e.from, e.to),
        }
    }
}

/// Order Receipt Confirmed - customer received the parcel
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderReceiptConfirmed {
    pub completed_at: DateTime<Utc>,
}

/// Order Cancelled - stock for every line is released
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCancelled {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// Order Status Overridden - admin forced a status
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderStatusOverridden {
    pub from: OrderStatusKind,
    pub to: OrderStatusKind,
    pub at: DateTime<Utc>,
}
