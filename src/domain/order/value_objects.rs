use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::book::Book;
use super::errors::OrderError;
use super::payment::PaymentMethod;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Reason recorded when an administrator forces an order into `Cancelled`
/// through the status override.
pub const ADMIN_CANCEL_REASON: &str = "Cancelled by administrator";

/// One book line inside an order. Name and price are copied from the
/// catalog when the order is placed and never refreshed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub book_code: String,
    pub book_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

impl OrderItem {
    pub fn snapshot(book: &Book, quantity: i32) -> Self {
        Self {
            book_code: book.code.clone(),
            book_name: book.name.clone(),
            quantity,
            unit_price: book.price,
            line_total: book.price * i64::from(quantity),
        }
    }
}

/// Order status as a sum type: only the terminal states carry a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderStatus {
    Placed,
    Shipping,
    Completed { at: DateTime<Utc> },
    Cancelled { at: DateTime<Utc>, reason: String },
}

impl OrderStatus {
    pub fn kind(&self) -> OrderStatusKind {
        match self {
            OrderStatus::Placed => OrderStatusKind::Placed,
            OrderStatus::Shipping => OrderStatusKind::Shipping,
            OrderStatus::Completed { .. } => OrderStatusKind::Completed,
            OrderStatus::Cancelled { .. } => OrderStatusKind::Cancelled,
        }
    }

    /// Time of the terminal transition (completion or cancellation).
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match self {
            OrderStatus::Completed { at } | OrderStatus::Cancelled { at, .. } => Some(*at),
            _ => None,
        }
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        match self {
            OrderStatus::Cancelled { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Payload-free status tag. This is what admins name in a status override
/// and what gets stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatusKind {
    #[serde(rename = "DaDatHang")]
    Placed,
    #[serde(rename = "DangGiao")]
    Shipping,
    #[serde(rename = "HoanThanh")]
    Completed,
    #[serde(rename = "DaHuy")]
    Cancelled,
}

impl OrderStatusKind {
    pub const ALL: [OrderStatusKind; 4] = [
        OrderStatusKind::Placed,
        OrderStatusKind::Shipping,
        OrderStatusKind::Completed,
        OrderStatusKind::Cancelled,
    ];

    /// Token used in persisted documents.
    pub fn token(&self) -> &'static str {
        match self {
            OrderStatusKind::Placed => "DaDatHang",
            OrderStatusKind::Shipping => "DangGiao",
            OrderStatusKind::Completed => "HoanThanh",
            OrderStatusKind::Cancelled => "DaHuy",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrderStatusKind::Placed => "Placed",
            OrderStatusKind::Shipping => "Shipping",
            OrderStatusKind::Completed => "Completed",
            OrderStatusKind::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OrderStatusKind {
    type Err = OrderError;

    /// Accepts the English names (any case) and the stored tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.token() == trimmed || kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

/// An order embedded in its owning customer's document.
///
/// On disk the status is flattened back into `status`, `cancel_reason` and
/// `completed_at` so existing documents keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OrderRecord", into = "OrderRecord")]
pub struct Order {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub total: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItem>,
}

#[derive(Serialize, Deserialize)]
struct OrderRecord {
    code: String,
    created_at: DateTime<Utc>,
    total: i64,
    status: OrderStatusKind,
    payment_method: PaymentMethod,
    #[serde(default)]
    items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancel_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderRecord {
    fn from(order: Order) -> Self {
        let kind = order.status.kind();
        let completed_at = order.status.finished_at();
        let cancel_reason = order.status.cancel_reason().map(str::to_string);

        Self {
            code: order.code,
            created_at: order.created_at,
            total: order.total,
            status: kind,
            payment_method: order.payment_method,
            items: order.items,
            cancel_reason,
            completed_at,
        }
    }
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        // Older documents flipped to a terminal status by hand may lack the
        // timestamp or reason; fall back to creation time / empty reason.
        let at = record.completed_at.unwrap_or(record.created_at);
        let status = match record.status {
            OrderStatusKind::Placed => OrderStatus::Placed,
            OrderStatusKind::Shipping => OrderStatus::Shipping,
            OrderStatusKind::Completed => OrderStatus::Completed { at },
            OrderStatusKind::Cancelled => OrderStatus::Cancelled {
                at,
                reason: record.cancel_reason.unwrap_or_default(),
            },
        };

        Self {
            code: record.code,
            created_at: record.created_at,
            total: record.total,
            status,
            payment_method: record.payment_method,
            items: record.items,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
