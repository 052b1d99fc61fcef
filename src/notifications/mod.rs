// ============================================================================
// Order Notifications
// ============================================================================
//
// Order confirmations are fire-and-forget: the order service hands a
// snapshot to an `OrderNotifier` on a background task and only logs
// failures. A failed notification never affects the order.
//
// ============================================================================

mod outbox;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::domain::order::Order;

pub use outbox::OutboxNotifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationLine {
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
}

/// Everything the confirmation email template needs, frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub customer_name: String,
    pub customer_email: String,
    pub phone_number: String,
    pub shipping_address: String,
    pub order_code: String,
    pub order_date: String,
    pub items: Vec<ConfirmationLine>,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub tax: i64,
    pub total: i64,
    pub status: String,
}

impl OrderConfirmation {
    pub fn new(customer: &Customer, order: &Order) -> Self {
        Self {
            customer_name: customer.full_name.clone(),
            customer_email: customer.email.clone(),
            phone_number: customer.phone.clone(),
            shipping_address: customer.address.clone(),
            order_code: order.code.clone(),
            order_date: order.created_at.format("%d/%m/%Y %H:%M").to_string(),
            items: order
                .items
                .iter()
                .map(|item| ConfirmationLine {
                    product_name: item.book_name.clone(),
                    quantity: item.quantity,
                    price: item.unit_price,
                    subtotal: item.line_total,
                })
                .collect(),
            subtotal: order.total,
            shipping_fee: 0,
            tax: 0,
            total: order.total,
            status: order.status.kind().token().to_string(),
        }
    }
}

#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send_order_confirmation(
        &self,
        to_address: &str,
        to_name: &str,
        confirmation: &OrderConfirmation,
    ) -> Result<()>;
}

/// Writes the confirmation to the log and nothing else.
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn send_order_confirmation(
        &self,
        to_address: &str,
        to_name: &str,
        confirmation: &OrderConfirmation,
    ) -> Result<()> {
        tracing::info!(
            to = %to_address,
            name = %to_name,
            order_code = %confirmation.order_code,
            total = confirmation.total,
            "📧 Order confirmation"
        );
        Ok(())
    }
}
