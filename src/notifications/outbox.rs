use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use scylla::client::session::Session;
use serde::Serialize;
use uuid::Uuid;

use super::{OrderConfirmation, OrderNotifier};

pub const CONFIRMATION_EVENT_TYPE: &str = "OrderConfirmationRequested";

#[derive(Serialize)]
struct ConfirmationPayload<'a> {
    to_address: &'a str,
    to_name: &'a str,
    confirmation: &'a OrderConfirmation,
}

/// Queues confirmations in `outbox_messages` for the mail relay to pick up.
pub struct OutboxNotifier {
    session: Arc<Session>,
}

impl OutboxNotifier {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl OrderNotifier for OutboxNotifier {
    async fn send_order_confirmation(
        &self,
        to_address: &str,
        to_name: &str,
        confirmation: &OrderConfirmation,
    ) -> Result<()> {
        let message_id = Uuid::new_v4();
        let payload = serde_json::to_string(&ConfirmationPayload {
            to_address,
            to_name,
            confirmation,
        })?;

        self.session
            .query_unpaged(
                "INSERT INTO outbox_messages (id, aggregate_id, event_type, payload, created_at) VALUES (?, ?, ?, ?, ?)",
                (
                    message_id,
                    &confirmation.order_code,
                    CONFIRMATION_EVENT_TYPE,
                    payload,
                    Utc::now(),
                ),
            )
            .await?;

        tracing::info!(
            order_code = %confirmation.order_code,
            message_id = %message_id,
            "✅ Order confirmation queued in outbox"
        );

        Ok(())
    }
}
