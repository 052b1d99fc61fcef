use chrono::{DateTime, Utc};

use super::value_objects::{Order, OrderItem, OrderStatus, OrderStatusKind, ADMIN_CANCEL_REASON};
use super::payment::PaymentMethod;
use super::events::*;
use super::commands::OrderCommand;
use super::errors::OrderError;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Customer-facing transitions go through `check_guarded_transition`:
//
//   Placed   --[Cancel]-->          Cancelled (terminal)
//   Shipping --[ConfirmReceived]--> Completed (terminal)
//
// `OverrideStatus` is the admin escape hatch and is never checked.
//
// ============================================================================

/// Transition table for customer-driven commands. Each rejected source
/// state maps to its own error.
pub fn check_guarded_transition(
    from: OrderStatusKind,
    to: OrderStatusKind,
) -> Result<(), OrderError> {
    use OrderStatusKind::*;

    match (from, to) {
        (Placed, Cancelled) => Ok(()),
        (Shipping, Cancelled) => Err(OrderError::CannotCancelShipping),
        (Completed, Cancelled) => Err(OrderError::CannotCancelCompleted),
        (Cancelled, Cancelled) => Err(OrderError::AlreadyCancelled),

        (Shipping, Completed) => Ok(()),
        (other, Completed) => Err(OrderError::NotShipping(other)),

        (_, target) => Err(OrderError::InvalidStatus(target.name().to_string())),
    }
}

impl Order {
    /// Build a freshly placed order. The total is fixed here and never
    /// recomputed.
    pub fn place(
        code: String,
        created_at: DateTime<Utc>,
        payment_method: PaymentMethod,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in &items {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidQuantity {
                    book_code: item.book_code.clone(),
                    quantity: item.quantity,
                });
            }
        }

        let total = items.iter().map(|item| item.line_total).sum();

        Ok(Self {
            code,
            created_at,
            total,
            status: OrderStatus::Placed,
            payment_method,
            items,
        })
    }

    /// `Total == sum(line totals)` and `line_total == quantity * unit_price`.
    pub fn totals_reconcile(&self) -> bool {
        let lines_ok = self
            .items
            .iter()
            .all(|item| item.line_total == item.unit_price * i64::from(item.quantity));
        let sum: i64 = self.items.iter().map(|item| item.line_total).sum();
        lines_ok && sum == self.total
    }

    /// Validate a command against the current state and emit events.
    /// Nothing is mutated here.
    pub fn handle_command(
        &self,
        command: &OrderCommand,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let current = self.status.kind();

        match command {
            OrderCommand::ConfirmReceived => {
                check_guarded_transition(current, OrderStatusKind::Completed)?;

                Ok(vec![OrderEvent::ReceiptConfirmed(OrderReceiptConfirmed {
                    completed_at: now,
                })])
            }

            OrderCommand::Cancel { reason } => {
                if reason.trim().is_empty() {
                    return Err(OrderError::MissingCancelReason);
                }
                check_guarded_transition(current, OrderStatusKind::Cancelled)?;

                Ok(vec![OrderEvent::Cancelled(OrderCancelled {
                    reason: reason.clone(),
                    cancelled_at: now,
                })])
            }

            OrderCommand::OverrideStatus { status } => {
                Ok(vec![OrderEvent::StatusOverridden(OrderStatusOverridden {
                    from: current,
                    to: *status,
                    at: now,
                })])
            }
        }
    }

    pub fn apply_event(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::ReceiptConfirmed(e) => {
                self.status = OrderStatus::Completed { at: e.completed_at };
            }
            OrderEvent::Cancelled(e) => {
                self.status = OrderStatus::Cancelled {
                    at: e.cancelled_at,
                    reason: e.reason.clone(),
                };
            }
            OrderEvent::StatusOverridden(e) => {
                // Re-setting the same status keeps the original payload.
                if self.status.kind() == e.to {
                    return;
                }
                self.status = match e.to {
                    OrderStatusKind::Placed => OrderStatus::Placed,
                    OrderStatusKind::Shipping => OrderStatus::Shipping,
                    OrderStatusKind::Completed => OrderStatus::Completed { at: e.at },
                    OrderStatusKind::Cancelled => OrderStatus::Cancelled {
                        at: e.at,
                        reason: ADMIN_CANCEL_REASON.to_string(),
                    },
                };
            }
        }
    }

    /// handle_command + apply_event in one step.
    pub fn execute(
        &mut self,
        command: &OrderCommand,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let events = self.handle_command(command, now)?;
        for event in &events {
            self.apply_event(event);
        }
        Ok(events)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
