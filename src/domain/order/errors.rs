use super::value_objects::OrderStatusKind;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order has no items")]
    EmptyItems,

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Invalid quantity for {book_code}: {quantity}")]
    InvalidQuantity { book_code: String, quantity: i32 },

    #[error("Invalid payment method '{0}'. Use 'TienMat' or 'ChuyenKhoan'")]
    InvalidPaymentMethod(String),

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("A reason is required to cancel an order")]
    MissingCancelReason,

    #[error("Cannot cancel an order that is being delivered")]
    CannotCancelShipping,

    #[error("Cannot cancel an order that has been completed")]
    CannotCancelCompleted,

    #[error("Order has already been cancelled")]
    AlreadyCancelled,

    #[error("Order can only be confirmed as received while shipping (current status: {0})")]
    NotShipping(OrderStatusKind),

    #[error("Order changes for customer {0} were not persisted")]
    NotPersisted(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl OrderError {
    /// Short label used for metrics.
    pub fn reason_label(&self) -> &'static str {
        match self {
            OrderError::CustomerNotFound(_) => "customer_not_found",
            OrderError::OrderNotFound(_) => "order_not_found",
            OrderError::EmptyItems => "empty_items",
            OrderError::BookNotFound(_) => "book_not_found",
            OrderError::InvalidQuantity { .. } => "invalid_quantity",
            OrderError::InvalidPaymentMethod(_) => "invalid_payment_method",
            OrderError::InvalidStatus(_) => "invalid_status",
            OrderError::InsufficientStock(_) => "insufficient_stock",
            OrderError::MissingCancelReason => "missing_cancel_reason",
            OrderError::CannotCancelShipping
            | OrderError::CannotCancelCompleted
            | OrderError::AlreadyCancelled
            | OrderError::NotShipping(_) => "invalid_transition",
            OrderError::NotPersisted(_) => "not_persisted",
            OrderError::Storage(_) => "storage",
        }
    }

    /// True for errors raised before anything was written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::CustomerNotFound(_)
                | OrderError::OrderNotFound(_)
                | OrderError::EmptyItems
                | OrderError::BookNotFound(_)
                | OrderError::InvalidQuantity { .. }
                | OrderError::InvalidPaymentMethod(_)
                | OrderError::InvalidStatus(_)
                | OrderError::MissingCancelReason
        )
    }
}
