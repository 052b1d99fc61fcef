#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Admin not found: {0}")]
    AdminNotFound(String),

    #[error("Import has no items")]
    EmptyItems,

    #[error("Book {0} not found")]
    BookNotFound(String),

    #[error("Quantity for book {book_code} must be > 0 (got {quantity})")]
    InvalidQuantity { book_code: String, quantity: i32 },

    #[error("Unit price for book {book_code} must be >= 0 (got {unit_price})")]
    InvalidUnitPrice { book_code: String, unit_price: i64 },

    #[error("Import totals exceed the supported range")]
    TotalsOverflow,

    #[error("Failed to save import invoice for {0}")]
    NotPersisted(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
