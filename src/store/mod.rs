// ============================================================================
// Persistence Layer
// ============================================================================
//
// The order engine only sees these two traits. There are no cross-document
// transactions: the only atomic primitive is the per-book conditional stock
// adjustment, and a customer's order list is always replaced as a whole.
//
// Implementations:
// - memory: process-local maps, used by tests and local demos
// - scylladb: production storage on ScyllaDB
//
// ============================================================================

pub mod memory;
pub mod scylladb;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::book::Book;
use crate::domain::customer::Customer;
use crate::domain::inventory::ImportInvoice;
use crate::domain::order::Order;

pub use memory::{InMemoryCatalog, InMemoryCustomers};
pub use scylladb::{ScyllaCatalog, ScyllaCustomers};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_by_code(&self, code: &str) -> Result<Option<Book>>;

    /// Atomically move `delta` units from `in_stock` to `sold`.
    ///
    /// Positive deltas only apply when `in_stock >= delta`; negative deltas
    /// return units. `Ok(false)` means nothing changed (insufficient stock
    /// or unknown book).
    async fn adjust_stock_and_sold(&self, code: &str, delta: i32) -> Result<bool>;

    /// Add received units to `in_stock` without touching `sold`.
    async fn increase_stock(&self, code: &str, quantity: i32) -> Result<bool>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get_by_code(&self, code: &str) -> Result<Option<Customer>>;

    async fn list_all(&self) -> Result<Vec<Customer>>;

    /// Replace the customer's whole embedded order list. No version check:
    /// a concurrent writer on the same customer can be overwritten.
    async fn replace_order_list(&self, code: &str, orders: &[Order]) -> Result<bool>;

    async fn push_import_invoice(&self, code: &str, invoice: &ImportInvoice) -> Result<bool>;
}
