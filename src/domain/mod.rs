// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each area has its own subdirectory:
// - order:     order lifecycle, payment methods, status state machine
// - customer:  the customer document that owns its orders
// - book:      catalog entity with stock/sold counters
// - inventory: stock import invoices
//
// Nothing in here talks to a database; persistence lives in `crate::store`.
//
// ============================================================================

pub mod order;
pub mod customer;
pub mod book;
pub mod inventory;
