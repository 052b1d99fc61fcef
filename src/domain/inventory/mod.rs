// ============================================================================
// Inventory Domain - stock import invoices recorded by admins
// ============================================================================

pub mod value_objects;
pub mod errors;

pub use value_objects::*;
pub use errors::*;
