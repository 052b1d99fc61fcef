// ============================================================================
// Customer Domain
// ============================================================================
//
// A customer document exclusively owns its orders (and, for admins, the
// stock import invoices they recorded). Nothing else references an order
// except by copying its code.
//
// ============================================================================

pub mod value_objects;

pub use value_objects::*;
