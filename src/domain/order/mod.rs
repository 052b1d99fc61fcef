// ============================================================================
// Order Domain - Business Logic for Orders
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Order, OrderItem, OrderStatus)
// - Payment method normalization
// - Commands (ConfirmReceived, Cancel, OverrideStatus)
// - Events (ReceiptConfirmed, Cancelled, StatusOverridden)
// - Errors (OrderError enum)
// - Aggregate (state machine and transition guards)
//
// ============================================================================

pub mod value_objects;
pub mod payment;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;

// Re-export for convenience
pub use value_objects::*;
pub use payment::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
