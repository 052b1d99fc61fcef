use super::value_objects::OrderStatusKind;

// ============================================================================
// Order Commands - Represent user intent against an existing order
// ============================================================================
//
// Placing an order needs the catalog, so it lives in the order service;
// these are the transitions applied to an order that already exists.
//

#[derive(Debug, Clone)]
pub enum OrderCommand {
    /// Customer acknowledges delivery. Guarded: Shipping -> Completed.
    ConfirmReceived,
    /// Customer cancels. Guarded: Placed -> Cancelled.
    Cancel { reason: String },
    /// Administrative override, applied without transition checks.
    OverrideStatus { status: OrderStatusKind },
}
