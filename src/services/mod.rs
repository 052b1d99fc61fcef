// ============================================================================
// Application Services
// ============================================================================
//
// Orchestrate: load document -> validate against the domain -> adjust stock
// -> write the document back. Each call is independent; the only
// concurrency guarantee comes from the store's conditional stock update.
//
// ============================================================================

pub mod codes;
pub mod pagination;
pub mod order_service;
pub mod inventory_service;

pub use codes::CodeGenerator;
pub use pagination::{Page, PageRequest};
pub use order_service::*;
pub use inventory_service::*;
