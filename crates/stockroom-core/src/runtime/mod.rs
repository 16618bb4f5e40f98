// crates/stockroom-core/src/runtime/mod.rs
// ============================================================================
// Module: Stockroom Runtime
// Description: Inventory service and the in-memory store.
// Purpose: Expose route-level operations over an InventoryStore.
// Dependencies: crate::{core, interfaces, query, reconcile}
// ============================================================================

//! ## Overview
//! [`InventoryService`] runs every route-level operation against an
//! [`crate::interfaces::InventoryStore`]. [`InMemoryInventoryStore`] backs
//! tests and local runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use service::InventoryService;
pub use service::Operation;
pub use service::Principal;
pub use service::ResponseStatus;
pub use service::ServiceError;
pub use service::ServiceResponse;
pub use service::request_records;
pub use service::verify_user;
pub use store::InMemoryInventoryStore;
