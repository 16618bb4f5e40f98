// crates/stockroom-server/src/lib.rs
// ============================================================================
// Module: Stockroom Server
// Description: HTTP surface for the Stockroom inventory service.
// Purpose: Expose inventory operations over axum with request auditing.
// Dependencies: stockroom-core, stockroom-config, stockroom-store-sqlite, axum
// ============================================================================

//! ## Overview
//! Stockroom Server mounts each inventory operation at its HTTP route and
//! records one audit event per request. All domain logic lives in
//! [`stockroom_core::InventoryService`]; this crate only decodes, dispatches,
//! and encodes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::InventoryAuditEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use server::HttpReply;
pub use server::InventoryServer;
pub use server::ServerError;
pub use server::ServerState;
pub use server::dispatch;
pub use server::router;
