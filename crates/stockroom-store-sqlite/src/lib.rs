// crates/stockroom-store-sqlite/src/lib.rs
// ============================================================================
// Module: Stockroom SQLite Store Library
// Description: SQLite-backed InventoryStore.
// Purpose: Persist products, clients, and the transaction log durably.
// Dependencies: stockroom-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteInventoryStore`] creates the inventory tables on first open,
//! builds the schema descriptor from `PRAGMA table_info`, and applies each
//! mutation batch inside one `SQLite` transaction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteInventoryStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
