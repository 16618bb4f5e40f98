// crates/stockroom-core/src/lib.rs
// ============================================================================
// Module: Stockroom Core Library
// Description: Tabular query engine and batch reconciliation for inventory.
// Purpose: Provide storage-agnostic inventory operations.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Stockroom Core holds everything between the HTTP surface and storage:
//! typed column values and table layouts, request validation, the filter and
//! order engine over fetched rows, write-batch reconciliation, and the
//! [`InventoryService`] that ties them to an [`InventoryStore`].
//! Invariants:
//! - Filtering and ordering run in memory over rows fetched in storage order.
//! - Sorting is stable; ties keep their incoming order.
//! - A write request produces at most one mutation batch, applied atomically.
//! - Row identifiers and the transaction log are written only by stores.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod query;
pub mod reconcile;
pub mod runtime;
pub mod validate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::ColumnType;
pub use crate::core::ColumnValue;
pub use crate::core::ErrorKind;
pub use crate::core::InventoryError;
pub use crate::core::InventoryResult;
pub use crate::core::RequestRecord;
pub use crate::core::Row;
pub use crate::core::SchemaDescriptor;
pub use crate::core::SchemaError;
pub use crate::core::Table;
pub use crate::core::TableSchema;
pub use crate::core::TransactionKind;
pub use interfaces::InventoryStore;
pub use interfaces::Mutation;
pub use interfaces::MutationBatch;
pub use interfaces::StoreError;
pub use runtime::InMemoryInventoryStore;
pub use runtime::InventoryService;
pub use runtime::Operation;
pub use runtime::ResponseStatus;
pub use runtime::ServiceError;
pub use runtime::ServiceResponse;
