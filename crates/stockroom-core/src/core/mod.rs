// crates/stockroom-core/src/core/mod.rs
// ============================================================================
// Module: Stockroom Core Types
// Description: Values, schema metadata, records, and structured errors.
// Purpose: Provide the shared data model for every engine.
// Dependencies: crate::core::{error, record, schema, transaction, value}
// ============================================================================

//! ## Overview
//! Shared data model: tagged column values, the immutable schema descriptor,
//! storage rows, request records, transaction kinds, and structured error
//! values.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod record;
pub mod schema;
pub mod transaction;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ErrorKind;
pub use error::InventoryError;
pub use error::InventoryResult;
pub use record::RequestRecord;
pub use record::Row;
pub use schema::ColumnSchema;
pub use schema::SchemaDescriptor;
pub use schema::SchemaError;
pub use schema::Table;
pub use schema::TableSchema;
pub use transaction::ADMIN_CLIENT_ID;
pub use transaction::ADMIN_NAME;
pub use transaction::TransactionKind;
pub use value::ColumnType;
pub use value::ColumnValue;
