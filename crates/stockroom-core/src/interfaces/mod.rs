// crates/stockroom-core/src/interfaces/mod.rs
// ============================================================================
// Module: Stockroom Interfaces
// Description: Persistence boundary consumed by the inventory service.
// Purpose: Define row fetches and atomic mutation batches backend-agnostically.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The service never issues queries itself. It reads rows through
//! [`InventoryStore`] with simple equality and membership lookups, reconciles
//! them in memory, and hands back a [`MutationBatch`] for the backend to
//! apply atomically.
//!
//! Security posture: request values reach backends only as bound parameters;
//! implementations must not interpolate names into query text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::Row;
use crate::core::SchemaDescriptor;
use crate::core::Table;
use crate::core::TransactionKind;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Inventory store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend I/O failure.
    #[error("inventory store io error: {0}")]
    Io(String),
    /// Stored data is malformed.
    #[error("inventory store invalid data: {0}")]
    Invalid(String),
    /// A mutation violated a uniqueness or reference constraint.
    #[error("inventory store constraint violation: {0}")]
    Constraint(String),
    /// Other backend failure.
    #[error("inventory store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Mutation Intents
// ============================================================================

/// One row-level mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a product.
    InsertProduct {
        /// Product name.
        name: String,
        /// Initial stock quantity.
        quantity: i64,
    },
    /// Delete a product by identifier.
    DeleteProduct {
        /// Product identifier.
        id: i64,
    },
    /// Rename a product.
    RenameProduct {
        /// Product identifier.
        id: i64,
        /// New product name.
        name: String,
    },
    /// Replace a product's stock quantity.
    SetProductQuantity {
        /// Product identifier.
        id: i64,
        /// New stock quantity.
        quantity: i64,
    },
    /// Insert a client.
    InsertClient {
        /// Client name.
        name: String,
    },
    /// Delete a client by identifier.
    DeleteClient {
        /// Client identifier.
        id: i64,
    },
    /// Rename a client.
    RenameClient {
        /// Client identifier.
        id: i64,
        /// New client name.
        name: String,
    },
}

/// Product reference on a transaction log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductRef {
    /// Existing product identifier.
    Id(i64),
    /// Product inserted in the same batch, resolved by name after insertion.
    Named(String),
}

/// Append-only transaction log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Product the entry refers to.
    pub product: ProductRef,
    /// Product name at the time of the mutation.
    pub product_name: String,
    /// Quantity recorded for the mutation.
    pub quantity: i64,
    /// Acting client identifier (`0` for the administrator).
    pub client_id: i64,
    /// Acting client name.
    pub client_name: String,
    /// Mutation kind.
    pub kind: TransactionKind,
}

/// Mutations and log entries applied together.
///
/// # Invariants
/// - Backends apply every mutation and entry or none of them.
/// - Renames within one batch are applied as if simultaneous, so swaps
///   never collide on unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationBatch {
    /// Row mutations, applied in order (renames excepted).
    pub mutations: Vec<Mutation>,
    /// Log entries, appended after the mutations.
    pub transactions: Vec<TransactionEntry>,
}

impl MutationBatch {
    /// Returns true when the batch carries nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty() && self.transactions.is_empty()
    }
}

// ============================================================================
// SECTION: Inventory Store
// ============================================================================

/// Persistence collaborator for inventory tables.
pub trait InventoryStore: Send + Sync {
    /// Returns the schema descriptor fixed at startup.
    fn schema(&self) -> &SchemaDescriptor;

    /// Fetches every row of a table in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn fetch_all(&self, table: Table) -> Result<Vec<Row>, StoreError>;

    /// Fetches rows of a named table whose `name` is in `names`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails or the table has no names.
    fn fetch_by_names(&self, table: Table, names: &[String]) -> Result<Vec<Row>, StoreError>;

    /// Fetches transaction log rows recorded for a client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn transactions_for_client(&self, client_id: i64) -> Result<Vec<Row>, StoreError>;

    /// Applies a mutation batch atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when any mutation fails; nothing is applied.
    fn apply(&self, batch: &MutationBatch) -> Result<(), StoreError>;

    /// Fetches one client row by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn client_by_name(&self, name: &str) -> Result<Option<Row>, StoreError> {
        Ok(self.fetch_by_names(Table::Clients, &[name.to_string()])?.into_iter().next())
    }
}
