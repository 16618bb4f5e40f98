// crates/stockroom-core/src/runtime/store.rs
// ============================================================================
// Module: Stockroom In-Memory Store
// Description: Mutex-guarded inventory tables for tests and local runs.
// Purpose: Provide a deterministic InventoryStore without external deps.
// Dependencies: crate::core, crate::interfaces, time
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`InventoryStore`]
//! over the canonical table layouts. Batches are applied to a copy of the
//! tables and swapped in only when every mutation and uniqueness check
//! succeeds, so a failed batch leaves no trace. Row identifiers come from
//! per-table counters, so an identifier freed by a delete is never issued
//! again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use time::OffsetDateTime;

use crate::core::ColumnValue;
use crate::core::Row;
use crate::core::SchemaDescriptor;
use crate::core::SchemaError;
use crate::core::Table;
use crate::core::TransactionKind;
use crate::interfaces::InventoryStore;
use crate::interfaces::Mutation;
use crate::interfaces::MutationBatch;
use crate::interfaces::ProductRef;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Table Contents
// ============================================================================

/// Stored product fields.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProductEntry {
    /// Unique product name.
    name: String,
    /// Stock quantity.
    quantity: i64,
}

/// Stored transaction log fields.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogEntry {
    /// Log entry identifier.
    transaction_id: i64,
    /// Date the entry was recorded (`YYYY-MM-DD`).
    date: String,
    /// Product identifier, when it resolved.
    product_id: Option<i64>,
    /// Product name at the time of the mutation.
    product_name: String,
    /// Recorded quantity.
    quantity: i64,
    /// Acting client identifier.
    client_id: i64,
    /// Acting client name.
    client_name: String,
    /// Mutation kind.
    kind: TransactionKind,
}

/// All inventory tables.
#[derive(Debug, Clone, Default)]
struct Tables {
    /// Products keyed by identifier.
    products: BTreeMap<i64, ProductEntry>,
    /// Client names keyed by identifier.
    clients: BTreeMap<i64, String>,
    /// Append-only transaction log.
    transactions: Vec<LogEntry>,
    /// Last product identifier issued; never lowered by deletes.
    last_product_id: i64,
    /// Last client identifier issued; never lowered by deletes.
    last_client_id: i64,
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory inventory store for tests and local runs.
#[derive(Debug, Clone)]
pub struct InMemoryInventoryStore {
    /// Canonical schema descriptor.
    schema: SchemaDescriptor,
    /// Table contents protected by a mutex.
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryInventoryStore {
    /// Creates an empty store over the canonical schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the canonical layouts fail validation.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: SchemaDescriptor::canonical()?,
            tables: Arc::new(Mutex::new(Tables::default())),
        })
    }

    /// Locks the tables.
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Store("inventory store mutex poisoned".to_string()))
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    fn fetch_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        let tables = self.lock()?;
        Ok(match table {
            Table::Products => tables.products.iter().map(product_row).collect(),
            Table::Clients => tables.clients.iter().map(client_row).collect(),
            Table::Transactions => tables.transactions.iter().map(log_row).collect(),
        })
    }

    fn fetch_by_names(&self, table: Table, names: &[String]) -> Result<Vec<Row>, StoreError> {
        let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        let tables = self.lock()?;
        match table {
            Table::Products => Ok(tables
                .products
                .iter()
                .filter(|(_, product)| wanted.contains(product.name.as_str()))
                .map(product_row)
                .collect()),
            Table::Clients => Ok(tables
                .clients
                .iter()
                .filter(|(_, name)| wanted.contains(name.as_str()))
                .map(client_row)
                .collect()),
            Table::Transactions => {
                Err(StoreError::Invalid("transactions table has no name column".to_string()))
            }
        }
    }

    fn transactions_for_client(&self, client_id: i64) -> Result<Vec<Row>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .transactions
            .iter()
            .filter(|entry| entry.client_id == client_id)
            .map(log_row)
            .collect())
    }

    fn apply(&self, batch: &MutationBatch) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        for mutation in &batch.mutations {
            apply_mutation(&mut next, mutation);
        }
        ensure_unique(next.products.values().map(|product| product.name.as_str()), "products")?;
        ensure_unique(next.clients.values().map(String::as_str), "clients")?;

        let date = OffsetDateTime::now_utc().date().to_string();
        for entry in &batch.transactions {
            let product_id = match &entry.product {
                ProductRef::Id(id) => Some(*id),
                ProductRef::Named(name) => next
                    .products
                    .iter()
                    .find(|(_, product)| &product.name == name)
                    .map(|(id, _)| *id),
            };
            let transaction_id = next.transactions.last().map_or(1, |last| last.transaction_id + 1);
            next.transactions.push(LogEntry {
                transaction_id,
                date: date.clone(),
                product_id,
                product_name: entry.product_name.clone(),
                quantity: entry.quantity,
                client_id: entry.client_id,
                client_name: entry.client_name.clone(),
                kind: entry.kind,
            });
        }
        *guard = next;
        drop(guard);
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Applies one mutation; updates and deletes of missing rows are no-ops.
fn apply_mutation(tables: &mut Tables, mutation: &Mutation) {
    match mutation {
        Mutation::InsertProduct {
            name,
            quantity,
        } => {
            let id = issue_id(&mut tables.last_product_id);
            tables.products.insert(id, ProductEntry {
                name: name.clone(),
                quantity: *quantity,
            });
        }
        Mutation::DeleteProduct {
            id,
        } => {
            tables.products.remove(id);
        }
        Mutation::RenameProduct {
            id,
            name,
        } => {
            if let Some(product) = tables.products.get_mut(id) {
                product.name.clone_from(name);
            }
        }
        Mutation::SetProductQuantity {
            id,
            quantity,
        } => {
            if let Some(product) = tables.products.get_mut(id) {
                product.quantity = *quantity;
            }
        }
        Mutation::InsertClient {
            name,
        } => {
            let id = issue_id(&mut tables.last_client_id);
            tables.clients.insert(id, name.clone());
        }
        Mutation::DeleteClient {
            id,
        } => {
            tables.clients.remove(id);
        }
        Mutation::RenameClient {
            id,
            name,
        } => {
            if let Some(client) = tables.clients.get_mut(id) {
                client.clone_from(name);
            }
        }
    }
}

/// Issues the next identifier from a counter; deleted identifiers are not reused.
fn issue_id(last: &mut i64) -> i64 {
    *last = last.saturating_add(1);
    *last
}

/// Fails when a name appears twice.
fn ensure_unique<'a>(
    names: impl Iterator<Item = &'a str>,
    table: &str,
) -> Result<(), StoreError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(StoreError::Constraint(format!("{table}.name must be unique: {name}")));
        }
    }
    Ok(())
}

/// Builds a products row.
fn product_row((id, product): (&i64, &ProductEntry)) -> Row {
    Row::new(vec![
        ColumnValue::Integer(*id),
        ColumnValue::text(product.name.as_str()),
        ColumnValue::Integer(product.quantity),
    ])
}

/// Builds a clients row.
fn client_row((id, name): (&i64, &String)) -> Row {
    Row::new(vec![ColumnValue::Integer(*id), ColumnValue::text(name.as_str())])
}

/// Builds a transactions row.
fn log_row(entry: &LogEntry) -> Row {
    Row::new(vec![
        ColumnValue::Integer(entry.transaction_id),
        ColumnValue::text(entry.date.as_str()),
        entry.product_id.map_or(ColumnValue::Null, ColumnValue::Integer),
        ColumnValue::text(entry.product_name.as_str()),
        ColumnValue::Integer(entry.quantity),
        ColumnValue::Integer(entry.client_id),
        ColumnValue::text(entry.client_name.as_str()),
        ColumnValue::text(entry.kind.as_str()),
    ])
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::InMemoryInventoryStore;
    use crate::core::ColumnValue;
    use crate::core::Table;
    use crate::interfaces::InventoryStore;
    use crate::interfaces::Mutation;
    use crate::interfaces::MutationBatch;
    use crate::interfaces::StoreError;

    fn seed(store: &InMemoryInventoryStore, names: &[&str]) {
        let batch = MutationBatch {
            mutations: names
                .iter()
                .map(|name| Mutation::InsertProduct {
                    name: (*name).to_string(),
                    quantity: 5,
                })
                .collect(),
            transactions: Vec::new(),
        };
        store.apply(&batch).unwrap();
    }

    #[test]
    fn renames_in_one_batch_may_swap() {
        let store = InMemoryInventoryStore::new().unwrap();
        seed(&store, &["a", "b"]);
        let swap = MutationBatch {
            mutations: vec![
                Mutation::RenameProduct {
                    id: 1,
                    name: "b".to_string(),
                },
                Mutation::RenameProduct {
                    id: 2,
                    name: "a".to_string(),
                },
            ],
            transactions: Vec::new(),
        };
        store.apply(&swap).unwrap();
        let rows = store.fetch_by_names(Table::Products, &["a".to_string()]).unwrap();
        assert_eq!(rows.first().map(|row| row.value(0).clone()), Some(ColumnValue::Integer(2)));
    }

    #[test]
    fn failed_batch_leaves_tables_untouched() {
        let store = InMemoryInventoryStore::new().unwrap();
        seed(&store, &["a"]);
        let clash = MutationBatch {
            mutations: vec![
                Mutation::SetProductQuantity {
                    id: 1,
                    quantity: 99,
                },
                Mutation::InsertProduct {
                    name: "a".to_string(),
                    quantity: 2,
                },
            ],
            transactions: Vec::new(),
        };
        assert!(matches!(store.apply(&clash), Err(StoreError::Constraint(_))));
        let rows = store.fetch_all(Table::Products).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value(2), &ColumnValue::Integer(5));
    }

    #[test]
    fn deleted_identifiers_are_not_reissued() {
        let store = InMemoryInventoryStore::new().unwrap();
        seed(&store, &["a", "b"]);
        let remove = MutationBatch {
            mutations: vec![
                Mutation::DeleteProduct {
                    id: 2,
                },
                Mutation::InsertClient {
                    name: "amy".to_string(),
                },
                Mutation::DeleteClient {
                    id: 1,
                },
            ],
            transactions: Vec::new(),
        };
        store.apply(&remove).unwrap();
        seed(&store, &["c"]);
        store
            .apply(&MutationBatch {
                mutations: vec![Mutation::InsertClient {
                    name: "bob".to_string(),
                }],
                transactions: Vec::new(),
            })
            .unwrap();

        let products = store.fetch_by_names(Table::Products, &["c".to_string()]).unwrap();
        assert_eq!(products[0].value(0), &ColumnValue::Integer(3));
        let clients = store.fetch_all(Table::Clients).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].value(0), &ColumnValue::Integer(2));
    }
}
