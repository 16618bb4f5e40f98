// crates/stockroom-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Inventory Store Unit Tests
// Description: Targeted tests for the SQLite inventory store.
// Purpose: Validate path safety, schema introspection, atomic batches, and
//          rename resolution.
// ============================================================================

//! ## Overview
//! Unit-level tests for `SQLite` store invariants:
//! - Path safety checks (directory rejection)
//! - Schema creation, introspection, and version checks
//! - Atomic batch application and constraint mapping
//! - Two-phase renames and named product resolution in the log
//! - Inventory service flows against a durable store

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use rusqlite::params;
use serde_json::Value;
use serde_json::json;
use stockroom_core::ColumnValue;
use stockroom_core::InventoryService;
use stockroom_core::InventoryStore;
use stockroom_core::Mutation;
use stockroom_core::MutationBatch;
use stockroom_core::Operation;
use stockroom_core::ResponseStatus;
use stockroom_core::SchemaDescriptor;
use stockroom_core::StoreError;
use stockroom_core::Table;
use stockroom_core::TransactionKind;
use stockroom_core::interfaces::ProductRef;
use stockroom_core::interfaces::TransactionEntry;
use stockroom_store_sqlite::SqliteInventoryStore;
use stockroom_store_sqlite::SqliteStoreConfig;
use stockroom_store_sqlite::SqliteStoreError;
use stockroom_store_sqlite::SqliteStoreMode;
use stockroom_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config(path: &Path) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Normal,
    }
}

fn open(dir: &TempDir) -> SqliteInventoryStore {
    SqliteInventoryStore::new(&config(&dir.path().join("inventory.db"))).expect("open store")
}

fn insert_products(store: &SqliteInventoryStore, names: &[(&str, i64)]) {
    let batch = MutationBatch {
        mutations: names
            .iter()
            .map(|(name, quantity)| Mutation::InsertProduct {
                name: (*name).to_string(),
                quantity: *quantity,
            })
            .collect(),
        transactions: Vec::new(),
    };
    store.apply(&batch).expect("insert products");
}

fn product_names(store: &SqliteInventoryStore) -> Vec<(i64, String)> {
    store
        .fetch_all(Table::Products)
        .unwrap()
        .iter()
        .map(|row| {
            (row.value(0).as_integer().unwrap(), row.value(1).as_text().unwrap().to_string())
        })
        .collect()
}

// ============================================================================
// SECTION: Open and Schema
// ============================================================================

#[test]
fn directory_paths_are_rejected() {
    let dir = TempDir::new().unwrap();
    let result = SqliteInventoryStore::new(&config(dir.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn introspected_schema_matches_canonical_layout() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert_eq!(store.schema(), &SchemaDescriptor::canonical().unwrap());
}

#[test]
fn newer_schema_versions_are_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inventory.db");
    drop(SqliteInventoryStore::new(&config(&path)).unwrap());
    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = ?1", params![99]).unwrap();
    drop(connection);
    let result = SqliteInventoryStore::new(&config(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    insert_products(&open(&dir), &[("pen", 5), ("ink", 4)]);
    let reopened = open(&dir);
    assert_eq!(product_names(&reopened), vec![(1, "pen".to_string()), (2, "ink".to_string())]);
}

// ============================================================================
// SECTION: Batches
// ============================================================================

#[test]
fn fetch_by_names_returns_only_requested_rows() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    insert_products(&store, &[("pen", 5), ("ink", 4), ("cap", 2)]);
    let rows =
        store.fetch_by_names(Table::Products, &["cap".to_string(), "pen".to_string()]).unwrap();
    let names: Vec<&str> = rows.iter().filter_map(|row| row.value(1).as_text()).collect();
    assert_eq!(names, vec!["pen", "cap"]);
    assert!(store.fetch_by_names(Table::Products, &[]).unwrap().is_empty());
}

#[test]
fn swapped_renames_apply_in_one_batch() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    insert_products(&store, &[("pen", 5), ("ink", 4)]);
    let swap = MutationBatch {
        mutations: vec![
            Mutation::RenameProduct {
                id: 1,
                name: "ink".to_string(),
            },
            Mutation::RenameProduct {
                id: 2,
                name: "pen".to_string(),
            },
        ],
        transactions: Vec::new(),
    };
    store.apply(&swap).unwrap();
    assert_eq!(product_names(&store), vec![(1, "ink".to_string()), (2, "pen".to_string())]);
}

#[test]
fn constraint_violations_roll_back_the_batch() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    insert_products(&store, &[("pen", 5)]);
    let clash = MutationBatch {
        mutations: vec![
            Mutation::SetProductQuantity {
                id: 1,
                quantity: 99,
            },
            Mutation::InsertProduct {
                name: "pen".to_string(),
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
fn log_entries_resolve_new_products_by_name() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    insert_products(&store, &[("pen", 5)]);
    let batch = MutationBatch {
        mutations: vec![Mutation::InsertProduct {
            name: "ink".to_string(),
            quantity: 4,
        }],
        transactions: vec![TransactionEntry {
            product: ProductRef::Named("ink".to_string()),
            product_name: "ink".to_string(),
            quantity: 4,
            client_id: 0,
            client_name: "admin".to_string(),
            kind: TransactionKind::Add,
        }],
    };
    store.apply(&batch).unwrap();
    let log = store.transactions_for_client(0).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].value(2), &ColumnValue::Integer(2));
    assert_eq!(log[0].value(7), &ColumnValue::text("add"));
    let date = log[0].value(1).as_text().unwrap();
    assert_eq!(date.len(), 10);
}

// ============================================================================
// SECTION: Service Flows
// ============================================================================

#[test]
fn purchases_persist_through_the_service() {
    let dir = TempDir::new().unwrap();
    let service = InventoryService::new(Arc::new(open(&dir))).unwrap();
    let run = |operation: Operation, body: Value| {
        let Value::Object(map) = body else {
            panic!("body must be an object");
        };
        service.handle(operation, &map).unwrap()
    };

    let added =
        run(Operation::AddProducts, json!({"user": "admin", "data": {"name": "pen", "quantity": 10}}));
    assert_eq!(added.status, ResponseStatus::Created);
    run(Operation::AddClients, json!({"data": {"name": "bob"}}));
    let bought = run(Operation::EditProducts, json!({"user": "bob", "data": {"name": "pen", "buy": 4}}));
    assert_eq!(bought.body, json!({"message": "Transaction successful"}));
    let rejected =
        run(Operation::EditProducts, json!({"user": "bob", "data": {"name": "pen", "return": 5}}));
    assert_eq!(rejected.status, ResponseStatus::BadRequest);

    drop(service);
    let reopened = open(&dir);
    let rows = reopened.fetch_all(Table::Products).unwrap();
    assert_eq!(rows[0].value(2), &ColumnValue::Integer(6));
    assert_eq!(reopened.fetch_all(Table::Transactions).unwrap().len(), 2);
}

#[test]
fn replacement_products_do_not_inherit_purchase_history() {
    let dir = TempDir::new().unwrap();
    let service = InventoryService::new(Arc::new(open(&dir))).unwrap();
    let run = |operation: Operation, body: Value| {
        let Value::Object(map) = body else {
            panic!("body must be an object");
        };
        service.handle(operation, &map).unwrap()
    };

    run(Operation::AddProducts, json!({"user": "admin", "data": {"name": "pen", "quantity": 10}}));
    run(Operation::AddClients, json!({"data": {"name": "amy"}}));
    run(Operation::EditProducts, json!({"user": "amy", "data": {"name": "pen", "buy": 4}}));
    run(Operation::RemoveProducts, json!({"user": "admin", "data": {"name": "pen"}}));
    run(Operation::AddProducts, json!({"user": "admin", "data": {"name": "ink", "quantity": 10}}));

    let returned =
        run(Operation::EditProducts, json!({"user": "amy", "data": {"name": "ink", "return": 4}}));
    assert_eq!(returned.status, ResponseStatus::BadRequest);
    assert_eq!(returned.body["error"], json!("Return amount too high"));

    drop(service);
    let reopened = open(&dir);
    let rows = reopened.fetch_all(Table::Products).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value(0), &ColumnValue::Integer(2));
    assert_eq!(rows[0].value(2), &ColumnValue::Integer(10));
}
