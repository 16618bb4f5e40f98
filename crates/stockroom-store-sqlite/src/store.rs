// crates/stockroom-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Inventory Store
// Description: Durable InventoryStore backed by SQLite.
// Purpose: Persist inventory tables and apply mutation batches atomically.
// Dependencies: stockroom-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements [`InventoryStore`] over a single `SQLite` database.
//! The three inventory tables are created on first open and the schema
//! descriptor is read back from `PRAGMA table_info`, so the query engine
//! always sees the layout actually on disk.
//!
//! Product and client identifiers use `AUTOINCREMENT`, so an identifier freed
//! by a delete is never issued again.
//!
//! Each [`MutationBatch`] runs inside one transaction. Renames are parked on
//! placeholder names first and resolved after every other mutation, so swaps
//! never trip the `UNIQUE(name)` constraints.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde::Deserialize;
use stockroom_core::ColumnType;
use stockroom_core::ColumnValue;
use stockroom_core::InventoryStore;
use stockroom_core::Mutation;
use stockroom_core::MutationBatch;
use stockroom_core::Row;
use stockroom_core::SchemaDescriptor;
use stockroom_core::SchemaError;
use stockroom_core::StoreError;
use stockroom_core::Table;
use stockroom_core::TableSchema;
use stockroom_core::core::ColumnSchema;
use stockroom_core::interfaces::ProductRef;
use stockroom_core::interfaces::TransactionEntry;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Prefix of the names renamed rows hold until the batch resolves them.
const RENAME_PLACEHOLDER_PREFIX: &str = "\u{1}pending-rename-";

/// Table definitions created on first open.
const CREATE_TABLES: &str = "CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        quantity INTEGER
    );
    CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL
    );
    CREATE TABLE IF NOT EXISTS transactions (
        transaction_id INTEGER PRIMARY KEY,
        transaction_date TEXT DEFAULT CURRENT_DATE,
        product_id INTEGER,
        product_name TEXT,
        quantity INTEGER,
        client_id INTEGER,
        client_name TEXT,
        type_of_transaction TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_client
        ON transactions (client_id);";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` inventory store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with default pragmas for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// A write violated a table constraint.
    #[error("sqlite store constraint violation: {0}")]
    Constraint(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Store(message)
            }
            SqliteStoreError::Constraint(message) => Self::Constraint(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<SchemaError> for SqliteStoreError {
    fn from(error: SchemaError) -> Self {
        Self::Invalid(error.to_string())
    }
}

/// Maps an engine error, singling out constraint violations.
fn db_error(error: &rusqlite::Error) -> SqliteStoreError {
    if error.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        SqliteStoreError::Constraint(error.to_string())
    } else {
        SqliteStoreError::Db(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed inventory store.
///
/// # Invariants
/// - The schema descriptor is read once at open and never changes.
/// - Connection access is serialized through a mutex.
pub struct SqliteInventoryStore {
    /// Schema descriptor introspected at open.
    schema: SchemaDescriptor,
    /// Database connection.
    connection: Mutex<Connection>,
}

impl SqliteInventoryStore {
    /// Opens an `SQLite`-backed inventory store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened,
    /// initialized, or introspected.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        let schema = introspect_schema(&connection)?;
        Ok(Self {
            schema,
            connection: Mutex::new(connection),
        })
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Runs a row query built from a table's column list.
    fn select(
        &self,
        table: Table,
        clause: &str,
        values: &[SqlValue],
    ) -> Result<Vec<Row>, SqliteStoreError> {
        let schema = self.schema.table(table)?;
        let sql = format!(
            "SELECT {} FROM {} {clause} ORDER BY rowid",
            column_list(schema),
            table.as_str()
        );
        let guard = self.lock()?;
        let mut statement = guard.prepare(&sql).map_err(|err| db_error(&err))?;
        let width = schema.width();
        let raw_rows = statement
            .query_map(params_from_iter(values.iter()), |row| {
                (0 .. width)
                    .map(|index| row.get::<_, SqlValue>(index))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|err| db_error(&err))?;
        let mut rows = Vec::new();
        for raw in raw_rows {
            let raw = raw.map_err(|err| db_error(&err))?;
            let values = raw.into_iter().map(column_value).collect::<Result<Vec<_>, _>>()?;
            rows.push(Row::new(values));
        }
        Ok(rows)
    }

    /// Applies a batch inside one transaction.
    fn apply_batch(&self, batch: &MutationBatch) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        let mut renames: Vec<(Table, i64, &str)> = Vec::new();
        for mutation in &batch.mutations {
            match mutation {
                Mutation::RenameProduct {
                    id,
                    name,
                } => {
                    park_name(&tx, Table::Products, *id)?;
                    renames.push((Table::Products, *id, name.as_str()));
                }
                Mutation::RenameClient {
                    id,
                    name,
                } => {
                    park_name(&tx, Table::Clients, *id)?;
                    renames.push((Table::Clients, *id, name.as_str()));
                }
                other => apply_mutation(&tx, other)?,
            }
        }
        for (table, id, name) in renames {
            let sql = format!("UPDATE {} SET name = ?1 WHERE id = ?2", table.as_str());
            tx.execute(&sql, params![name, id]).map_err(|err| db_error(&err))?;
        }
        for entry in &batch.transactions {
            append_log_entry(&tx, entry)?;
        }
        tx.commit().map_err(|err| db_error(&err))
    }
}

impl InventoryStore for SqliteInventoryStore {
    fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    fn fetch_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        Ok(self.select(table, "", &[])?)
    }

    fn fetch_by_names(&self, table: Table, names: &[String]) -> Result<Vec<Row>, StoreError> {
        if table == Table::Transactions {
            return Err(StoreError::Invalid("transactions table has no name column".to_string()));
        }
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; names.len()].join(", ");
        let values: Vec<SqlValue> = names.iter().map(|name| SqlValue::Text(name.clone())).collect();
        Ok(self.select(table, &format!("WHERE name IN ({placeholders})"), &values)?)
    }

    fn transactions_for_client(&self, client_id: i64) -> Result<Vec<Row>, StoreError> {
        let values = [SqlValue::Integer(client_id)];
        Ok(self.select(Table::Transactions, "WHERE client_id = ?1", &values)?)
    }

    fn apply(&self, batch: &MutationBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        Ok(self.apply_batch(batch)?)
    }
}

// ============================================================================
// SECTION: Mutations
// ============================================================================

/// Applies one non-rename mutation.
fn apply_mutation(tx: &Transaction<'_>, mutation: &Mutation) -> Result<(), SqliteStoreError> {
    let result = match mutation {
        Mutation::InsertProduct {
            name,
            quantity,
        } => tx.execute("INSERT INTO products (name, quantity) VALUES (?1, ?2)", params![
            name, quantity
        ]),
        Mutation::DeleteProduct {
            id,
        } => tx.execute("DELETE FROM products WHERE id = ?1", params![id]),
        Mutation::SetProductQuantity {
            id,
            quantity,
        } => tx.execute("UPDATE products SET quantity = ?1 WHERE id = ?2", params![quantity, id]),
        Mutation::InsertClient {
            name,
        } => tx.execute("INSERT INTO clients (name) VALUES (?1)", params![name]),
        Mutation::DeleteClient {
            id,
        } => tx.execute("DELETE FROM clients WHERE id = ?1", params![id]),
        Mutation::RenameProduct {
            id,
            name,
        } => tx.execute("UPDATE products SET name = ?1 WHERE id = ?2", params![name, id]),
        Mutation::RenameClient {
            id,
            name,
        } => tx.execute("UPDATE clients SET name = ?1 WHERE id = ?2", params![name, id]),
    };
    result.map(|_| ()).map_err(|err| db_error(&err))
}

/// Moves a row onto a placeholder name until the batch's renames resolve.
fn park_name(tx: &Transaction<'_>, table: Table, id: i64) -> Result<(), SqliteStoreError> {
    let sql = format!("UPDATE {} SET name = ?1 WHERE id = ?2", table.as_str());
    tx.execute(&sql, params![format!("{RENAME_PLACEHOLDER_PREFIX}{id}"), id])
        .map(|_| ())
        .map_err(|err| db_error(&err))
}

/// Appends a transaction log entry; named products resolve after insertion.
fn append_log_entry(
    tx: &Transaction<'_>,
    entry: &TransactionEntry,
) -> Result<(), SqliteStoreError> {
    let (product_id, lookup_name) = match &entry.product {
        ProductRef::Id(id) => (Some(*id), None),
        ProductRef::Named(name) => (None, Some(name.as_str())),
    };
    tx.execute(
        "INSERT INTO transactions (product_id, product_name, quantity, client_id, client_name, \
         type_of_transaction)
         VALUES (COALESCE(?1, (SELECT id FROM products WHERE name = ?2)), ?3, ?4, ?5, ?6, ?7)",
        params![
            product_id,
            lookup_name,
            entry.product_name,
            entry.quantity,
            entry.client_id,
            entry.client_name,
            entry.kind.as_str(),
        ],
    )
    .map(|_| ())
    .map_err(|err| db_error(&err))
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Builds the schema descriptor from the tables on disk.
fn introspect_schema(connection: &Connection) -> Result<SchemaDescriptor, SqliteStoreError> {
    let mut tables = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let mut statement = connection
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(|err| db_error(&err))?;
        let described = statement
            .query_map(params![table.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|err| db_error(&err))?;
        let mut columns = Vec::new();
        for column in described {
            let (name, declared) = column.map_err(|err| db_error(&err))?;
            let Some(column_type) = ColumnType::from_declared(&declared) else {
                return Err(SchemaError::UnsupportedType {
                    table,
                    column: name,
                    declared,
                }
                .into());
            };
            columns.push(ColumnSchema::new(name, column_type));
        }
        tables.push(TableSchema::new(table, columns)?);
    }
    Ok(SchemaDescriptor::new(tables)?)
}

/// Renders a quoted column list in schema order.
fn column_list(schema: &TableSchema) -> String {
    schema
        .columns()
        .iter()
        .map(|column| format!("\"{}\"", column.name.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Converts a stored value into a column value.
fn column_value(value: SqlValue) -> Result<ColumnValue, SqliteStoreError> {
    match value {
        SqlValue::Null => Ok(ColumnValue::Null),
        SqlValue::Integer(value) => Ok(ColumnValue::Integer(value)),
        SqlValue::Text(value) => Ok(ColumnValue::Text(value)),
        SqlValue::Real(_) | SqlValue::Blob(_) => {
            Err(SqliteStoreError::Invalid("unsupported stored value type".to_string()))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Creates the inventory tables or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(CREATE_TABLES).map_err(|err| db_error(&err))?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {other}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))
}
