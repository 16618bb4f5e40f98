// crates/stockroom-core/src/core/schema.rs
// ============================================================================
// Module: Stockroom Schema Descriptor
// Description: Per-table ordered column names and declared types.
// Purpose: Resolve column names to fixed positional indices once per request.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The [`SchemaDescriptor`] is built once at process start (from storage
//! introspection or the canonical table definitions) and is read-only for the
//! rest of the process. Engines address columns only by the positional index
//! resolved here; names never appear in the hot paths.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::value::ColumnType;

// ============================================================================
// SECTION: Tables
// ============================================================================

/// Tables managed by the inventory backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Product catalogue with stock quantities.
    Products,
    /// Registered clients.
    Clients,
    /// Append-only transaction log.
    Transactions,
}

impl Table {
    /// All managed tables in creation order.
    pub const ALL: [Self; 3] = [Self::Products, Self::Clients, Self::Transactions];

    /// Returns the storage table name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Clients => "clients",
            Self::Transactions => "transactions",
        }
    }

    /// Returns the canonical column layout for the table.
    #[must_use]
    pub fn canonical_columns(self) -> Vec<ColumnSchema> {
        let layout: &[(&str, ColumnType)] = match self {
            Self::Products => &[
                ("id", ColumnType::Integer),
                ("name", ColumnType::Text),
                ("quantity", ColumnType::Integer),
            ],
            Self::Clients => &[("id", ColumnType::Integer), ("name", ColumnType::Text)],
            Self::Transactions => &[
                ("transaction_id", ColumnType::Integer),
                ("transaction_date", ColumnType::Text),
                ("product_id", ColumnType::Integer),
                ("product_name", ColumnType::Text),
                ("quantity", ColumnType::Integer),
                ("client_id", ColumnType::Integer),
                ("client_name", ColumnType::Text),
                ("type_of_transaction", ColumnType::Text),
            ],
        };
        layout.iter().map(|(name, column_type)| ColumnSchema::new(*name, *column_type)).collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Column + Table Schemas
// ============================================================================

/// Name and declared type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name as declared in storage.
    pub name: String,
    /// Declared column type.
    pub column_type: ColumnType,
}

impl ColumnSchema {
    /// Creates a column schema entry.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered column layout for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table the layout belongs to.
    table: Table,
    /// Columns in storage order.
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Creates a table schema from columns in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the layout is empty or repeats a name.
    pub fn new(table: Table, columns: Vec<ColumnSchema>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty(table));
        }
        for (index, column) in columns.iter().enumerate() {
            if columns[.. index].iter().any(|earlier| earlier.name == column.name) {
                return Err(SchemaError::DuplicateColumn {
                    table,
                    column: column.name.clone(),
                });
            }
        }
        Ok(Self {
            table,
            columns,
        })
    }

    /// Returns the table this layout describes.
    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }

    /// Returns the columns in storage order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Resolves a column name to its positional index.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Returns the column at a positional index.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ColumnSchema> {
        self.columns.get(index)
    }

    /// Resolves a required column, failing when the layout lacks it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingColumn`] when the column is absent.
    pub fn require(&self, name: &str) -> Result<usize, SchemaError> {
        self.index_of(name).ok_or_else(|| SchemaError::MissingColumn {
            table: self.table,
            column: name.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Schema Descriptor
// ============================================================================

/// Immutable column metadata for every managed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Layout per table.
    tables: BTreeMap<Table, TableSchema>,
}

impl SchemaDescriptor {
    /// Builds a descriptor from per-table layouts.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a managed table is missing or lacks the
    /// columns the inventory operations depend on.
    pub fn new(tables: Vec<TableSchema>) -> Result<Self, SchemaError> {
        let mut map = BTreeMap::new();
        for schema in tables {
            map.insert(schema.table, schema);
        }
        let descriptor = Self {
            tables: map,
        };
        descriptor.check_required_columns()?;
        Ok(descriptor)
    }

    /// Builds the descriptor from the canonical table definitions.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] only if the canonical definitions are invalid.
    pub fn canonical() -> Result<Self, SchemaError> {
        let tables = Table::ALL
            .iter()
            .map(|table| TableSchema::new(*table, table.canonical_columns()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tables)
    }

    /// Returns the layout for a table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingTable`] when the table is unknown.
    pub fn table(&self, table: Table) -> Result<&TableSchema, SchemaError> {
        self.tables.get(&table).ok_or(SchemaError::MissingTable(table))
    }

    /// Verifies the columns the inventory operations address by name.
    fn check_required_columns(&self) -> Result<(), SchemaError> {
        let required: [(Table, &[&str]); 3] = [
            (Table::Products, &["id", "name", "quantity"]),
            (Table::Clients, &["id", "name"]),
            (Table::Transactions, &["product_id", "quantity", "client_id", "type_of_transaction"]),
        ];
        for (table, columns) in required {
            let schema = self.table(table)?;
            for column in columns {
                schema.require(column)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A managed table is absent from the descriptor.
    #[error("schema missing table: {0}")]
    MissingTable(Table),
    /// A table has no columns.
    #[error("schema for {0} has no columns")]
    Empty(Table),
    /// A required column is absent.
    #[error("schema for {table} missing column: {column}")]
    MissingColumn {
        /// Table being checked.
        table: Table,
        /// Missing column name.
        column: String,
    },
    /// A column name appears twice.
    #[error("schema for {table} repeats column: {column}")]
    DuplicateColumn {
        /// Table being checked.
        table: Table,
        /// Repeated column name.
        column: String,
    },
    /// A declared column type is not supported.
    #[error("schema for {table} has unsupported type {declared} on column {column}")]
    UnsupportedType {
        /// Table being checked.
        table: Table,
        /// Column name.
        column: String,
        /// Declared type text.
        declared: String,
    },
}

#[cfg(test)]
mod tests {
    use super::ColumnSchema;
    use super::SchemaDescriptor;
    use super::SchemaError;
    use super::Table;
    use super::TableSchema;
    use crate::core::value::ColumnType;

    #[test]
    fn canonical_descriptor_resolves_indices() {
        let descriptor = SchemaDescriptor::canonical();
        assert!(descriptor.is_ok());
        let Ok(descriptor) = descriptor else { return };
        let Ok(products) = descriptor.table(Table::Products) else { return };
        assert_eq!(products.index_of("name"), Some(1));
        assert_eq!(products.index_of("quantity"), Some(2));
        assert_eq!(products.index_of("missing"), None);
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let result = TableSchema::new(
            Table::Clients,
            vec![
                ColumnSchema::new("id", ColumnType::Integer),
                ColumnSchema::new("id", ColumnType::Integer),
            ],
        );
        assert!(matches!(result, Err(SchemaError::DuplicateColumn { .. })));
    }
}
