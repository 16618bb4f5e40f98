// crates/stockroom-core/src/core/record.rs
// ============================================================================
// Module: Stockroom Records
// Description: Tabular storage rows and mutable request records.
// Purpose: Carry fetched tuples and decoded request items through the engines.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Row`] is an immutable fixed-width tuple in schema order, as produced
//! by storage reads. A [`RequestRecord`] is one decoded request item: a
//! field-name to value mapping that gains fields (`id`, `quantity`,
//! `transaction`) as it moves through reconciliation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::value::ColumnValue;
use crate::core::value::NULL_VALUE;

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Request field holding the match key.
pub const FIELD_NAME: &str = "name";
/// Request field holding a rename target.
pub const FIELD_NEW_NAME: &str = "new_name";
/// Request field holding an absolute quantity for new products.
pub const FIELD_QUANTITY: &str = "quantity";
/// Request field holding a replacement stock quantity.
pub const FIELD_NEW_QUANTITY: &str = "new_quantity";
/// Request field holding a purchase amount.
pub const FIELD_BUY: &str = "buy";
/// Request field holding a return amount.
pub const FIELD_RETURN: &str = "return";
/// Field annotated with the store-assigned identifier.
pub const FIELD_ID: &str = "id";
/// Field annotated with the resulting mutation kind.
pub const FIELD_TRANSACTION: &str = "transaction";

// ============================================================================
// SECTION: Tabular Rows
// ============================================================================

/// Fixed-width storage tuple in schema column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Vec<ColumnValue>);

impl Row {
    /// Creates a row from values in schema order.
    #[must_use]
    pub const fn new(values: Vec<ColumnValue>) -> Self {
        Self(values)
    }

    /// Returns the value at a column index (`NULL` when out of range).
    #[must_use]
    pub fn value(&self, column: usize) -> &ColumnValue {
        self.0.get(column).unwrap_or(&NULL_VALUE)
    }

    /// Returns all values in schema order.
    #[must_use]
    pub fn values(&self) -> &[ColumnValue] {
        &self.0
    }

    /// Returns the row width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<ColumnValue>> for Row {
    fn from(values: Vec<ColumnValue>) -> Self {
        Self(values)
    }
}

// ============================================================================
// SECTION: Request Records
// ============================================================================

/// One decoded request item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestRecord(Map<String, Value>);

impl RequestRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Returns true when the field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns a field as text.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Returns a field as an integer.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Returns the record as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for RequestRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RequestRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}
