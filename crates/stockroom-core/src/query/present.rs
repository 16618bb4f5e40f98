// crates/stockroom-core/src/query/present.rs
// ============================================================================
// Module: Stockroom Presentation
// Description: Maps result entries to named JSON objects.
// Purpose: Produce the response body for read requests.
// Dependencies: crate::core, crate::query::evaluator, serde_json
// ============================================================================

//! ## Overview
//! Rows become `{column: value}` objects in schema order, markers become
//! `{"search": n}`, and collected errors are listed ahead of the rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::InventoryError;
use crate::core::Row;
use crate::core::TableSchema;
use crate::query::evaluator::ResultEntry;

// ============================================================================
// SECTION: Presentation
// ============================================================================

/// Renders errors followed by entries.
#[must_use]
pub fn present(
    entries: &[ResultEntry],
    errors: &[InventoryError],
    schema: &TableSchema,
) -> Vec<Value> {
    let mut output: Vec<Value> = errors.iter().map(InventoryError::to_json).collect();
    output.extend(entries.iter().map(|entry| match entry {
        ResultEntry::Marker(position) => {
            let mut marker = Map::new();
            marker.insert("search".to_string(), Value::from(*position));
            Value::Object(marker)
        }
        ResultEntry::Row(row) => row_object(row, schema),
    }));
    output
}

/// Maps a row to a named object using the schema's column order.
#[must_use]
pub fn row_object(row: &Row, schema: &TableSchema) -> Value {
    let object: Map<String, Value> = schema
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| (column.name.clone(), row.value(index).to_json()))
        .collect();
    Value::Object(object)
}
