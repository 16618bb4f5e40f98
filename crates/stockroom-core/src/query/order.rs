// crates/stockroom-core/src/query/order.rs
// ============================================================================
// Module: Stockroom Result Ordering
// Description: Column ordering and descending display for result entries.
// Purpose: Apply a requested `order` to filtered rows group by group.
// Dependencies: crate::core, crate::query::{evaluator, sort}, serde_json
// ============================================================================

//! ## Overview
//! Ordering always sorts ascending with the merge sort; `descending` is a
//! display-time reversal. Search groups are ordered independently and their
//! markers stay at the head of each group.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::core::Row;
use crate::core::TableSchema;
use crate::query::evaluator::ResultEntry;
use crate::query::sort::merge_sort;
use crate::validate::coerce_text;

// ============================================================================
// SECTION: Sort Order
// ============================================================================

/// Decoded `order` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    /// Column to sort by, if any.
    pub column: Option<String>,
    /// Reverse each group at presentation time.
    pub descending: bool,
}

impl SortOrder {
    /// Decodes an order request from `{"column": ..., "descending": ...}`.
    ///
    /// # Errors
    ///
    /// Returns a request-shape error for non-object input and a
    /// type-coercion error for mistyped fields.
    pub fn from_json(raw: &Value) -> InventoryResult<Self> {
        let Value::Object(fields) = raw else {
            return Err(InventoryError::request_shape("Order must be a mapping")
                .with("order", raw.clone()));
        };
        let column = fields.get("column").map(|raw| coerce_text("column", raw)).transpose()?;
        let descending = match fields.get("descending") {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(other) => {
                return Err(InventoryError::type_coercion("Descending must be a boolean")
                    .with("descending", other.clone()));
            }
        };
        Ok(Self {
            column,
            descending,
        })
    }
}

// ============================================================================
// SECTION: Ordering
// ============================================================================

/// Orders and optionally reverses each search group.
///
/// # Errors
///
/// Returns a request-shape error when the order column is not in the schema.
pub fn order_entries(
    entries: Vec<ResultEntry>,
    order: &SortOrder,
    schema: &TableSchema,
) -> InventoryResult<Vec<ResultEntry>> {
    let column = match &order.column {
        Some(name) => Some(schema.index_of(name).ok_or_else(|| {
            InventoryError::request_shape("Order column not found").with("column", name.as_str())
        })?),
        None => None,
    };

    let mut ordered = Vec::with_capacity(entries.len());
    for (marker, rows) in split_groups(entries) {
        let mut rows = match column {
            Some(column) => merge_sort(rows, column),
            None => rows,
        };
        if order.descending {
            rows.reverse();
        }
        ordered.extend(marker.map(ResultEntry::Marker));
        ordered.extend(rows.into_iter().map(ResultEntry::Row));
    }
    Ok(ordered)
}

/// Splits entries into (marker, rows) groups; the first group may be unmarked.
fn split_groups(entries: Vec<ResultEntry>) -> Vec<(Option<usize>, Vec<Row>)> {
    let mut groups: Vec<(Option<usize>, Vec<Row>)> = Vec::new();
    for entry in entries {
        match entry {
            ResultEntry::Marker(position) => groups.push((Some(position), Vec::new())),
            ResultEntry::Row(row) => match groups.last_mut() {
                Some((_, rows)) => rows.push(row),
                None => groups.push((None, vec![row])),
            },
        }
    }
    groups
}
