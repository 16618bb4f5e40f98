// crates/stockroom-core/src/query/view.rs
// ============================================================================
// Module: Stockroom View Requests
// Description: Decodes `filter`/`order` and runs them over fetched rows.
// Purpose: Single entry point for read routes.
// Dependencies: crate::core, crate::query::{evaluator, order}, serde_json
// ============================================================================

//! ## Overview
//! A view request carries an optional filter and an optional order. Without
//! a filter every fetched row is returned; the order then applies to the
//! whole set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::InventoryResult;
use crate::core::Row;
use crate::core::TableSchema;
use crate::query::evaluator::FilterOutcome;
use crate::query::evaluator::FilterQuery;
use crate::query::evaluator::evaluate;
use crate::query::order::SortOrder;
use crate::query::order::order_entries;

// ============================================================================
// SECTION: View Request
// ============================================================================

/// Decoded read request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewRequest {
    /// Optional filter query.
    pub filter: Option<FilterQuery>,
    /// Optional ordering.
    pub order: Option<SortOrder>,
}

impl ViewRequest {
    /// Decodes `filter` and `order` from a request body; `null` means absent.
    ///
    /// # Errors
    ///
    /// Returns a request-shape or type-coercion error for malformed values.
    pub fn from_body(body: &Map<String, Value>) -> InventoryResult<Self> {
        let filter = match body.get("filter") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(FilterQuery::from_json(raw)?),
        };
        let order = match body.get("order") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(SortOrder::from_json(raw)?),
        };
        Ok(Self {
            filter,
            order,
        })
    }
}

/// Runs a view request over fetched rows.
///
/// # Errors
///
/// Returns an error when the order column is unknown. Filter errors are
/// collected in the outcome instead.
pub fn run_view(
    rows: Vec<Row>,
    request: &ViewRequest,
    schema: &TableSchema,
) -> InventoryResult<FilterOutcome> {
    let mut outcome = match &request.filter {
        Some(query) => evaluate(&rows, query, schema),
        None => FilterOutcome::from_rows(rows),
    };
    if let Some(order) = &request.order {
        outcome.entries = order_entries(outcome.entries, order, schema)?;
    }
    Ok(outcome)
}
