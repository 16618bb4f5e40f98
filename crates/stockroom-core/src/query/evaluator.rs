// crates/stockroom-core/src/query/evaluator.rs
// ============================================================================
// Module: Stockroom Filter Request Evaluator
// Description: Applies one or many filter mappings to a fetched result set.
// Purpose: Combine clauses by narrowing, or run independent tagged searches.
// Dependencies: crate::core, crate::query::{clause, filter}, serde_json
// ============================================================================

//! ## Overview
//! A single mapping narrows the working rows clause by clause (logical AND).
//! A sequence of mappings evaluates each one against the fetched rows; each
//! non-empty group is preceded by a [`ResultEntry::Marker`] carrying its
//! 1-based position, and each failing group contributes an error without
//! aborting its siblings.
//!
//! Mapping keys are matched against column names exactly; keys naming no
//! column are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::core::Row;
use crate::core::TableSchema;
use crate::query::clause::FilterClause;
use crate::query::filter::apply_filter;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One filter mapping: column name to clause.
pub type FilterMapping = Map<String, Value>;

/// Decoded filter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterQuery {
    /// Clauses combined by sequential narrowing.
    Single(FilterMapping),
    /// Independent searches, each over the fetched rows.
    Many(Vec<FilterMapping>),
}

impl FilterQuery {
    /// Decodes a filter query from its wire form.
    ///
    /// # Errors
    ///
    /// Returns a request-shape error when the filter is neither a mapping nor
    /// a non-empty sequence of mappings.
    pub fn from_json(raw: &Value) -> InventoryResult<Self> {
        match raw {
            Value::Object(mapping) => Ok(Self::Single(mapping.clone())),
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| match item {
                    Value::Object(mapping) => Ok(mapping.clone()),
                    other => Err(filter_shape_error(other)),
                })
                .collect::<InventoryResult<Vec<_>>>()
                .map(Self::Many),
            other => Err(filter_shape_error(other)),
        }
    }
}

/// Builds the error for an unusable filter value.
fn filter_shape_error(raw: &Value) -> InventoryError {
    InventoryError::request_shape("Filter must be a mapping or a list of mappings")
        .with("filter", raw.clone())
}

/// One entry of an evaluated result sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEntry {
    /// Start of the nth search group (1-based).
    Marker(usize),
    /// A matching row.
    Row(Row),
}

/// Result rows plus errors collected from failing search groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    /// Rows and group markers in output order.
    pub entries: Vec<ResultEntry>,
    /// Errors in group order.
    pub errors: Vec<InventoryError>,
}

impl FilterOutcome {
    /// Wraps plain rows with no markers or errors.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            entries: rows.into_iter().map(ResultEntry::Row).collect(),
            errors: Vec::new(),
        }
    }

    /// Returns true when at least one row survived.
    #[must_use]
    pub fn has_rows(&self) -> bool {
        self.entries.iter().any(|entry| matches!(entry, ResultEntry::Row(_)))
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a filter query against fetched rows.
#[must_use]
pub fn evaluate(rows: &[Row], query: &FilterQuery, schema: &TableSchema) -> FilterOutcome {
    match query {
        FilterQuery::Single(mapping) => match evaluate_mapping(rows.to_vec(), mapping, schema) {
            Ok(rows) => FilterOutcome::from_rows(rows),
            Err(error) => FilterOutcome {
                entries: Vec::new(),
                errors: vec![error],
            },
        },
        FilterQuery::Many(mappings) => {
            let mut outcome = FilterOutcome::default();
            for (position, mapping) in mappings.iter().enumerate() {
                match evaluate_mapping(rows.to_vec(), mapping, schema) {
                    Ok(group) if group.is_empty() => {}
                    Ok(group) => {
                        outcome.entries.push(ResultEntry::Marker(position + 1));
                        outcome.entries.extend(group.into_iter().map(ResultEntry::Row));
                    }
                    Err(error) => outcome.errors.push(error),
                }
            }
            outcome
        }
    }
}

/// Narrows rows by every clause of one mapping, in mapping order.
///
/// # Errors
///
/// Returns the first clause error: shape, coercion, operator, or not found.
pub fn evaluate_mapping(
    rows: Vec<Row>,
    mapping: &FilterMapping,
    schema: &TableSchema,
) -> InventoryResult<Vec<Row>> {
    let mut working = rows;
    for (key, raw) in mapping {
        let Some(column) = schema.index_of(key) else {
            continue;
        };
        let Some(column_schema) = schema.column(column) else {
            continue;
        };
        let clause = FilterClause::from_json(key, raw)?;
        let predicate = clause.predicate(column_schema.column_type)?;
        working = apply_filter(working, column, &predicate)?;
    }
    Ok(working)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use serde_json::json;

    use super::FilterQuery;
    use super::ResultEntry;
    use super::evaluate;
    use crate::core::ColumnValue;
    use crate::core::ErrorKind;
    use crate::core::Row;
    use crate::core::Table;
    use crate::core::TableSchema;

    fn products() -> (TableSchema, Vec<Row>) {
        let schema = TableSchema::new(Table::Products, Table::Products.canonical_columns())
            .expect("canonical products schema");
        let rows = [(1, "pen", 10), (2, "pencil", 4), (3, "ink", 10), (4, "paper", 25)]
            .iter()
            .map(|(id, name, quantity)| {
                Row::new(vec![
                    ColumnValue::Integer(*id),
                    ColumnValue::text(*name),
                    ColumnValue::Integer(*quantity),
                ])
            })
            .collect();
        (schema, rows)
    }

    fn ids(entries: &[ResultEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| match entry {
                ResultEntry::Marker(n) => format!("#{n}"),
                ResultEntry::Row(row) => row.value(0).text_form(),
            })
            .collect()
    }

    #[test]
    fn single_mapping_narrows_by_each_clause() {
        let (schema, rows) = products();
        let query =
            FilterQuery::from_json(&json!({"quantity": [10, "=="], "name": ["p", "*a"]})).unwrap();
        let outcome = evaluate(&rows, &query, &schema);
        assert_eq!(ids(&outcome.entries), vec!["1"]);
    }

    #[test]
    fn many_mappings_tag_groups_and_collect_errors() {
        let (schema, rows) = products();
        let query = FilterQuery::from_json(&json!([
            {"quantity": [10, "=="]},
            {"name": ["zzz", "=="]},
            {"name": ["pen", "*a"]}
        ]))
        .unwrap();
        let outcome = evaluate(&rows, &query, &schema);
        assert_eq!(ids(&outcome.entries), vec!["#1", "1", "3", "#3", "1", "2"]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors.first().map(|err| err.kind()), Some(ErrorKind::NotFound));
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let (schema, rows) = products();
        let query = FilterQuery::from_json(&json!({"colour": "red"})).unwrap();
        let outcome = evaluate(&rows, &query, &schema);
        assert_eq!(outcome.entries.len(), 4);
        assert!(outcome.errors.is_empty());
    }
}
