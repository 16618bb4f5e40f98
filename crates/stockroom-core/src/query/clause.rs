// crates/stockroom-core/src/query/clause.rs
// ============================================================================
// Module: Stockroom Filter Clauses
// Description: Wire decoding and coercion for single-column filter clauses.
// Purpose: Turn one `column: value` filter entry into a typed predicate.
// Dependencies: crate::core, crate::query::filter, crate::validate, serde_json
// ============================================================================

//! ## Overview
//! A clause arrives as either a bare value or an array:
//!
//! - `value` or `[value]`: default predicate
//! - `[value, op]`: one value with an operator
//! - `[first, second, "--"]`: closed range
//!
//! Any other arity is a request-shape error naming the column and operator.
//! Values are coerced against the column's declared type before a predicate
//! is built; integer clause values are not bounded below so low identifiers
//! stay searchable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::ColumnType;
use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::query::filter::FORMAT_MESSAGE;
use crate::query::filter::FilterOperator;
use crate::query::filter::FilterPredicate;
use crate::validate::IntegerBound;
use crate::validate::coerce_value;

// ============================================================================
// SECTION: Clause
// ============================================================================

/// One decoded filter clause for a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// Column name the clause targets.
    pub column: String,
    /// First comparison value, uncoerced.
    pub value: Value,
    /// Second comparison value for `--`.
    pub second: Option<Value>,
    /// Operator, or `None` for the default predicate.
    pub operator: Option<FilterOperator>,
}

impl FilterClause {
    /// Decodes a clause from its wire form.
    ///
    /// # Errors
    ///
    /// Returns a request-shape error for malformed arities and an
    /// invalid-operator error for unknown symbols.
    pub fn from_json(column: &str, raw: &Value) -> InventoryResult<Self> {
        let Value::Array(items) = raw else {
            return Ok(Self::plain(column, raw.clone()));
        };
        let between =
            items.iter().any(|item| item.as_str() == Some(FilterOperator::Between.symbol()));
        match items.as_slice() {
            [] => Err(InventoryError::request_shape(FORMAT_MESSAGE).with(column, Value::Null)),
            [value] => Ok(Self::plain(column, value.clone())),
            [first, second, operator] if between => {
                if operator.as_str() != Some(FilterOperator::Between.symbol()) {
                    return Err(shape_error(column, FORMAT_MESSAGE, items));
                }
                Ok(Self {
                    column: column.to_string(),
                    value: first.clone(),
                    second: Some(second.clone()),
                    operator: Some(FilterOperator::Between),
                })
            }
            _ if between => Err(shape_error(column, "The operator requires a second value", items)),
            [value, operator] => Ok(Self {
                column: column.to_string(),
                value: value.clone(),
                second: None,
                operator: Some(parse_operator(operator)?),
            }),
            _ => Err(shape_error(column, FORMAT_MESSAGE, items)),
        }
    }

    /// Coerces the clause values and builds the predicate.
    ///
    /// # Errors
    ///
    /// Returns a type-coercion error when a value does not fit the column.
    pub fn predicate(&self, column_type: ColumnType) -> InventoryResult<FilterPredicate> {
        let value = coerce_value(&self.column, &self.value, column_type, IntegerBound::Unbounded)?;
        let second = self
            .second
            .as_ref()
            .map(|raw| coerce_value(&self.column, raw, column_type, IntegerBound::Unbounded))
            .transpose()?;
        FilterPredicate::new(self.operator, value, second)
            .map_err(|err| err.with(&self.column, self.value.clone()))
    }

    /// Builds a clause with no operator.
    fn plain(column: &str, value: Value) -> Self {
        Self {
            column: column.to_string(),
            value,
            second: None,
            operator: None,
        }
    }
}

/// Parses an operator element.
fn parse_operator(raw: &Value) -> InventoryResult<FilterOperator> {
    match raw {
        Value::String(symbol) => FilterOperator::parse(symbol),
        other => {
            Err(InventoryError::invalid_operator("Invalid operator")
                .with("operator", other.clone()))
        }
    }
}

/// Builds a shape error carrying the first value and the operator element.
fn shape_error(column: &str, message: &str, items: &[Value]) -> InventoryError {
    InventoryError::request_shape(message)
        .with(column, items.first().cloned().unwrap_or(Value::Null))
        .with("operator", items.get(1).cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::FilterClause;
    use crate::core::ColumnType;
    use crate::core::ColumnValue;
    use crate::core::ErrorKind;
    use crate::query::filter::FilterOperator;
    use crate::query::filter::FilterPredicate;

    #[test]
    fn bare_values_use_the_default_predicate() {
        let clause = FilterClause::from_json("name", &json!("PEN")).ok();
        let predicate = clause.and_then(|clause| clause.predicate(ColumnType::Text).ok());
        assert_eq!(predicate, Some(FilterPredicate::Default(ColumnValue::text("pen"))));
    }

    #[test]
    fn between_is_normalized_and_coerced() {
        let clause = FilterClause::from_json("quantity", &json!(["9", 3, "--"])).ok();
        assert_eq!(clause.as_ref().and_then(|c| c.operator), Some(FilterOperator::Between));
        let predicate = clause.and_then(|clause| clause.predicate(ColumnType::Integer).ok());
        assert_eq!(
            predicate,
            Some(FilterPredicate::Between {
                min: ColumnValue::Integer(3),
                max: ColumnValue::Integer(9),
            })
        );
    }

    #[test]
    fn between_without_second_value_is_rejected() {
        let error = FilterClause::from_json("quantity", &json!([3, "--"])).err();
        assert_eq!(
            error.as_ref().map(|err| err.message()),
            Some("The operator requires a second value")
        );
        assert_eq!(error.and_then(|err| err.context("operator").cloned()), Some(json!("--")));
    }

    #[test]
    fn extra_values_without_between_are_rejected() {
        let error = FilterClause::from_json("quantity", &json!([3, 4, "=="])).err();
        assert_eq!(error.map(|err| err.kind()), Some(ErrorKind::RequestShape));
    }

    #[test]
    fn unknown_operator_is_reported() {
        let error = FilterClause::from_json("name", &json!(["pen", "~~"])).err();
        assert_eq!(error.map(|err| err.kind()), Some(ErrorKind::InvalidOperator));
    }

    #[test]
    fn clause_integers_admit_low_identifiers() {
        let clause = FilterClause::from_json("id", &json!([1, "=="])).ok();
        let predicate = clause.and_then(|clause| clause.predicate(ColumnType::Integer).ok());
        assert_eq!(predicate, Some(FilterPredicate::Equal(ColumnValue::Integer(1))));
    }
}
