// crates/stockroom-core/src/query/filter.rs
// ============================================================================
// Module: Stockroom Filter Engine
// Description: Operator-specific predicates over rows sorted by one column.
// Purpose: Narrow fetched rows by equality, range, between, and pattern tests.
// Dependencies: crate::core, crate::query::{search, sort}
// ============================================================================

//! ## Overview
//! A [`FilterPredicate`] is built from an optional operator symbol and one or
//! two coerced values. [`apply_filter`] sorts the input by the target column,
//! then resolves equality and range predicates through the search engine and
//! pattern predicates by scanning. With no operator the default predicate
//! widens with needle length: exact matches always, prefix and suffix matches
//! from three characters, substring matches from five.
//!
//! Range symbols read as `value <op> column`: `<=` keeps rows at or above
//! the value, `>=` keeps rows at or below it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use crate::core::ColumnValue;
use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::query::ColumnRead;
use crate::query::search::find_run;
use crate::query::search::lower_boundary;
use crate::query::search::upper_boundary;
use crate::query::sort::merge_sort;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message returned when a filter leaves no rows.
pub const NOT_FOUND_MESSAGE: &str = "Information not found with the search criteria";
/// Minimum needle length for default prefix/suffix widening.
pub const DEFAULT_AFFIX_MIN_CHARS: usize = 3;
/// Minimum needle length for default substring widening.
pub const DEFAULT_CONTAINS_MIN_CHARS: usize = 5;

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Filter operator symbols accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// `==` exact match.
    Equal,
    /// `<=` rows whose value is at or above the pivot.
    AtLeast,
    /// `>=` rows whose value is at or below the pivot.
    AtMost,
    /// `--` closed range between two values.
    Between,
    /// `**` substring containment.
    Contains,
    /// `*a` prefix match.
    StartsWith,
    /// `a*` suffix match.
    EndsWith,
}

impl FilterOperator {
    /// Parses an operator symbol.
    ///
    /// # Errors
    ///
    /// Returns an invalid-operator error for unknown symbols.
    pub fn parse(symbol: &str) -> InventoryResult<Self> {
        match symbol {
            "==" => Ok(Self::Equal),
            "<=" => Ok(Self::AtLeast),
            ">=" => Ok(Self::AtMost),
            "--" => Ok(Self::Between),
            "**" => Ok(Self::Contains),
            "*a" => Ok(Self::StartsWith),
            "a*" => Ok(Self::EndsWith),
            other => {
                Err(InventoryError::invalid_operator("Invalid operator").with("operator", other))
            }
        }
    }

    /// Returns the wire symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::AtLeast => "<=",
            Self::AtMost => ">=",
            Self::Between => "--",
            Self::Contains => "**",
            Self::StartsWith => "*a",
            Self::EndsWith => "a*",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Resolved single-column predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPredicate {
    /// Exact match.
    Equal(ColumnValue),
    /// Value at or above the pivot.
    AtLeast(ColumnValue),
    /// Value at or below the pivot.
    AtMost(ColumnValue),
    /// Closed range, normalized so `min <= max`.
    Between {
        /// Lower bound.
        min: ColumnValue,
        /// Upper bound.
        max: ColumnValue,
    },
    /// Text form contains the needle.
    Contains(String),
    /// Text form starts with the needle.
    StartsWith(String),
    /// Text form ends with the needle.
    EndsWith(String),
    /// No operator: exact match widened by needle length.
    Default(ColumnValue),
}

impl FilterPredicate {
    /// Builds a predicate from an operator and coerced values.
    ///
    /// # Errors
    ///
    /// Returns a request-shape error when the number of values does not fit
    /// the operator.
    pub fn new(
        operator: Option<FilterOperator>,
        value: ColumnValue,
        second: Option<ColumnValue>,
    ) -> InventoryResult<Self> {
        let predicate = match (operator, second) {
            (None, None) => Self::Default(value),
            (Some(FilterOperator::Between), Some(second)) => {
                let (min, max) = if second < value { (second, value) } else { (value, second) };
                Self::Between {
                    min,
                    max,
                }
            }
            (Some(FilterOperator::Between), None) => {
                return Err(InventoryError::request_shape("The operator requires a second value")
                    .with("operator", FilterOperator::Between.symbol()));
            }
            (Some(FilterOperator::Equal), None) => Self::Equal(value),
            (Some(FilterOperator::AtLeast), None) => Self::AtLeast(value),
            (Some(FilterOperator::AtMost), None) => Self::AtMost(value),
            (Some(FilterOperator::Contains), None) => Self::Contains(value.text_form()),
            (Some(FilterOperator::StartsWith), None) => Self::StartsWith(value.text_form()),
            (Some(FilterOperator::EndsWith), None) => Self::EndsWith(value.text_form()),
            (operator, Some(_)) => {
                return Err(InventoryError::request_shape(FORMAT_MESSAGE)
                    .with("operator", operator.map_or("", FilterOperator::symbol)));
            }
        };
        Ok(predicate)
    }

    /// Tests a single column value.
    #[must_use]
    pub fn matches(&self, value: &ColumnValue) -> bool {
        match self {
            Self::Equal(pivot) => value == pivot,
            Self::AtLeast(pivot) => value >= pivot,
            Self::AtMost(pivot) => value <= pivot,
            Self::Between {
                min,
                max,
            } => value >= min && value <= max,
            Self::Contains(needle) => value.text_form().contains(needle.as_str()),
            Self::StartsWith(needle) => starts_with_chars(&value.text_form(), needle),
            Self::EndsWith(needle) => ends_with_chars(&value.text_form(), needle),
            Self::Default(pivot) => default_matches(pivot, value),
        }
    }
}

/// Message for clause shapes that carry too many values.
pub const FORMAT_MESSAGE: &str = "Inappropriate search format, one value and one operator, except \
                                  for '--', where two search values of the same type and one \
                                  operator are required";

// ============================================================================
// SECTION: Filter Application
// ============================================================================

/// Applies a predicate to rows, sorting them by `column` first.
///
/// Output rows are in ascending order of the target column.
///
/// # Errors
///
/// Returns a not-found error when no row satisfies the predicate.
pub fn apply_filter<T: ColumnRead + Clone>(
    rows: Vec<T>,
    column: usize,
    predicate: &FilterPredicate,
) -> InventoryResult<Vec<T>> {
    let filtered = if rows.len() == 1 {
        rows.into_iter().filter(|row| predicate.matches(row.column_value(column))).collect()
    } else {
        let sorted = merge_sort(rows, column);
        filter_sorted(&sorted, column, predicate)
    };
    if filtered.is_empty() {
        return Err(InventoryError::not_found(NOT_FOUND_MESSAGE));
    }
    Ok(filtered)
}

/// Applies a predicate to rows already sorted by `column`.
fn filter_sorted<T: ColumnRead + Clone>(
    sorted: &[T],
    column: usize,
    predicate: &FilterPredicate,
) -> Vec<T> {
    match predicate {
        FilterPredicate::Equal(pivot) => find_run(sorted, pivot, column)
            .map(|run| sorted[run.positions()].to_vec())
            .unwrap_or_default(),
        FilterPredicate::AtLeast(pivot) => {
            sorted[lower_boundary(sorted, pivot, column) ..].to_vec()
        }
        FilterPredicate::AtMost(pivot) => sorted[.. upper_boundary(sorted, pivot, column)].to_vec(),
        FilterPredicate::Between {
            min,
            max,
        } => {
            let start = lower_boundary(sorted, min, column);
            let end = upper_boundary(sorted, max, column);
            if start < end { sorted[start .. end].to_vec() } else { Vec::new() }
        }
        FilterPredicate::Contains(_)
        | FilterPredicate::StartsWith(_)
        | FilterPredicate::EndsWith(_) => scan(sorted, column, predicate),
        FilterPredicate::Default(pivot) => default_union(sorted, column, pivot),
    }
}

/// Keeps rows whose column value satisfies the predicate.
fn scan<T: ColumnRead + Clone>(rows: &[T], column: usize, predicate: &FilterPredicate) -> Vec<T> {
    rows.iter().filter(|row| predicate.matches(row.column_value(column))).cloned().collect()
}

/// Unions exact, affix, and substring matches for the default predicate.
fn default_union<T: ColumnRead + Clone>(
    sorted: &[T],
    column: usize,
    pivot: &ColumnValue,
) -> Vec<T> {
    let mut hits: BTreeSet<usize> = BTreeSet::new();
    if let Some(run) = find_run(sorted, pivot, column) {
        hits.extend(run.positions());
    }
    if let Some(needle) = pivot.as_text() {
        let length = needle.chars().count();
        for (index, row) in sorted.iter().enumerate() {
            let text = row.column_value(column).text_form();
            let affix = length >= DEFAULT_AFFIX_MIN_CHARS
                && (starts_with_chars(&text, needle) || ends_with_chars(&text, needle));
            let within = length >= DEFAULT_CONTAINS_MIN_CHARS && text.contains(needle);
            if affix || within {
                hits.insert(index);
            }
        }
    }
    hits.into_iter().map(|index| sorted[index].clone()).collect()
}

/// Single-value form of the default predicate.
fn default_matches(pivot: &ColumnValue, value: &ColumnValue) -> bool {
    if value == pivot {
        return true;
    }
    let Some(needle) = pivot.as_text() else {
        return false;
    };
    let length = needle.chars().count();
    let text = value.text_form();
    (length >= DEFAULT_AFFIX_MIN_CHARS
        && (starts_with_chars(&text, needle) || ends_with_chars(&text, needle)))
        || (length >= DEFAULT_CONTAINS_MIN_CHARS && text.contains(needle))
}

// ============================================================================
// SECTION: Pattern Helpers
// ============================================================================

/// Compares characters from the front.
fn starts_with_chars(value: &str, needle: &str) -> bool {
    value.chars().count() >= needle.chars().count()
        && value.chars().zip(needle.chars()).all(|(left, right)| left == right)
}

/// Compares characters from the back.
fn ends_with_chars(value: &str, needle: &str) -> bool {
    value.chars().count() >= needle.chars().count()
        && value.chars().rev().zip(needle.chars().rev()).all(|(left, right)| left == right)
}

#[cfg(test)]
mod tests {
    use super::FilterOperator;
    use super::FilterPredicate;
    use super::apply_filter;
    use crate::core::ColumnValue;
    use crate::core::ErrorKind;
    use crate::core::Row;

    fn names(values: &[&str]) -> Vec<Row> {
        values.iter().map(|value| Row::new(vec![ColumnValue::text(*value)])).collect()
    }

    fn texts(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|row| row.value(0).text_form()).collect()
    }

    fn run(rows: Vec<Row>, predicate: &FilterPredicate) -> Vec<String> {
        apply_filter(rows, 0, predicate).map(|rows| texts(&rows)).unwrap_or_default()
    }

    #[test]
    fn contains_handles_repeated_characters() {
        let rows = names(&["aab", "abab", "aaab", "ba"]);
        let predicate = FilterPredicate::Contains("aab".to_string());
        assert_eq!(run(rows, &predicate), vec!["aaab", "aab"]);
    }

    #[test]
    fn affix_operators_compare_from_each_end() {
        let rows = names(&["pencil", "pen", "open", "ink"]);
        assert_eq!(
            run(rows.clone(), &FilterPredicate::StartsWith("pen".to_string())),
            vec!["pen", "pencil"]
        );
        assert_eq!(run(rows, &FilterPredicate::EndsWith("pen".to_string())), vec!["open", "pen"]);
    }

    #[test]
    fn range_symbols_read_value_then_column() {
        let rows: Vec<Row> =
            [5, 1, 9, 3].iter().map(|v| Row::new(vec![ColumnValue::Integer(*v)])).collect();
        let at_least = FilterPredicate::new(
            Some(FilterOperator::AtLeast),
            ColumnValue::Integer(3),
            None,
        );
        let Ok(at_least) = at_least else { return };
        assert_eq!(run(rows.clone(), &at_least), vec!["3", "5", "9"]);
        let Ok(at_most) =
            FilterPredicate::new(Some(FilterOperator::AtMost), ColumnValue::Integer(4), None)
        else {
            return;
        };
        assert_eq!(run(rows, &at_most), vec!["1", "3"]);
    }

    #[test]
    fn default_predicate_widens_by_length() {
        let rows = names(&["ab", "abx", "xab", "xxabxx", "abcd", "abcdz", "zabcdz", "zzabcdez"]);
        let two = FilterPredicate::Default(ColumnValue::text("ab"));
        assert_eq!(run(rows.clone(), &two), vec!["ab"]);
        let four = FilterPredicate::Default(ColumnValue::text("abcd"));
        assert_eq!(run(rows.clone(), &four), vec!["abcd", "abcdz"]);
        let five = FilterPredicate::Default(ColumnValue::text("abcde"));
        assert_eq!(run(rows, &five), vec!["zzabcdez"]);
        let rows = names(&["abcdef", "abcdefz", "zabcdef", "zabcdefz", "abcdez", "xyz"]);
        let four = FilterPredicate::Default(ColumnValue::text("abcd"));
        assert_eq!(run(rows.clone(), &four), vec!["abcdef", "abcdefz", "abcdez"]);
        let six = FilterPredicate::Default(ColumnValue::text("abcdef"));
        assert_eq!(run(rows, &six), vec!["abcdef", "abcdefz", "zabcdef", "zabcdefz"]);
    }

    #[test]
    fn single_row_is_matched_directly() {
        let rows = names(&["pen"]);
        assert_eq!(run(rows.clone(), &FilterPredicate::Equal(ColumnValue::text("pen"))), ["pen"]);
        let missing = apply_filter(rows, 0, &FilterPredicate::Equal(ColumnValue::text("ink")));
        assert_eq!(missing.err().map(|err| err.kind()), Some(ErrorKind::NotFound));
    }

    #[test]
    fn unknown_symbol_is_invalid_operator() {
        let error = FilterOperator::parse("~=").err();
        assert_eq!(error.map(|err| err.kind()), Some(ErrorKind::InvalidOperator));
    }
}
