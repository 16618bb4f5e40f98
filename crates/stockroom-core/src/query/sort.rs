// crates/stockroom-core/src/query/sort.rs
// ============================================================================
// Module: Stockroom Sort Engine
// Description: Stable merge sort over rows by column index.
// Purpose: Order fetched rows before searching, filtering, or presentation.
// Dependencies: crate::query
// ============================================================================

//! ## Overview
//! Textbook top-down merge sort. Ties take the left head first, so equal keys
//! keep their input order, stay contiguous, and are never dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::query::ColumnRead;

// ============================================================================
// SECTION: Merge Sort
// ============================================================================

/// Sorts rows ascending by the value at `column`.
#[must_use]
pub fn merge_sort<T: ColumnRead>(mut rows: Vec<T>, column: usize) -> Vec<T> {
    if rows.len() <= 1 {
        return rows;
    }
    let right = rows.split_off(rows.len() / 2);
    let left = merge_sort(rows, column);
    let right = merge_sort(right, column);
    merge(left, right, column)
}

/// Merges two sorted runs, preferring the left run on ties.
fn merge<T: ColumnRead>(left: Vec<T>, right: Vec<T>, column: usize) -> Vec<T> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.column_value(column) <= r.column_value(column),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        if let Some(row) = next {
            merged.push(row);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::merge_sort;
    use crate::core::ColumnValue;
    use crate::core::Row;

    fn row(id: i64, name: &str) -> Row {
        Row::new(vec![ColumnValue::Integer(id), ColumnValue::text(name)])
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let rows = vec![row(1, "b"), row(2, "a"), row(3, "b"), row(4, "a"), row(5, "b")];
        let sorted = merge_sort(rows, 1);
        let ids: Vec<_> = sorted.iter().map(|row| row.value(0).clone()).collect();
        assert_eq!(
            ids,
            vec![
                ColumnValue::Integer(2),
                ColumnValue::Integer(4),
                ColumnValue::Integer(1),
                ColumnValue::Integer(3),
                ColumnValue::Integer(5),
            ]
        );
    }

    #[test]
    fn trivial_inputs_are_returned_unchanged() {
        assert!(merge_sort(Vec::<Row>::new(), 0).is_empty());
        assert_eq!(merge_sort(vec![row(9, "z")], 1), vec![row(9, "z")]);
    }
}
