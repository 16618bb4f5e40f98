// crates/stockroom-core/src/query/search.rs
// ============================================================================
// Module: Stockroom Search Engine
// Description: Binary search and equal-key run expansion over sorted rows.
// Purpose: Locate all rows holding a value, or the boundary where it would sit.
// Dependencies: crate::core, crate::query
// ============================================================================

//! ## Overview
//! [`binary_search`] bisects a slice sorted by one column and reports the
//! index it stopped at, flagged exact or not. [`equal_run`] widens an exact
//! hit into the inclusive bounds of every row sharing the key. The boundary
//! helpers turn a search hit into the insertion points used by range filters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use crate::core::ColumnValue;
use crate::query::ColumnRead;

// ============================================================================
// SECTION: Search Hit
// ============================================================================

/// Outcome of a binary search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    /// Matching index when `exact`, otherwise the last index examined.
    pub index: usize,
    /// Whether the row at `index` holds the key.
    pub exact: bool,
}

/// Inclusive bounds of the rows sharing one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqualRun {
    /// First index of the run.
    pub start: usize,
    /// Last index of the run.
    pub end: usize,
}

impl EqualRun {
    /// Returns the run's row positions.
    #[must_use]
    pub const fn positions(self) -> RangeInclusive<usize> {
        self.start ..= self.end
    }
}

// ============================================================================
// SECTION: Binary Search
// ============================================================================

/// Bisects `rows` (sorted ascending by `column`) for `key`.
///
/// Returns `None` only for an empty slice. When no row holds the key the
/// hit carries the last index examined, which is adjacent to the insertion
/// point.
#[must_use]
pub fn binary_search<T: ColumnRead>(
    rows: &[T],
    key: &ColumnValue,
    column: usize,
) -> Option<SearchHit> {
    if rows.is_empty() {
        return None;
    }
    let mut low = 0usize;
    let mut high = rows.len();
    let mut last = 0usize;
    while low < high {
        let mid = low + (high - low) / 2;
        last = mid;
        match rows[mid].column_value(column).cmp(key) {
            Ordering::Equal => {
                return Some(SearchHit {
                    index: mid,
                    exact: true,
                });
            }
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
        }
    }
    Some(SearchHit {
        index: last,
        exact: false,
    })
}

/// Expands an index into the inclusive run of rows equal to `key`.
///
/// When the row at `index` does not hold the key the run is `[index, index]`.
#[must_use]
pub fn equal_run<T: ColumnRead>(
    rows: &[T],
    index: usize,
    key: &ColumnValue,
    column: usize,
) -> EqualRun {
    let mut start = index;
    while start > 0 && rows[start - 1].column_value(column) == key {
        start -= 1;
    }
    let mut end = index;
    while end + 1 < rows.len() && rows[end + 1].column_value(column) == key {
        end += 1;
    }
    EqualRun {
        start,
        end,
    }
}

/// Finds the full run of rows equal to `key`, if any.
#[must_use]
pub fn find_run<T: ColumnRead>(rows: &[T], key: &ColumnValue, column: usize) -> Option<EqualRun> {
    let hit = binary_search(rows, key, column)?;
    hit.exact.then(|| equal_run(rows, hit.index, key, column))
}

// ============================================================================
// SECTION: Boundaries
// ============================================================================

/// Returns the first index whose value is not less than `key`.
#[must_use]
pub fn lower_boundary<T: ColumnRead>(rows: &[T], key: &ColumnValue, column: usize) -> usize {
    match binary_search(rows, key, column) {
        None => 0,
        Some(hit) if hit.exact => equal_run(rows, hit.index, key, column).start,
        Some(hit) => insertion_point(rows, hit.index, key, column),
    }
}

/// Returns one past the last index whose value is not greater than `key`.
#[must_use]
pub fn upper_boundary<T: ColumnRead>(rows: &[T], key: &ColumnValue, column: usize) -> usize {
    match binary_search(rows, key, column) {
        None => 0,
        Some(hit) if hit.exact => equal_run(rows, hit.index, key, column).end + 1,
        Some(hit) => insertion_point(rows, hit.index, key, column),
    }
}

/// Converts a non-exact search hit into the insertion point for `key`.
fn insertion_point<T: ColumnRead>(
    rows: &[T],
    index: usize,
    key: &ColumnValue,
    column: usize,
) -> usize {
    if rows[index].column_value(column) > key { index } else { index + 1 }
}
