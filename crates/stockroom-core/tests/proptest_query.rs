// crates/stockroom-core/tests/proptest_query.rs
// ============================================================================
// Module: Query Engine Property-Based Tests
// Description: Property tests for sorting, searching, and filtering.
// Purpose: Check ordering, stability, and range invariants on wide inputs.
// ============================================================================

//! Property-based tests for query engine invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use stockroom_core::ColumnValue;
use stockroom_core::Row;
use stockroom_core::query::FilterOperator;
use stockroom_core::query::FilterPredicate;
use stockroom_core::query::apply_filter;
use stockroom_core::query::find_run;
use stockroom_core::query::merge_sort;

/// Builds rows of `(key, arrival)` so stability can be observed.
fn keyed_rows(keys: &[i64]) -> Vec<Row> {
    keys.iter()
        .zip(0_i64 ..)
        .map(|(key, arrival)| {
            Row::new(vec![ColumnValue::Integer(*key), ColumnValue::Integer(arrival)])
        })
        .collect()
}

fn key_of(row: &Row) -> i64 {
    row.value(0).as_integer().unwrap()
}

fn arrival_of(row: &Row) -> i64 {
    row.value(1).as_integer().unwrap()
}

fn text_rows(words: &[String]) -> Vec<Row> {
    words.iter().map(|word| Row::new(vec![ColumnValue::text(word.as_str())])).collect()
}

proptest! {
    #[test]
    fn sort_orders_and_keeps_length(keys in prop::collection::vec(-50_i64 .. 50, 0 .. 64)) {
        let sorted = merge_sort(keyed_rows(&keys), 0);
        prop_assert_eq!(sorted.len(), keys.len());
        prop_assert!(sorted.windows(2).all(|pair| key_of(&pair[0]) <= key_of(&pair[1])));
    }

    #[test]
    fn sort_is_stable(keys in prop::collection::vec(0_i64 .. 5, 0 .. 64)) {
        let sorted = merge_sort(keyed_rows(&keys), 0);
        for pair in sorted.windows(2) {
            if key_of(&pair[0]) == key_of(&pair[1]) {
                prop_assert!(arrival_of(&pair[0]) < arrival_of(&pair[1]));
            }
        }
    }

    #[test]
    fn sort_is_idempotent(keys in prop::collection::vec(-20_i64 .. 20, 0 .. 48)) {
        let once = merge_sort(keyed_rows(&keys), 0);
        let twice = merge_sort(once.clone(), 0);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn run_covers_every_equal_row(
        keys in prop::collection::vec(0_i64 .. 10, 1 .. 64),
        needle in 0_i64 .. 10,
    ) {
        let sorted = merge_sort(keyed_rows(&keys), 0);
        let expected = keys.iter().filter(|key| **key == needle).count();
        match find_run(&sorted, &ColumnValue::Integer(needle), 0) {
            Some(run) => {
                prop_assert_eq!(run.positions().count(), expected);
                prop_assert!(sorted[run.positions()].iter().all(|row| key_of(row) == needle));
            }
            None => prop_assert_eq!(expected, 0),
        }
    }

    #[test]
    fn equality_filter_matches_a_linear_scan(
        keys in prop::collection::vec(0_i64 .. 8, 2 .. 48),
        needle in 0_i64 .. 8,
    ) {
        let predicate =
            FilterPredicate::new(Some(FilterOperator::Equal), ColumnValue::Integer(needle), None)
                .unwrap();
        let expected: Vec<i64> = {
            let mut hits: Vec<i64> = keys
                .iter()
                .zip(0_i64 ..)
                .filter(|(key, _)| **key == needle)
                .map(|(_, arrival)| arrival)
                .collect();
            hits.sort_unstable();
            hits
        };
        match apply_filter(keyed_rows(&keys), 0, &predicate) {
            Ok(rows) => {
                let arrivals: Vec<i64> = rows.iter().map(arrival_of).collect();
                prop_assert_eq!(arrivals, expected);
            }
            Err(_) => prop_assert!(expected.is_empty()),
        }
    }

    #[test]
    fn between_ignores_bound_order(
        keys in prop::collection::vec(-30_i64 .. 30, 2 .. 48),
        low in -30_i64 .. 30,
        high in -30_i64 .. 30,
    ) {
        let forward = FilterPredicate::new(
            Some(FilterOperator::Between),
            ColumnValue::Integer(low),
            Some(ColumnValue::Integer(high)),
        )
        .unwrap();
        let backward = FilterPredicate::new(
            Some(FilterOperator::Between),
            ColumnValue::Integer(high),
            Some(ColumnValue::Integer(low)),
        )
        .unwrap();
        let left = apply_filter(keyed_rows(&keys), 0, &forward).ok();
        let right = apply_filter(keyed_rows(&keys), 0, &backward).ok();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn range_filters_split_the_table(
        keys in prop::collection::vec(-30_i64 .. 30, 2 .. 48),
        pivot in -30_i64 .. 30,
    ) {
        let at_least =
            FilterPredicate::new(Some(FilterOperator::AtLeast), ColumnValue::Integer(pivot), None)
                .unwrap();
        let at_most =
            FilterPredicate::new(Some(FilterOperator::AtMost), ColumnValue::Integer(pivot), None)
                .unwrap();
        let above = apply_filter(keyed_rows(&keys), 0, &at_least).map_or(0, |rows| rows.len());
        let below = apply_filter(keyed_rows(&keys), 0, &at_most).map_or(0, |rows| rows.len());
        let equal = keys.iter().filter(|key| **key == pivot).count();
        prop_assert_eq!(above + below, keys.len() + equal);
    }

    #[test]
    fn contains_matches_substring_search(
        words in prop::collection::vec("[a-c]{0,6}", 2 .. 24),
        needle in "[a-c]{1,3}",
    ) {
        let predicate = FilterPredicate::new(
            Some(FilterOperator::Contains),
            ColumnValue::text(needle.as_str()),
            None,
        )
        .unwrap();
        let expected = words.iter().filter(|word| word.contains(needle.as_str())).count();
        let found = apply_filter(text_rows(&words), 0, &predicate).map_or(0, |rows| rows.len());
        prop_assert_eq!(found, expected);
    }
}
