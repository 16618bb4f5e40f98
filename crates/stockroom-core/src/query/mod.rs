// crates/stockroom-core/src/query/mod.rs
// ============================================================================
// Module: Stockroom Query Layer
// Description: Sorting, searching, filtering, ordering, and presentation.
// Purpose: Answer read requests over fetched rows without storage queries.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The query layer works on rows already fetched from storage. Every engine
//! addresses columns by positional index resolved once from the schema
//! descriptor; sorts and searches are transient and recomputed per request.
//!
//! Engines are generic over [`ColumnRead`] so they run on plain [`Row`]
//! values and on any wrapper that exposes positional column access.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clause;
pub mod evaluator;
pub mod filter;
pub mod order;
pub mod present;
pub mod search;
pub mod sort;
pub mod view;

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ColumnValue;
use crate::core::Row;

// ============================================================================
// SECTION: Column Access
// ============================================================================

/// Positional column access used by the sort, search, and filter engines.
pub trait ColumnRead {
    /// Returns the value stored at a column index.
    fn column_value(&self, column: usize) -> &ColumnValue;
}

impl ColumnRead for Row {
    fn column_value(&self, column: usize) -> &ColumnValue {
        self.value(column)
    }
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clause::FilterClause;
pub use evaluator::FilterOutcome;
pub use evaluator::FilterQuery;
pub use evaluator::ResultEntry;
pub use evaluator::evaluate;
pub use filter::FilterOperator;
pub use filter::FilterPredicate;
pub use filter::apply_filter;
pub use order::SortOrder;
pub use order::order_entries;
pub use present::present;
pub use present::row_object;
pub use search::EqualRun;
pub use search::SearchHit;
pub use search::binary_search;
pub use search::equal_run;
pub use search::find_run;
pub use sort::merge_sort;
pub use view::ViewRequest;
pub use view::run_view;
