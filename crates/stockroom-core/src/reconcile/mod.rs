// crates/stockroom-core/src/reconcile/mod.rs
// ============================================================================
// Module: Stockroom Reconciliation
// Description: Merge, conflict detection, cross-reference, classification.
// Purpose: Turn a validated write batch into store mutations and a report.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Write batches flow through four stages:
//!
//! 1. [`merge_duplicates`] folds records sharing a match key.
//! 2. [`detect_rename_conflicts`] rejects colliding rename targets.
//! 3. [`split_against_store`] splits the batch against stored rows.
//! 4. The `classify_*` functions emit mutations and log entries.
//!
//! Every stage returns new values; no stage mutates a peer record while
//! comparing against it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod classify;
pub mod conflict;
pub mod crossref;
pub mod merge;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classify::Actor;
pub use classify::Classified;
pub use classify::Ledger;
pub use classify::TransactionLayout;
pub use classify::classify_client_inserts;
pub use classify::classify_client_removals;
pub use classify::classify_client_renames;
pub use classify::classify_product_edits;
pub use classify::classify_product_inserts;
pub use classify::classify_product_removals;
pub use classify::classify_purchases;
pub use classify::client_ledger;
pub use conflict::detect_rename_conflicts;
pub use crossref::Coverage;
pub use crossref::CrossReference;
pub use crossref::EntityLayout;
pub use crossref::RenameScreen;
pub use crossref::screen_rename_targets;
pub use crossref::split_against_store;
pub use merge::MergeRules;
pub use merge::fold_record;
pub use merge::merge_duplicates;
