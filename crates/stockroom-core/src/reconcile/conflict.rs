// crates/stockroom-core/src/reconcile/conflict.rs
// ============================================================================
// Module: Stockroom Rename Conflicts
// Description: Pairwise rename-target checks across a merged batch.
// Purpose: Reject batches whose renames collide with each other.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Runs after duplicate merging. Two checks apply to every pair of records:
//! two different sources may not target the same new name, and a new name may
//! not equal another record's current name unless that record is itself being
//! renamed away. Swaps (`a -> b`, `b -> a`) are therefore allowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::core::RequestRecord;
use crate::core::Table;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Two different sources target one new name.
pub const SHARED_TARGET_MESSAGE: &str = "New name duplicate found";
/// A new product name collides with a product name that stays in place.
pub const PRODUCT_TARGET_IN_USE_MESSAGE: &str = "New name cannot match a product's name";
/// A new client name collides with a client name that stays in place.
pub const CLIENT_TARGET_IN_USE_MESSAGE: &str = "New name cannot match a client's name";

/// Returns the in-use message for a named table.
const fn target_in_use_message(table: Table) -> &'static str {
    match table {
        Table::Clients => CLIENT_TARGET_IN_USE_MESSAGE,
        Table::Products | Table::Transactions => PRODUCT_TARGET_IN_USE_MESSAGE,
    }
}

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Checks every pair of records for rename collisions.
///
/// `key` names the current-name field and `rename` the target field; `table`
/// selects the wording of the in-use message.
///
/// # Errors
///
/// Returns a conflict error carrying both offending records.
pub fn detect_rename_conflicts(
    records: &[RequestRecord],
    table: Table,
    key: &str,
    rename: &str,
) -> InventoryResult<()> {
    for (index, record) in records.iter().enumerate() {
        let Some(target) = record.get(rename) else {
            continue;
        };
        for (other_index, other) in records.iter().enumerate() {
            if other_index == index || other.get(key) == record.get(key) {
                continue;
            }
            if other_index > index && other.get(rename) == Some(target) {
                return Err(pair_error(SHARED_TARGET_MESSAGE, record, other));
            }
            if other.get(key) == Some(target) && !other.contains(rename) {
                return Err(pair_error(target_in_use_message(table), record, other));
            }
        }
    }
    Ok(())
}

/// Builds a conflict error naming two records.
fn pair_error(message: &str, first: &RequestRecord, second: &RequestRecord) -> InventoryError {
    InventoryError::conflict(message).with_record(first.to_json()).with_record(second.to_json())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use serde_json::json;

    use super::PRODUCT_TARGET_IN_USE_MESSAGE;
    use super::SHARED_TARGET_MESSAGE;
    use super::detect_rename_conflicts;
    use crate::core::RequestRecord;
    use crate::core::Table;

    fn check(value: serde_json::Value) -> Option<String> {
        let records: Vec<RequestRecord> = serde_json::from_value(value).unwrap();
        detect_rename_conflicts(&records, Table::Products, "name", "new_name")
            .err()
            .map(|err| err.message().to_string())
    }

    #[test]
    fn shared_target_is_rejected() {
        let outcome = check(json!([{"name": "a", "new_name": "x"}, {"name": "b", "new_name": "x"}]));
        assert_eq!(outcome.as_deref(), Some(SHARED_TARGET_MESSAGE));
    }

    #[test]
    fn target_matching_a_kept_name_is_rejected() {
        let outcome = check(json!([{"name": "a", "new_name": "b"}, {"name": "b", "new_quantity": 4}]));
        assert_eq!(outcome.as_deref(), Some(PRODUCT_TARGET_IN_USE_MESSAGE));
    }

    #[test]
    fn swaps_are_allowed() {
        let outcome = check(json!([{"name": "a", "new_name": "b"}, {"name": "b", "new_name": "a"}]));
        assert_eq!(outcome, None);
    }
}
