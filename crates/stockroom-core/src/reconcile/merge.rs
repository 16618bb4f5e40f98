// crates/stockroom-core/src/reconcile/merge.rs
// ============================================================================
// Module: Stockroom Duplicate Merge
// Description: Folds request records sharing a match key.
// Purpose: Collapse in-batch duplicates before store cross-referencing.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`merge_duplicates`] builds a fresh output in one pass: the first record
//! for each key claims an output slot and later records with the same key are
//! folded into it with [`fold_record`]. Summed fields add up; agreed fields
//! (rename targets) must match exactly or the merge fails with a conflict.
//! Merging is idempotent: the output holds no duplicate keys.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::core::RequestRecord;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Message returned when duplicates disagree on an agreed field.
pub const DUPLICATE_CONFLICT_MESSAGE: &str = "Duplicate name, please resolve conflict";

/// How records sharing a key are folded.
#[derive(Debug, Clone, Copy)]
pub struct MergeRules<'a> {
    /// Match key identifying duplicates.
    pub key: &'a str,
    /// Integer fields summed across duplicates.
    pub summed: &'a [&'a str],
    /// Fields that must agree across duplicates.
    pub agreed: &'a [&'a str],
}

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Merges records sharing `rules.key`, keeping first-seen order.
///
/// Records missing the key pass through unmerged.
///
/// # Errors
///
/// Returns a conflict error naming both records when an agreed field differs.
pub fn merge_duplicates(
    records: Vec<RequestRecord>,
    rules: &MergeRules<'_>,
) -> InventoryResult<Vec<RequestRecord>> {
    let mut merged: Vec<RequestRecord> = Vec::with_capacity(records.len());
    let mut slots: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let Some(key) = record.get(rules.key).map(Value::to_string) else {
            merged.push(record);
            continue;
        };
        match slots.get(&key) {
            Some(&slot) => {
                let folded = fold_record(&merged[slot], &record, rules)?;
                merged[slot] = folded;
            }
            None => {
                slots.insert(key, merged.len());
                merged.push(record);
            }
        }
    }
    Ok(merged)
}

/// Folds `later` into `base`, returning the merged record.
///
/// # Errors
///
/// Returns a conflict error when an agreed field is present on both records
/// with different values.
pub fn fold_record(
    base: &RequestRecord,
    later: &RequestRecord,
    rules: &MergeRules<'_>,
) -> InventoryResult<RequestRecord> {
    let mut folded = base.clone();
    for field in rules.agreed {
        match (base.get(field), later.get(field)) {
            (Some(left), Some(right)) if left != right => {
                return Err(InventoryError::conflict(DUPLICATE_CONFLICT_MESSAGE)
                    .with_record(base.to_json())
                    .with_record(later.to_json()));
            }
            (None, Some(right)) => folded.set(*field, right.clone()),
            _ => {}
        }
    }
    for field in rules.summed {
        match (base.integer(field), later.integer(field)) {
            (Some(left), Some(right)) => folded.set(*field, left.saturating_add(right)),
            (None, Some(right)) => folded.set(*field, right),
            _ => {}
        }
    }
    Ok(folded)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use serde_json::json;

    use super::MergeRules;
    use super::merge_duplicates;
    use crate::core::ErrorKind;
    use crate::core::RequestRecord;

    const EDIT: MergeRules<'static> = MergeRules {
        key: "name",
        summed: &["new_quantity"],
        agreed: &["new_name"],
    };

    fn records(value: serde_json::Value) -> Vec<RequestRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn duplicate_quantities_are_summed() {
        let batch = records(json!([
            {"name": "pen", "new_quantity": 5},
            {"name": "ink", "new_quantity": 2},
            {"name": "pen", "new_quantity": 3}
        ]));
        let merged = merge_duplicates(batch, &EDIT).unwrap();
        assert_eq!(
            merged,
            records(json!([{"name": "pen", "new_quantity": 8}, {"name": "ink", "new_quantity": 2}]))
        );
        assert_eq!(merge_duplicates(merged.clone(), &EDIT).unwrap(), merged);
    }

    #[test]
    fn rename_target_is_adopted_from_later_duplicate() {
        let batch = records(json!([{"name": "pen", "new_quantity": 4}, {"name": "pen", "new_name": "quill"}]));
        let merged = merge_duplicates(batch, &EDIT).unwrap();
        assert_eq!(merged, records(json!([{"name": "pen", "new_quantity": 4, "new_name": "quill"}])));
    }

    #[test]
    fn disagreeing_rename_targets_conflict() {
        let batch = records(json!([{"name": "pen", "new_name": "a"}, {"name": "pen", "new_name": "b"}]));
        let error = merge_duplicates(batch, &EDIT).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(error.records().len(), 2);
    }
}
