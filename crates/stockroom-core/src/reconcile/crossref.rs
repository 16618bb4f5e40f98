// crates/stockroom-core/src/reconcile/crossref.rs
// ============================================================================
// Module: Stockroom Store Cross-Reference
// Description: Splits a batch into records matched and unmatched in storage.
// Purpose: Annotate matched records with stored identifiers and quantities.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Persisted rows fetched by name are matched against the batch's match key.
//! Matched records gain the stored `id` (and the stored `quantity` for
//! tables that carry one); the rest form the unmatched remainder.
//!
//! [`screen_rename_targets`] then holds back records whose rename target is
//! already taken in storage, unless the holder of that name is renamed away
//! in the same batch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::RequestRecord;
use crate::core::Row;
use crate::core::SchemaError;
use crate::core::TableSchema;
use crate::core::record::FIELD_ID;
use crate::core::record::FIELD_QUANTITY;

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Column positions of a named entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLayout {
    /// Identifier column.
    pub id: usize,
    /// Name column.
    pub name: usize,
    /// Stock quantity column, when the table has one.
    pub quantity: Option<usize>,
}

impl EntityLayout {
    /// Resolves column positions from a table schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when `id` or `name` is missing.
    pub fn resolve(schema: &TableSchema) -> Result<Self, SchemaError> {
        Ok(Self {
            id: schema.require("id")?,
            name: schema.require("name")?,
            quantity: schema.index_of("quantity"),
        })
    }

    /// Returns the stored identifier of a row.
    #[must_use]
    pub fn id_of(&self, row: &Row) -> Option<i64> {
        row.value(self.id).as_integer()
    }

    /// Returns the stored name of a row.
    #[must_use]
    pub fn name_of<'a>(&self, row: &'a Row) -> Option<&'a str> {
        row.value(self.name).as_text()
    }

    /// Returns the stored quantity of a row.
    #[must_use]
    pub fn quantity_of(&self, row: &Row) -> Option<i64> {
        self.quantity.and_then(|column| row.value(column).as_integer())
    }
}

// ============================================================================
// SECTION: Cross-Reference
// ============================================================================

/// How much of a batch matched storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every record matched.
    All,
    /// Some records matched.
    Partial,
    /// No record matched.
    Nothing,
}

/// Batch split against stored rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReference {
    /// Records found in storage, annotated with stored fields.
    pub matched: Vec<RequestRecord>,
    /// Records not found in storage.
    pub unmatched: Vec<RequestRecord>,
}

impl CrossReference {
    /// Classifies the split.
    #[must_use]
    pub fn coverage(&self) -> Coverage {
        match (self.matched.is_empty(), self.unmatched.is_empty()) {
            (true, _) => Coverage::Nothing,
            (false, true) => Coverage::All,
            (false, false) => Coverage::Partial,
        }
    }
}

/// Splits records by whether `key` names a stored row.
#[must_use]
pub fn split_against_store(
    records: Vec<RequestRecord>,
    stored: &[Row],
    key: &str,
    layout: &EntityLayout,
) -> CrossReference {
    let by_name: BTreeMap<&str, &Row> =
        stored.iter().filter_map(|row| layout.name_of(row).map(|name| (name, row))).collect();
    let mut split = CrossReference::default();
    for mut record in records {
        let stored_row = record.text(key).and_then(|name| by_name.get(name).copied());
        match stored_row {
            Some(row) => {
                if let Some(id) = layout.id_of(row) {
                    record.set(FIELD_ID, id);
                }
                if let Some(quantity) = layout.quantity_of(row) {
                    record.set(FIELD_QUANTITY, quantity);
                }
                split.matched.push(record);
            }
            None => split.unmatched.push(record),
        }
    }
    split
}

// ============================================================================
// SECTION: Rename Screening
// ============================================================================

/// Matched records split by whether their rename can proceed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameScreen {
    /// Records that can be applied.
    pub kept: Vec<RequestRecord>,
    /// Records whose target name is taken.
    pub skipped: Vec<RequestRecord>,
}

/// Holds back renames onto names already taken in storage.
///
/// `taken` holds stored names equal to some rename target. A taken name is
/// released when a kept record renames away from it; screening repeats until
/// no further record is held back.
#[must_use]
pub fn screen_rename_targets(
    matched: Vec<RequestRecord>,
    taken: &BTreeSet<String>,
    key: &str,
    rename: &str,
) -> RenameScreen {
    let mut held = vec![false; matched.len()];
    loop {
        let released: BTreeSet<&str> = matched
            .iter()
            .zip(&held)
            .filter(|(record, held)| !**held && record.contains(rename))
            .filter_map(|(record, _)| record.text(key))
            .collect();
        let mut changed = false;
        for (record, held) in matched.iter().zip(held.iter_mut()) {
            let Some(target) = record.text(rename) else {
                continue;
            };
            if !*held && taken.contains(target) && !released.contains(target) {
                *held = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut screen = RenameScreen::default();
    for (record, held) in matched.into_iter().zip(held) {
        if held {
            screen.skipped.push(record);
        } else {
            screen.kept.push(record);
        }
    }
    screen
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use std::collections::BTreeSet;

    use serde_json::json;

    use super::Coverage;
    use super::EntityLayout;
    use super::screen_rename_targets;
    use super::split_against_store;
    use crate::core::ColumnValue;
    use crate::core::RequestRecord;
    use crate::core::Row;

    const PRODUCTS: EntityLayout = EntityLayout {
        id: 0,
        name: 1,
        quantity: Some(2),
    };

    fn records(value: serde_json::Value) -> Vec<RequestRecord> {
        serde_json::from_value(value).unwrap()
    }

    fn product(id: i64, name: &str, quantity: i64) -> Row {
        Row::new(vec![
            ColumnValue::Integer(id),
            ColumnValue::text(name),
            ColumnValue::Integer(quantity),
        ])
    }

    #[test]
    fn matched_records_are_annotated() {
        let stored = vec![product(7, "pen", 10)];
        let batch = records(json!([{"name": "pen"}, {"name": "ink"}]));
        let split = split_against_store(batch, &stored, "name", &PRODUCTS);
        assert_eq!(split.coverage(), Coverage::Partial);
        assert_eq!(split.matched, records(json!([{"name": "pen", "id": 7, "quantity": 10}])));
        assert_eq!(split.unmatched, records(json!([{"name": "ink"}])));
    }

    #[test]
    fn taken_targets_are_held_back_unless_released() {
        let matched = records(json!([
            {"name": "a", "new_name": "b"},
            {"name": "b", "new_name": "c"},
            {"name": "d", "new_name": "e"}
        ]));
        let taken: BTreeSet<String> = ["b", "e"].iter().map(ToString::to_string).collect();
        let screen = screen_rename_targets(matched, &taken, "name", "new_name");
        assert_eq!(screen.kept.len(), 2);
        assert_eq!(screen.skipped, records(json!([{"name": "d", "new_name": "e"}])));
    }

    #[test]
    fn holding_back_cascades() {
        let matched = records(json!([
            {"name": "a", "new_name": "b"},
            {"name": "b", "new_name": "c"}
        ]));
        let taken: BTreeSet<String> = ["b", "c"].iter().map(ToString::to_string).collect();
        let screen = screen_rename_targets(matched, &taken, "name", "new_name");
        assert!(screen.kept.is_empty());
        assert_eq!(screen.skipped.len(), 2);
    }
}
