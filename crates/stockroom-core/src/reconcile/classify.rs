// crates/stockroom-core/src/reconcile/classify.rs
// ============================================================================
// Module: Stockroom Mutation Classification
// Description: Turns matched records into mutations and log entries.
// Purpose: Tag each record's effective change and enforce stock rules.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Edits are tagged `update name`, `update quantity`, or
//! `update name and quantity`; a new quantity equal to the stored one is
//! dropped, and records left with no change are not applied.
//!
//! Purchases decrement stock for `buy` and increment it for `return`. Stock
//! never goes negative, and a return never exceeds the client's net
//! (`buy - return`) previously recorded for the product.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::ADMIN_CLIENT_ID;
use crate::core::ADMIN_NAME;
use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::core::RequestRecord;
use crate::core::Row;
use crate::core::SchemaError;
use crate::core::TableSchema;
use crate::core::TransactionKind;
use crate::core::record::FIELD_BUY;
use crate::core::record::FIELD_ID;
use crate::core::record::FIELD_NAME;
use crate::core::record::FIELD_NEW_NAME;
use crate::core::record::FIELD_NEW_QUANTITY;
use crate::core::record::FIELD_QUANTITY;
use crate::core::record::FIELD_RETURN;
use crate::core::record::FIELD_TRANSACTION;
use crate::interfaces::Mutation;
use crate::interfaces::MutationBatch;
use crate::interfaces::ProductRef;
use crate::interfaces::TransactionEntry;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Purchase exceeds stock.
pub const NOT_ENOUGH_STOCK_MESSAGE: &str = "Not enough in stock to complete transaction";
/// Return exceeds the client's net purchases.
pub const RETURN_TOO_HIGH_MESSAGE: &str = "Return amount too high";

// ============================================================================
// SECTION: Actors
// ============================================================================

/// Identity recorded on transaction log entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Client identifier (`0` for the administrator).
    pub id: i64,
    /// Client name.
    pub name: String,
}

impl Actor {
    /// Returns the administrator identity.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            id: ADMIN_CLIENT_ID,
            name: ADMIN_NAME.to_string(),
        }
    }

    /// Builds a log entry for this actor.
    fn entry(
        &self,
        product: ProductRef,
        product_name: &str,
        quantity: i64,
        kind: TransactionKind,
    ) -> TransactionEntry {
        TransactionEntry {
            product,
            product_name: product_name.to_string(),
            quantity,
            client_id: self.id,
            client_name: self.name.clone(),
            kind,
        }
    }
}

/// Records plus the batch that applies them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Records that produced a change, tagged with `transaction`.
    pub applied: Vec<RequestRecord>,
    /// Mutations and log entries for the store.
    pub batch: MutationBatch,
}

// ============================================================================
// SECTION: Inserts and Deletes
// ============================================================================

/// Builds product inserts and their `add` log entries.
#[must_use]
pub fn classify_product_inserts(records: &[RequestRecord], actor: &Actor) -> MutationBatch {
    let mut batch = MutationBatch::default();
    for record in records {
        let (Some(name), Some(quantity)) = (record.text(FIELD_NAME), record.integer(FIELD_QUANTITY))
        else {
            continue;
        };
        batch.mutations.push(Mutation::InsertProduct {
            name: name.to_string(),
            quantity,
        });
        batch.transactions.push(actor.entry(
            ProductRef::Named(name.to_string()),
            name,
            quantity,
            TransactionKind::Add,
        ));
    }
    batch
}

/// Builds product deletes and their `remove` log entries from matched records.
#[must_use]
pub fn classify_product_removals(matched: &[RequestRecord], actor: &Actor) -> MutationBatch {
    let mut batch = MutationBatch::default();
    for record in matched {
        let (Some(id), Some(name)) = (record.integer(FIELD_ID), record.text(FIELD_NAME)) else {
            continue;
        };
        let quantity = record.integer(FIELD_QUANTITY).unwrap_or_default();
        batch.mutations.push(Mutation::DeleteProduct {
            id,
        });
        batch.transactions.push(actor.entry(
            ProductRef::Id(id),
            name,
            quantity,
            TransactionKind::Remove,
        ));
    }
    batch
}

/// Builds client inserts.
#[must_use]
pub fn classify_client_inserts(records: &[RequestRecord]) -> MutationBatch {
    MutationBatch {
        mutations: records
            .iter()
            .filter_map(|record| record.text(FIELD_NAME))
            .map(|name| Mutation::InsertClient {
                name: name.to_string(),
            })
            .collect(),
        transactions: Vec::new(),
    }
}

/// Builds client deletes from matched records.
#[must_use]
pub fn classify_client_removals(matched: &[RequestRecord]) -> MutationBatch {
    MutationBatch {
        mutations: matched
            .iter()
            .filter_map(|record| record.integer(FIELD_ID))
            .map(|id| Mutation::DeleteClient {
                id,
            })
            .collect(),
        transactions: Vec::new(),
    }
}

/// Builds client renames from matched records carrying `new_name`.
#[must_use]
pub fn classify_client_renames(kept: &[RequestRecord]) -> MutationBatch {
    MutationBatch {
        mutations: kept
            .iter()
            .filter_map(|record| Some((record.integer(FIELD_ID)?, record.text(FIELD_NEW_NAME)?)))
            .map(|(id, name)| Mutation::RenameClient {
                id,
                name: name.to_string(),
            })
            .collect(),
        transactions: Vec::new(),
    }
}

// ============================================================================
// SECTION: Edits
// ============================================================================

/// Tags matched product edits and builds their updates.
#[must_use]
pub fn classify_product_edits(matched: Vec<RequestRecord>, actor: &Actor) -> Classified {
    let mut classified = Classified::default();
    for mut record in matched {
        let Some(id) = record.integer(FIELD_ID) else {
            continue;
        };
        if record.integer(FIELD_NEW_QUANTITY).is_some()
            && record.integer(FIELD_NEW_QUANTITY) == record.integer(FIELD_QUANTITY)
        {
            record.remove(FIELD_NEW_QUANTITY);
        }
        let new_name = record.text(FIELD_NEW_NAME).map(ToString::to_string);
        let new_quantity = record.integer(FIELD_NEW_QUANTITY);
        let kind = match (&new_name, new_quantity) {
            (Some(_), Some(_)) => TransactionKind::UpdateNameAndQuantity,
            (Some(_), None) => TransactionKind::UpdateName,
            (None, Some(_)) => TransactionKind::UpdateQuantity,
            (None, None) => continue,
        };
        if let Some(name) = &new_name {
            classified.batch.mutations.push(Mutation::RenameProduct {
                id,
                name: name.clone(),
            });
        }
        if let Some(quantity) = new_quantity {
            classified.batch.mutations.push(Mutation::SetProductQuantity {
                id,
                quantity,
            });
        }
        let logged_name =
            new_name.as_deref().or_else(|| record.text(FIELD_NAME)).unwrap_or_default();
        let logged_quantity =
            new_quantity.or_else(|| record.integer(FIELD_QUANTITY)).unwrap_or_default();
        classified.batch.transactions.push(actor.entry(
            ProductRef::Id(id),
            logged_name,
            logged_quantity,
            kind,
        ));
        record.set(FIELD_TRANSACTION, kind.as_str());
        classified.applied.push(record);
    }
    classified
}

// ============================================================================
// SECTION: Purchases
// ============================================================================

/// Net buy and return amounts for one client and product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Total bought.
    pub bought: i64,
    /// Total returned.
    pub returned: i64,
}

impl Ledger {
    /// Returns the amount still eligible for return.
    #[must_use]
    pub const fn net(self) -> i64 {
        self.bought.saturating_sub(self.returned)
    }
}

/// Column positions of the transaction log used for ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionLayout {
    /// Product identifier column.
    pub product_id: usize,
    /// Quantity column.
    pub quantity: usize,
    /// Transaction kind column.
    pub kind: usize,
}

impl TransactionLayout {
    /// Resolves column positions from the transactions schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a required column is missing.
    pub fn resolve(schema: &TableSchema) -> Result<Self, SchemaError> {
        Ok(Self {
            product_id: schema.require("product_id")?,
            quantity: schema.require("quantity")?,
            kind: schema.require("type_of_transaction")?,
        })
    }
}

/// Sums a client's buy and return entries per product.
#[must_use]
pub fn client_ledger(rows: &[Row], layout: &TransactionLayout) -> BTreeMap<i64, Ledger> {
    let mut ledgers: BTreeMap<i64, Ledger> = BTreeMap::new();
    for row in rows {
        let (Some(product_id), Some(quantity)) =
            (row.value(layout.product_id).as_integer(), row.value(layout.quantity).as_integer())
        else {
            continue;
        };
        let kind = row.value(layout.kind).as_text().and_then(TransactionKind::parse);
        let ledger = match kind {
            Some(TransactionKind::Buy | TransactionKind::Return) => {
                ledgers.entry(product_id).or_default()
            }
            _ => continue,
        };
        if kind == Some(TransactionKind::Buy) {
            ledger.bought = ledger.bought.saturating_add(quantity);
        } else {
            ledger.returned = ledger.returned.saturating_add(quantity);
        }
    }
    ledgers
}

/// Applies buy and return rules to matched records.
///
/// A record may carry both; the buy is applied first and the record's
/// `transaction` tag names the last change applied.
///
/// # Errors
///
/// Returns a business-rule error for insufficient stock or an excessive
/// return; the whole batch is rejected.
pub fn classify_purchases(
    matched: Vec<RequestRecord>,
    ledgers: &BTreeMap<i64, Ledger>,
    actor: &Actor,
) -> InventoryResult<Classified> {
    let mut classified = Classified::default();
    for mut record in matched {
        let (Some(id), Some(mut quantity)) =
            (record.integer(FIELD_ID), record.integer(FIELD_QUANTITY))
        else {
            continue;
        };
        let name = record.text(FIELD_NAME).unwrap_or_default().to_string();

        if let Some(buy) = record.integer(FIELD_BUY) {
            if buy > quantity {
                return Err(InventoryError::business_rule(NOT_ENOUGH_STOCK_MESSAGE)
                    .with_record(record.to_json()));
            }
            quantity -= buy;
            record.set(FIELD_TRANSACTION, TransactionKind::Buy.as_str());
            classified.batch.transactions.push(actor.entry(
                ProductRef::Id(id),
                &name,
                buy,
                TransactionKind::Buy,
            ));
        }

        if let Some(amount) = record.integer(FIELD_RETURN) {
            let ledger = ledgers.get(&id).copied().unwrap_or_default();
            if amount > ledger.net() {
                return Err(InventoryError::business_rule(RETURN_TOO_HIGH_MESSAGE)
                    .with("bought", ledger.bought)
                    .with("returned", ledger.returned)
                    .with_record(record.to_json()));
            }
            quantity = quantity.saturating_add(amount);
            record.set(FIELD_TRANSACTION, TransactionKind::Return.as_str());
            classified.batch.transactions.push(actor.entry(
                ProductRef::Id(id),
                &name,
                amount,
                TransactionKind::Return,
            ));
        }

        classified.batch.mutations.push(Mutation::SetProductQuantity {
            id,
            quantity,
        });
        record.set(FIELD_QUANTITY, quantity);
        classified.applied.push(record);
    }
    Ok(classified)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use std::collections::BTreeMap;

    use serde_json::json;

    use super::Actor;
    use super::Ledger;
    use super::RETURN_TOO_HIGH_MESSAGE;
    use super::classify_product_edits;
    use super::classify_purchases;
    use crate::core::RequestRecord;
    use crate::core::TransactionKind;
    use crate::interfaces::Mutation;

    fn records(value: serde_json::Value) -> Vec<RequestRecord> {
        serde_json::from_value(value).unwrap()
    }

    fn client() -> Actor {
        Actor {
            id: 3,
            name: "amy".to_string(),
        }
    }

    #[test]
    fn unchanged_quantity_is_dropped() {
        let matched = records(json!([
            {"name": "pen", "id": 1, "quantity": 10, "new_quantity": 10},
            {"name": "ink", "id": 2, "quantity": 5, "new_quantity": 10, "new_name": "dye"}
        ]));
        let classified = classify_product_edits(matched, &Actor::admin());
        assert_eq!(classified.applied.len(), 1);
        assert_eq!(
            classified.applied[0].text("transaction"),
            Some(TransactionKind::UpdateNameAndQuantity.as_str())
        );
        assert_eq!(classified.batch.transactions[0].product_name, "dye");
    }

    #[test]
    fn buy_decrements_stock() {
        let matched = records(json!([{"name": "pen", "id": 1, "quantity": 10, "buy": 4}]));
        let classified = classify_purchases(matched, &BTreeMap::new(), &client()).unwrap();
        assert_eq!(
            classified.batch.mutations,
            vec![Mutation::SetProductQuantity {
                id: 1,
                quantity: 6,
            }]
        );
        assert_eq!(classified.applied[0].text("transaction"), Some("buy"));
    }

    #[test]
    fn return_cannot_exceed_prior_net() {
        let ledgers: BTreeMap<i64, Ledger> = [(
            1,
            Ledger {
                bought: 4,
                returned: 0,
            },
        )]
        .into_iter()
        .collect();
        let matched = records(json!([{"name": "pen", "id": 1, "quantity": 6, "return": 5}]));
        let error = classify_purchases(matched, &ledgers, &client()).err().unwrap();
        assert_eq!(error.message(), RETURN_TOO_HIGH_MESSAGE);
    }
}
