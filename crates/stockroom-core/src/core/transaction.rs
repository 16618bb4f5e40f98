// crates/stockroom-core/src/core/transaction.rs
// ============================================================================
// Module: Stockroom Transaction Kinds
// Description: Tags recorded in the append-only transaction log.
// Purpose: Name every mutation kind the reconciler can emit.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every applied mutation appends one transaction log entry tagged with a
//! [`TransactionKind`]. The wire and storage form is the lower-case phrase
//! returned by [`TransactionKind::as_str`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Transaction Kind
// ============================================================================

/// Administrator identity recorded on admin-originated log entries.
pub const ADMIN_NAME: &str = "admin";
/// Client identifier recorded on admin-originated log entries.
pub const ADMIN_CLIENT_ID: i64 = 0;

/// Kind of mutation recorded in the transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Product created.
    #[serde(rename = "add")]
    Add,
    /// Product deleted.
    #[serde(rename = "remove")]
    Remove,
    /// Stock quantity replaced.
    #[serde(rename = "update quantity")]
    UpdateQuantity,
    /// Product renamed.
    #[serde(rename = "update name")]
    UpdateName,
    /// Product renamed and stock quantity replaced.
    #[serde(rename = "update name and quantity")]
    UpdateNameAndQuantity,
    /// Client purchase.
    #[serde(rename = "buy")]
    Buy,
    /// Client return.
    #[serde(rename = "return")]
    Return,
}

impl TransactionKind {
    /// Returns the stored tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::UpdateQuantity => "update quantity",
            Self::UpdateName => "update name",
            Self::UpdateNameAndQuantity => "update name and quantity",
            Self::Buy => "buy",
            Self::Return => "return",
        }
    }

    /// Parses a stored tag.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "update quantity" => Some(Self::UpdateQuantity),
            "update name" => Some(Self::UpdateName),
            "update name and quantity" => Some(Self::UpdateNameAndQuantity),
            "buy" => Some(Self::Buy),
            "return" => Some(Self::Return),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
