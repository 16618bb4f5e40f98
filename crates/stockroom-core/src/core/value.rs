// crates/stockroom-core/src/core/value.rs
// ============================================================================
// Module: Stockroom Column Values
// Description: Tagged column values and declared column types.
// Purpose: Give the query engines one totally ordered value type.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Storage columns are declared `TEXT` or `INTEGER`. Values fetched from
//! storage are modeled as [`ColumnValue`], a tagged value with a total order
//! (`Null < Integer < Text`, then by payload) so sorting, searching, and
//! filtering are written once without inspecting types at runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Column Types
// ============================================================================

/// Declared type of a storage column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// Free text, compared lexicographically.
    Text,
    /// Signed integer.
    Integer,
}

impl ColumnType {
    /// Parses a declared storage type such as `INTEGER` or `TEXT`.
    ///
    /// Matching is case-insensitive and accepts affinity spellings such as
    /// `VARCHAR(32)` or `BIGINT`.
    #[must_use]
    pub fn from_declared(declared: &str) -> Option<Self> {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.contains("INT") {
            Some(Self::Integer)
        } else if upper.contains("TEXT") || upper.contains("CHAR") || upper.contains("CLOB") {
            Some(Self::Text)
        } else {
            None
        }
    }

    /// Returns the canonical declared type label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Column Values
// ============================================================================

/// A single column value as read from storage.
///
/// # Invariants
/// - Variant order defines the cross-tag ordering: `Null < Integer < Text`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    /// SQL `NULL`.
    Null,
    /// Integer payload.
    Integer(i64),
    /// Text payload.
    Text(String),
}

/// Shared `NULL` used for out-of-range column reads.
pub(crate) static NULL_VALUE: ColumnValue = ColumnValue::Null;

impl ColumnValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the text payload when this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer payload when this is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text form used by pattern filters.
    ///
    /// Integers are stringified; `NULL` renders as the empty string.
    #[must_use]
    pub fn text_form(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }

    /// Converts the value into its JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(value) => Value::from(*value),
            Self::Text(value) => Value::String(value.clone()),
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(value) => value.fmt(f),
            Self::Text(value) => value.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnType;
    use super::ColumnValue;

    #[test]
    fn ordering_is_total_across_tags() {
        let mut values = vec![
            ColumnValue::text("b"),
            ColumnValue::Integer(3),
            ColumnValue::Null,
            ColumnValue::text("a"),
            ColumnValue::Integer(-1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                ColumnValue::Null,
                ColumnValue::Integer(-1),
                ColumnValue::Integer(3),
                ColumnValue::text("a"),
                ColumnValue::text("b"),
            ]
        );
    }

    #[test]
    fn declared_types_parse_with_affinity() {
        assert_eq!(ColumnType::from_declared("INTEGER"), Some(ColumnType::Integer));
        assert_eq!(ColumnType::from_declared("bigint"), Some(ColumnType::Integer));
        assert_eq!(ColumnType::from_declared("TEXT"), Some(ColumnType::Text));
        assert_eq!(ColumnType::from_declared("varchar(20)"), Some(ColumnType::Text));
        assert_eq!(ColumnType::from_declared("REAL"), None);
    }
}
