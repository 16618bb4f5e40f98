// crates/stockroom-core/src/validate.rs
// ============================================================================
// Module: Stockroom Field Validation
// Description: Presence checks and type coercion for request fields.
// Purpose: Normalize raw request values before reconciliation or filtering.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Request records are checked against a [`FieldRules`] set: mandatory keys
//! must be present, at least one key of the semi-mandatory group must be
//! present, and typed keys are coerced in place (text lower-cased, integers
//! parsed) so later stages only see canonical values.
//!
//! Integer fields on write requests must be strictly greater than one; see
//! [`IntegerBound::AboveOne`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::ColumnType;
use crate::core::ColumnValue;
use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::core::RequestRecord;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Lower bound applied when coercing integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerBound {
    /// Value must be strictly greater than one.
    AboveOne,
    /// Any integer is accepted.
    Unbounded,
}

impl IntegerBound {
    /// Returns true when the value satisfies the bound.
    const fn admits(self, value: i64) -> bool {
        match self {
            Self::AboveOne => value > 1,
            Self::Unbounded => true,
        }
    }
}

/// Field rules for one kind of request batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRules<'a> {
    /// Keys that must be present on every record.
    pub mandatory: &'a [&'a str],
    /// Group of keys of which at least one must be present.
    pub semi_mandatory: &'a [&'a str],
    /// Keys coerced to lower-case text when present.
    pub text: &'a [&'a str],
    /// Keys coerced to bounded integers when present.
    pub integer: &'a [&'a str],
}

// ============================================================================
// SECTION: Record Validation
// ============================================================================

/// Validates and coerces every record in a batch, stopping at the first error.
///
/// # Errors
///
/// Returns [`InventoryError`] naming the first missing or invalid field.
pub fn validate_records(
    records: &mut [RequestRecord],
    rules: &FieldRules<'_>,
) -> InventoryResult<()> {
    for record in records.iter_mut() {
        validate_record(record, rules)?;
    }
    Ok(())
}

/// Validates one record and coerces its typed fields in place.
///
/// # Errors
///
/// Returns [`InventoryError`] for missing mandatory keys, an absent
/// semi-mandatory group, or values that fail coercion.
pub fn validate_record(record: &mut RequestRecord, rules: &FieldRules<'_>) -> InventoryResult<()> {
    for key in rules.mandatory {
        if !record.contains(key) {
            return Err(InventoryError::request_shape(format!("{} required", capitalize(key)))
                .with_record(record.to_json()));
        }
    }

    if !rules.semi_mandatory.is_empty()
        && !rules.semi_mandatory.iter().any(|key| record.contains(key))
    {
        let group = rules.semi_mandatory.join(" and ");
        return Err(InventoryError::request_shape(format!("{} required", capitalize(&group)))
            .with_record(record.to_json()));
    }

    for key in rules.text {
        if let Some(raw) = record.get(key) {
            let text = coerce_text(key, raw)?;
            record.set(*key, text);
        }
    }

    for key in rules.integer {
        if let Some(raw) = record.get(key) {
            let value = coerce_integer(key, raw, IntegerBound::AboveOne)?;
            record.set(*key, value);
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Coercion
// ============================================================================

/// Coerces a raw value to lower-case text.
///
/// # Errors
///
/// Returns a type-coercion error when the value is not a string.
pub fn coerce_text(field: &str, raw: &Value) -> InventoryResult<String> {
    match raw {
        Value::String(text) => Ok(text.to_lowercase()),
        other => Err(InventoryError::type_coercion(format!(
            "{} must be a string",
            capitalize(field)
        ))
        .with(field, other.clone())),
    }
}

/// Coerces a raw value to an integer satisfying `bound`.
///
/// Accepts JSON integers and strings holding a decimal integer.
///
/// # Errors
///
/// Returns a type-coercion error when the value is not an integer or falls
/// outside the bound.
pub fn coerce_integer(field: &str, raw: &Value, bound: IntegerBound) -> InventoryResult<i64> {
    let parsed = match raw {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(value) if bound.admits(value) => Ok(value),
        _ => Err(InventoryError::type_coercion(format!(
            "{} must be an integer and strictly positive",
            capitalize(field)
        ))
        .with(field, raw.clone())),
    }
}

/// Coerces a raw value against a declared column type.
///
/// # Errors
///
/// Returns a type-coercion error when the value does not fit the type.
pub fn coerce_value(
    field: &str,
    raw: &Value,
    column_type: ColumnType,
    bound: IntegerBound,
) -> InventoryResult<ColumnValue> {
    match column_type {
        ColumnType::Text => coerce_text(field, raw).map(ColumnValue::Text),
        ColumnType::Integer => coerce_integer(field, raw, bound).map(ColumnValue::Integer),
    }
}

/// Upper-cases the first character of a field label.
pub(crate) fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::FieldRules;
    use super::IntegerBound;
    use super::coerce_integer;
    use super::validate_record;
    use crate::core::ErrorKind;
    use crate::core::RequestRecord;

    const EDIT_RULES: FieldRules<'static> = FieldRules {
        mandatory: &["name"],
        semi_mandatory: &["new_name", "new_quantity"],
        text: &["name", "new_name"],
        integer: &["new_quantity"],
    };

    fn record(value: serde_json::Value) -> RequestRecord {
        serde_json::from_value(value).unwrap_or_default()
    }

    #[test]
    fn coercion_normalizes_in_place() {
        let mut item = record(json!({"name": "PeN", "new_quantity": "12"}));
        assert!(validate_record(&mut item, &EDIT_RULES).is_ok());
        assert_eq!(item.text("name"), Some("pen"));
        assert_eq!(item.integer("new_quantity"), Some(12));
    }

    #[test]
    fn missing_mandatory_key_names_the_key() {
        let mut item = record(json!({"new_name": "ink"}));
        let error = validate_record(&mut item, &EDIT_RULES).err();
        assert_eq!(error.as_ref().map(|err| err.message()), Some("Name required"));
        assert_eq!(error.map(|err| err.kind()), Some(ErrorKind::RequestShape));
    }

    #[test]
    fn missing_semi_mandatory_group_names_the_group() {
        let mut item = record(json!({"name": "pen"}));
        let error = validate_record(&mut item, &EDIT_RULES).err();
        assert_eq!(
            error.map(|err| err.message().to_string()),
            Some("New_name and new_quantity required".to_string())
        );
    }

    #[test]
    fn non_string_text_field_is_rejected() {
        let mut item = record(json!({"name": 7, "new_name": "ink"}));
        let error = validate_record(&mut item, &EDIT_RULES).err();
        assert_eq!(error.as_ref().map(|err| err.message()), Some("Name must be a string"));
        assert_eq!(error.and_then(|err| err.context("name").cloned()), Some(json!(7)));
    }

    #[test]
    fn integers_must_exceed_one() {
        for raw in [json!(1), json!(0), json!(-4), json!("x"), json!(2.5), json!(true)] {
            assert!(coerce_integer("quantity", &raw, IntegerBound::AboveOne).is_err());
        }
        assert_eq!(coerce_integer("quantity", &json!(2), IntegerBound::AboveOne).ok(), Some(2));
        assert_eq!(coerce_integer("id", &json!(1), IntegerBound::Unbounded).ok(), Some(1));
    }
}
