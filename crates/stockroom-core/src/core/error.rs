// crates/stockroom-core/src/core/error.rs
// ============================================================================
// Module: Stockroom Structured Errors
// Description: Structured error values returned in place of results.
// Purpose: Carry offending keys and records to the caller for precise reports.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failure the engines produce is an [`InventoryError`]: a kind from the
//! error taxonomy, a user-facing message, and structured context naming the
//! offending fields or records. Errors never escape as panics; they are
//! returned (or collected alongside partial results) and serialize to
//! `{"error": <message>, ...context}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Error taxonomy for inventory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing mandatory fields or malformed clause shapes.
    RequestShape,
    /// Non-string, non-integer, or out-of-range values.
    TypeCoercion,
    /// Duplicate rename targets or renames colliding with existing names.
    Conflict,
    /// No persisted match or an empty filter result.
    NotFound,
    /// Insufficient stock or an excessive return.
    BusinessRule,
    /// Unrecognized filter operator symbol.
    InvalidOperator,
    /// Missing or insufficient caller identity.
    Unauthorized,
}

impl ErrorKind {
    /// Returns a stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestShape => "request_shape",
            Self::TypeCoercion => "type_coercion",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::BusinessRule => "business_rule",
            Self::InvalidOperator => "invalid_operator",
            Self::Unauthorized => "unauthorized",
        }
    }
}

// ============================================================================
// SECTION: Inventory Error
// ============================================================================

/// Structured error value.
///
/// # Invariants
/// - `context` never contains the reserved `error` or `records` keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InventoryError {
    /// Error classification.
    kind: ErrorKind,
    /// User-facing message.
    message: String,
    /// Offending fields and values.
    context: Map<String, Value>,
    /// Offending records, in the order they were detected.
    records: Vec<Value>,
}

impl InventoryError {
    /// Creates an error with no context.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Map::new(),
            records: Vec::new(),
        }
    }

    /// Creates a request-shape error.
    pub fn request_shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestShape, message)
    }

    /// Creates a type-coercion error.
    pub fn type_coercion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeCoercion, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a business-rule error.
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BusinessRule, message)
    }

    /// Creates an invalid-operator error.
    pub fn invalid_operator(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOperator, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Attaches an offending field and value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if field != "error" && field != "records" {
            self.context.insert(field, value.into());
        }
        self
    }

    /// Attaches an offending record.
    #[must_use]
    pub fn with_record(mut self, record: impl Into<Value>) -> Self {
        self.records.push(record.into());
        self
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns a context value by field.
    #[must_use]
    pub fn context(&self, field: &str) -> Option<&Value> {
        self.context.get(field)
    }

    /// Returns the offending records.
    #[must_use]
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Renders the wire form `{"error": ..., ...context}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("error".to_string(), Value::String(self.message.clone()));
        for (field, value) in &self.context {
            object.insert(field.clone(), value.clone());
        }
        if !self.records.is_empty() {
            object.insert("records".to_string(), Value::Array(self.records.clone()));
        }
        Value::Object(object)
    }
}

impl Serialize for InventoryError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ============================================================================
// SECTION: Result Alias
// ============================================================================

/// Result type for inventory engine operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ErrorKind;
    use super::InventoryError;

    #[test]
    fn wire_form_carries_context_and_records() {
        let error = InventoryError::conflict("New name duplicate found")
            .with("new_name", "x")
            .with("error", "ignored")
            .with_record(json!({"name": "a"}))
            .with_record(json!({"name": "b"}));
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(
            error.to_json(),
            json!({
                "error": "New name duplicate found",
                "new_name": "x",
                "records": [{"name": "a"}, {"name": "b"}]
            })
        );
    }
}
