//! Config value validation tests for stockroom-config.
// crates/stockroom-config/tests/value_validation.rs
// =============================================================================
// Module: Config Value Validation Tests
// Description: Validate server, store, and audit setting constraints.
// Purpose: Ensure invalid settings fail closed with descriptive errors.
// =============================================================================

use std::path::PathBuf;

use stockroom_config::AuditSinkKind;
use stockroom_config::ConfigError;
use stockroom_config::MAX_BODY_BYTES_LIMIT;
use stockroom_config::StockroomConfig;
use stockroom_config::StoreType;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn empty_document_uses_defaults() -> TestResult {
    let config = StockroomConfig::from_toml("").map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:5000" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if config.store.store_type != StoreType::Memory || config.store.sqlite().is_some() {
        return Err("default store must be memory".to_string());
    }
    if config.audit.sink != AuditSinkKind::Stderr {
        return Err("default audit sink must be stderr".to_string());
    }
    Ok(())
}

#[test]
fn unparseable_bind_is_rejected() -> TestResult {
    let mut config = StockroomConfig::default();
    config.server.bind = "localhost-ish".to_string();
    assert_invalid(config.validate(), "invalid bind address")
}

#[test]
fn blank_bind_is_rejected() -> TestResult {
    let mut config = StockroomConfig::default();
    config.server.bind = "   ".to_string();
    assert_invalid(config.validate(), "server.bind must be non-empty")
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    let mut config = StockroomConfig::default();
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn oversized_body_limit_is_rejected() -> TestResult {
    let mut config = StockroomConfig::default();
    config.server.max_body_bytes = MAX_BODY_BYTES_LIMIT + 1;
    assert_invalid(config.validate(), "max_body_bytes exceeds limit")
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    let mut config = StockroomConfig::default();
    config.store.path = Some(PathBuf::from("inventory.db"));
    assert_invalid(config.validate(), "memory store must not set path")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let mut config = StockroomConfig::default();
    config.store.store_type = StoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite store requires path")
}

#[test]
fn sqlite_store_rejects_long_component() -> TestResult {
    let mut config = StockroomConfig::default();
    config.store.store_type = StoreType::Sqlite;
    config.store.path = Some(PathBuf::from("a".repeat(300)));
    assert_invalid(config.validate(), "store.path path component too long")
}

#[test]
fn file_audit_sink_requires_path() -> TestResult {
    let mut config = StockroomConfig::default();
    config.audit.sink = AuditSinkKind::File;
    assert_invalid(config.validate(), "file audit sink requires path")
}

#[test]
fn audit_path_requires_file_sink() -> TestResult {
    let mut config = StockroomConfig::default();
    config.audit.path = Some("audit.jsonl".to_string());
    assert_invalid(config.validate(), "audit.path is only valid for the file sink")
}

#[test]
fn unknown_store_type_fails_to_parse() -> TestResult {
    match StockroomConfig::from_toml("[store]\ntype = \"postgres\"\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error {other}")),
        Ok(_) => Err("expected parse failure".to_string()),
    }
}
