// crates/stockroom-server/src/server/tests.rs
// ============================================================================
// Module: Inventory Server Unit Tests
// Description: Unit tests for body decoding, status mapping, and auditing.
// Purpose: Validate request dispatch against the in-memory store.
// Dependencies: stockroom-server
// ============================================================================

//! ## Overview
//! Drives [`super::dispatch`] with raw body bytes, without binding a socket.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only dispatch assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use axum::http::StatusCode;
use serde_json::Value;
use serde_json::json;
use stockroom_config::AuditSinkKind;
use stockroom_config::StockroomConfig;
use stockroom_config::StoreType;
use stockroom_core::InMemoryInventoryStore;
use stockroom_core::InventoryService;
use stockroom_core::Operation;

use super::HttpReply;
use super::InventoryServer;
use super::ServerState;
use super::dispatch;
use super::router;
use crate::audit::AuditSink;
use crate::audit::InventoryAuditEvent;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
struct RecordingSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<InventoryAuditEvent>>,
}

impl AuditSink for RecordingSink {
    fn record(&self, event: &InventoryAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl RecordingSink {
    fn last(&self) -> InventoryAuditEvent {
        self.events.lock().unwrap().last().cloned().expect("audit event recorded")
    }
}

fn state_with_limit(max_body_bytes: usize) -> (ServerState, Arc<RecordingSink>) {
    let store = Arc::new(InMemoryInventoryStore::new().unwrap());
    let service = InventoryService::new(store).unwrap();
    let sink = Arc::new(RecordingSink::default());
    (ServerState::new(service, sink.clone(), max_body_bytes), sink)
}

fn state() -> (ServerState, Arc<RecordingSink>) {
    state_with_limit(64 * 1024)
}

fn send(state: &ServerState, operation: Operation, body: &Value) -> HttpReply {
    dispatch(state, operation, body.to_string().as_bytes())
}

fn body_of(reply: &HttpReply) -> Value {
    serde_json::from_slice(&reply.payload).unwrap()
}

// ============================================================================
// SECTION: Body Decoding
// ============================================================================

#[test]
fn malformed_json_is_rejected() {
    let (state, sink) = state();
    let reply = dispatch(&state, Operation::AddProducts, b"{\"user\": ");
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(body_of(&reply), json!({"error": "Invalid JSON body"}));
    let event = sink.last();
    assert_eq!(event.route, "/api/products/add");
    assert_eq!(event.user, None);
    assert_eq!(event.error_kind, Some("request_shape"));
    assert_eq!(event.request_bytes, 9);
}

#[test]
fn non_object_bodies_are_rejected() {
    let (state, _) = state();
    let reply = dispatch(&state, Operation::AddProducts, b"[1, 2]");
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(body_of(&reply), json!({"error": "Request body must be a JSON object"}));
}

#[test]
fn oversized_bodies_are_rejected() {
    let (state, sink) = state_with_limit(16);
    let body = json!({"user": "admin", "data": {"name": "pen", "quantity": 3}});
    let reply = send(&state, Operation::AddProducts, &body);
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(sink.last().status, 413);
}

#[test]
fn blank_bodies_decode_as_empty_requests() {
    let (state, _) = state();
    let reply = dispatch(&state, Operation::ViewProducts, b"  \n");
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(body_of(&reply), json!({"error": "Table empty"}));
}

// ============================================================================
// SECTION: Status Mapping
// ============================================================================

#[test]
fn writes_return_created_and_reads_return_ok() {
    let (state, sink) = state();
    let added = send(
        &state,
        Operation::AddProducts,
        &json!({"user": "Admin", "data": [{"name": "pen", "quantity": 3}]}),
    );
    assert_eq!(added.status, StatusCode::CREATED);
    let event = sink.last();
    assert_eq!(event.user.as_deref(), Some("Admin"));
    assert_eq!(event.status, 201);
    assert_eq!(event.error_kind, None);
    assert_eq!(event.response_bytes, added.payload.len());

    let listed = send(&state, Operation::ViewProducts, &json!({}));
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(body_of(&listed), json!([{"id": 1, "name": "pen", "quantity": 3}]));
}

#[test]
fn missing_user_is_unauthorized() {
    let (state, sink) = state();
    let reply = send(&state, Operation::AddProducts, &json!({"data": {"name": "pen"}}));
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&reply), json!({"error": "User required"}));
    assert_eq!(sink.last().error_kind, Some("unauthorized"));
}

#[test]
fn client_routes_map_not_found() {
    let (state, _) = state();
    let reply = send(&state, Operation::ViewClients, &json!({"user": "ghost"}));
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn router_mounts_every_operation() {
    let (state, _) = state();
    let _app = router(Arc::new(state));
}

#[test]
fn server_builds_from_sqlite_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StockroomConfig::default();
    config.store.store_type = StoreType::Sqlite;
    config.store.path = Some(dir.path().join("inventory.db"));
    config.audit.sink = AuditSinkKind::File;
    config.audit.path = Some(dir.path().join("audit.jsonl").to_string_lossy().into_owned());
    assert!(InventoryServer::from_config(config).is_ok());
    assert!(dir.path().join("inventory.db").exists());
}

#[test]
fn server_rejects_invalid_config() {
    let mut config = StockroomConfig::default();
    config.server.max_body_bytes = 0;
    assert!(InventoryServer::from_config(config).is_err());
}
