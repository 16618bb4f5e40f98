// crates/stockroom-server/src/server.rs
// ============================================================================
// Module: Inventory HTTP Server
// Description: axum routes over the inventory service.
// Purpose: Decode request bodies, dispatch operations, and map statuses.
// Dependencies: stockroom-core, stockroom-config, axum, tokio
// ============================================================================

//! ## Overview
//! Every inventory operation is mounted at its route path (`GET` for reads,
//! `POST` for writes). Request bodies are read as raw bytes, bounded by the
//! configured limit, decoded as a JSON object, and handed to
//! [`stockroom_core::InventoryService`]. Each handled request emits one audit
//! event. Security posture: request bodies are untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use stockroom_config::AuditConfig;
use stockroom_config::AuditSinkKind;
use stockroom_config::StockroomConfig;
use stockroom_config::StoreConfig;
use stockroom_core::ErrorKind;
use stockroom_core::InMemoryInventoryStore;
use stockroom_core::InventoryService;
use stockroom_core::InventoryStore;
use stockroom_core::Operation;
use stockroom_store_sqlite::SqliteInventoryStore;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::InventoryAuditEvent;
use crate::audit::InventoryAuditEventParams;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error kind label for failures outside the domain error set.
const INTERNAL_ERROR_KIND: &str = "internal";

// ============================================================================
// SECTION: Inventory Server
// ============================================================================

/// Inventory HTTP server instance.
pub struct InventoryServer {
    /// Server configuration.
    config: StockroomConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl InventoryServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the store or
    /// audit sink cannot be opened.
    pub fn from_config(mut config: StockroomConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_store(&config.store)?;
        let service =
            InventoryService::new(store).map_err(|err| ServerError::Init(err.to_string()))?;
        let audit = build_audit_sink(&config.audit)?;
        let state = Arc::new(ServerState::new(service, audit, config.server.max_body_bytes));
        Ok(Self {
            config,
            state,
        })
    }

    /// Serves HTTP requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the inventory store from configuration.
fn build_store(config: &StoreConfig) -> Result<Arc<dyn InventoryStore>, ServerError> {
    if let Some(sqlite) = config.sqlite() {
        let store =
            SqliteInventoryStore::new(&sqlite).map_err(|err| ServerError::Init(err.to_string()))?;
        return Ok(Arc::new(store));
    }
    let store = InMemoryInventoryStore::new().map_err(|err| ServerError::Init(err.to_string()))?;
    Ok(Arc::new(store))
}

/// Builds the audit sink from configuration.
fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    match (config.sink, config.path.as_deref()) {
        (AuditSinkKind::File, Some(path)) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        (AuditSinkKind::File, None) => {
            Err(ServerError::Config("file audit sink requires path".to_string()))
        }
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
    }
}

// ============================================================================
// SECTION: Routing
// ============================================================================

/// Shared state for route handlers.
pub struct ServerState {
    /// Inventory operations.
    service: InventoryService,
    /// Audit sink for request events.
    audit: Arc<dyn AuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

impl ServerState {
    /// Creates handler state.
    #[must_use]
    pub fn new(
        service: InventoryService,
        audit: Arc<dyn AuditSink>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            service,
            audit,
            max_body_bytes,
        }
    }
}

/// Builds the axum router with one route per inventory operation.
#[must_use]
pub fn router(state: Arc<ServerState>) -> Router {
    let limit = state.max_body_bytes;
    let mut app: Router<Arc<ServerState>> = Router::new();
    for operation in Operation::ALL {
        let handler = move |State(state): State<Arc<ServerState>>, bytes: Bytes| async move {
            dispatch_with_blocking(&state, operation, &bytes).into_response()
        };
        app = if operation.is_read() {
            app.route(operation.path(), get(handler))
        } else {
            app.route(operation.path(), post(handler))
        };
    }
    app.layer(DefaultBodyLimit::max(limit)).with_state(state)
}

/// Encoded reply for a handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Response status.
    pub status: StatusCode,
    /// JSON response payload.
    pub payload: Vec<u8>,
}

impl IntoResponse for HttpReply {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, "application/json")], self.payload).into_response()
    }
}

/// Runs [`dispatch`], shifting to a blocking context when available.
fn dispatch_with_blocking(state: &ServerState, operation: Operation, bytes: &[u8]) -> HttpReply {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| dispatch(state, operation, bytes))
        }
        _ => dispatch(state, operation, bytes),
    }
}

/// Handles one request body for an operation and records its audit event.
#[must_use]
pub fn dispatch(state: &ServerState, operation: Operation, bytes: &[u8]) -> HttpReply {
    let (status, body, user, error_kind) = match decode_body(bytes, state.max_body_bytes) {
        Err((status, message)) => {
            (status, json!({"error": message}), None, Some("request_shape"))
        }
        Ok(body) => {
            let user = body.get("user").and_then(Value::as_str).map(str::to_string);
            match state.service.handle(operation, &body) {
                Ok(response) => {
                    let status = StatusCode::from_u16(response.status.code())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    (status, response.body, user, response.error_kind.map(ErrorKind::as_str))
                }
                Err(err) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": err.to_string()}),
                    user,
                    Some(INTERNAL_ERROR_KIND),
                ),
            }
        }
    };
    let payload = serde_json::to_vec(&body).unwrap_or_default();
    state.audit.record(&InventoryAuditEvent::new(InventoryAuditEventParams {
        route: operation.path(),
        user,
        status: status.as_u16(),
        error_kind,
        request_bytes: bytes.len(),
        response_bytes: payload.len(),
    }));
    HttpReply {
        status,
        payload,
    }
}

/// Decodes a request body into a JSON object; blank bodies decode as empty.
fn decode_body(
    bytes: &[u8],
    max_body_bytes: usize,
) -> Result<Map<String, Value>, (StatusCode, &'static str)> {
    if bytes.len() > max_body_bytes {
        return Err((StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"));
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(body)) => Ok(body),
        Ok(_) => Err((StatusCode::BAD_REQUEST, "Request body must be a JSON object")),
        Err(_) => Err((StatusCode::BAD_REQUEST, "Invalid JSON body")),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Inventory server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests;
