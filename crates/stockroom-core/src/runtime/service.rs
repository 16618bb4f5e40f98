// crates/stockroom-core/src/runtime/service.rs
// ============================================================================
// Module: Stockroom Inventory Service
// Description: Route-level operations over the query and reconcile engines.
// Purpose: Turn decoded request bodies into responses and store mutations.
// Dependencies: crate::{core, interfaces, query, reconcile, validate}
// ============================================================================

//! ## Overview
//! [`InventoryService`] exposes one operation per HTTP route. Each operation
//! verifies the caller, validates and reconciles the request data, applies a
//! single mutation batch, and reports full or partial success.
//!
//! Domain failures become error responses; only store and schema failures
//! escape as [`ServiceError`]. Write operations are serialized so the rows a
//! batch was reconciled against cannot change before it is applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::core::ADMIN_NAME;
use crate::core::ErrorKind;
use crate::core::InventoryError;
use crate::core::InventoryResult;
use crate::core::RequestRecord;
use crate::core::Row;
use crate::core::SchemaError;
use crate::core::Table;
use crate::core::record::FIELD_BUY;
use crate::core::record::FIELD_NAME;
use crate::core::record::FIELD_NEW_NAME;
use crate::core::record::FIELD_NEW_QUANTITY;
use crate::core::record::FIELD_QUANTITY;
use crate::core::record::FIELD_RETURN;
use crate::interfaces::InventoryStore;
use crate::interfaces::Mutation;
use crate::interfaces::MutationBatch;
use crate::interfaces::StoreError;
use crate::query::ViewRequest;
use crate::query::present;
use crate::query::row_object;
use crate::query::run_view;
use crate::reconcile::Actor;
use crate::reconcile::Coverage;
use crate::reconcile::EntityLayout;
use crate::reconcile::MergeRules;
use crate::reconcile::TransactionLayout;
use crate::reconcile::classify_client_inserts;
use crate::reconcile::classify_client_removals;
use crate::reconcile::classify_client_renames;
use crate::reconcile::classify_product_edits;
use crate::reconcile::classify_product_inserts;
use crate::reconcile::classify_product_removals;
use crate::reconcile::classify_purchases;
use crate::reconcile::client_ledger;
use crate::reconcile::detect_rename_conflicts;
use crate::reconcile::merge_duplicates;
use crate::reconcile::screen_rename_targets;
use crate::reconcile::split_against_store;
use crate::validate::FieldRules;
use crate::validate::validate_records;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// A rename target is already held by a stored row.
const NEW_NAME_TAKEN_MESSAGE: &str = "New name not unique";

// ============================================================================
// SECTION: Field and Merge Rules
// ============================================================================

/// Product inserts.
const PRODUCT_ADD_FIELDS: FieldRules<'static> = FieldRules {
    mandatory: &[FIELD_NAME, FIELD_QUANTITY],
    semi_mandatory: &[],
    text: &[FIELD_NAME],
    integer: &[FIELD_QUANTITY],
};

/// Name-only batches (product removal, client add and removal).
const NAME_FIELDS: FieldRules<'static> = FieldRules {
    mandatory: &[FIELD_NAME],
    semi_mandatory: &[],
    text: &[FIELD_NAME],
    integer: &[],
};

/// Administrator product edits.
const PRODUCT_EDIT_FIELDS: FieldRules<'static> = FieldRules {
    mandatory: &[FIELD_NAME],
    semi_mandatory: &[FIELD_NEW_NAME, FIELD_NEW_QUANTITY],
    text: &[FIELD_NAME, FIELD_NEW_NAME],
    integer: &[FIELD_NEW_QUANTITY],
};

/// Client purchases and returns.
const PURCHASE_FIELDS: FieldRules<'static> = FieldRules {
    mandatory: &[FIELD_NAME],
    semi_mandatory: &[FIELD_BUY, FIELD_RETURN],
    text: &[FIELD_NAME],
    integer: &[FIELD_BUY, FIELD_RETURN],
};

/// Administrator client renames.
const CLIENT_EDIT_FIELDS: FieldRules<'static> = FieldRules {
    mandatory: &[FIELD_NAME, FIELD_NEW_NAME],
    semi_mandatory: &[],
    text: &[FIELD_NAME, FIELD_NEW_NAME],
    integer: &[],
};

/// A client renaming its own account.
const SELF_RENAME_FIELDS: FieldRules<'static> = FieldRules {
    mandatory: &[FIELD_NEW_NAME],
    semi_mandatory: &[],
    text: &[FIELD_NEW_NAME],
    integer: &[],
};

/// Merge by name, summing quantities.
const MERGE_QUANTITY: MergeRules<'static> = MergeRules {
    key: FIELD_NAME,
    summed: &[FIELD_QUANTITY],
    agreed: &[],
};

/// Merge by name only.
const MERGE_NAME: MergeRules<'static> = MergeRules {
    key: FIELD_NAME,
    summed: &[],
    agreed: &[],
};

/// Merge edits: summed quantities, agreed rename targets.
const MERGE_EDIT: MergeRules<'static> = MergeRules {
    key: FIELD_NAME,
    summed: &[FIELD_NEW_QUANTITY],
    agreed: &[FIELD_NEW_NAME],
};

/// Merge purchases: summed buy and return amounts.
const MERGE_PURCHASE: MergeRules<'static> = MergeRules {
    key: FIELD_NAME,
    summed: &[FIELD_BUY, FIELD_RETURN],
    agreed: &[],
};

// ============================================================================
// SECTION: Operations and Responses
// ============================================================================

/// Route-level operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `POST /api/products/add`.
    AddProducts,
    /// `POST /api/products/remove`.
    RemoveProducts,
    /// `POST /api/products/edit`.
    EditProducts,
    /// `GET /api/products`.
    ViewProducts,
    /// `POST /api/clients/add`.
    AddClients,
    /// `POST /api/clients/remove`.
    RemoveClients,
    /// `POST /api/clients/edit`.
    EditClients,
    /// `GET /api/clients`.
    ViewClients,
    /// `GET /api/transactions`.
    ViewTransactions,
}

impl Operation {
    /// All operations in route order.
    pub const ALL: [Self; 9] = [
        Self::AddProducts,
        Self::RemoveProducts,
        Self::EditProducts,
        Self::ViewProducts,
        Self::AddClients,
        Self::RemoveClients,
        Self::EditClients,
        Self::ViewClients,
        Self::ViewTransactions,
    ];

    /// Returns the route path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::AddProducts => "/api/products/add",
            Self::RemoveProducts => "/api/products/remove",
            Self::EditProducts => "/api/products/edit",
            Self::ViewProducts => "/api/products",
            Self::AddClients => "/api/clients/add",
            Self::RemoveClients => "/api/clients/remove",
            Self::EditClients => "/api/clients/edit",
            Self::ViewClients => "/api/clients",
            Self::ViewTransactions => "/api/transactions",
        }
    }

    /// Returns true for read-only operations.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::ViewProducts | Self::ViewClients | Self::ViewTransactions)
    }
}

/// Response status classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// 200.
    Ok,
    /// 201.
    Created,
    /// 400.
    BadRequest,
    /// 401.
    Unauthorized,
    /// 404.
    NotFound,
}

impl ResponseStatus {
    /// Returns the HTTP status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
        }
    }

    /// Maps a domain error kind to its status.
    #[must_use]
    pub const fn for_error(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Unauthorized => Self::Unauthorized,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::RequestShape
            | ErrorKind::TypeCoercion
            | ErrorKind::Conflict
            | ErrorKind::BusinessRule
            | ErrorKind::InvalidOperator => Self::BadRequest,
        }
    }
}

/// Response produced by an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    /// Response status.
    pub status: ResponseStatus,
    /// JSON body.
    pub body: Value,
    /// Kind of the leading error, for error responses.
    pub error_kind: Option<ErrorKind>,
}

impl ServiceResponse {
    /// Builds a 200 response.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self {
            status: ResponseStatus::Ok,
            body,
            error_kind: None,
        }
    }

    /// Builds a 201 response.
    #[must_use]
    pub const fn created(body: Value) -> Self {
        Self {
            status: ResponseStatus::Created,
            body,
            error_kind: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(error: &InventoryError) -> Self {
        Self {
            status: ResponseStatus::for_error(error.kind()),
            body: error.to_json(),
            error_kind: Some(error.kind()),
        }
    }

    /// Builds a response listing several errors; the first sets the status.
    #[must_use]
    pub fn errors(errors: &[InventoryError]) -> Self {
        match errors {
            [single] => Self::error(single),
            _ => {
                let kind = errors.first().map_or(ErrorKind::NotFound, InventoryError::kind);
                Self {
                    status: ResponseStatus::for_error(kind),
                    body: Value::Array(errors.iter().map(InventoryError::to_json).collect()),
                    error_kind: Some(kind),
                }
            }
        }
    }
}

/// Failures that are not reported to the caller as domain errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain error; converted into an error response by [`InventoryService::handle`].
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Schema descriptor is missing a required table or column.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

// ============================================================================
// SECTION: Caller Identity
// ============================================================================

/// Verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// The administrator.
    Admin,
    /// A client, by lower-cased name.
    Client(String),
}

/// Verifies the `user` field of a request body.
///
/// # Errors
///
/// Returns an unauthorized error when `user` is missing, empty, not a string,
/// or not the administrator when `admin_required` is set.
pub fn verify_user(body: &Map<String, Value>, admin_required: bool) -> InventoryResult<Principal> {
    let raw = body.get("user").ok_or_else(|| InventoryError::unauthorized("User required"))?;
    let user = raw
        .as_str()
        .map(str::to_lowercase)
        .filter(|user| !user.is_empty())
        .ok_or_else(|| InventoryError::unauthorized("Invalid user information"))?;
    if user == ADMIN_NAME {
        return Ok(Principal::Admin);
    }
    if admin_required {
        return Err(InventoryError::unauthorized("Unauthorized user"));
    }
    Ok(Principal::Client(user))
}

/// Extracts `data` as a non-empty list of records.
///
/// # Errors
///
/// Returns a request-shape error when `data` is missing, empty, or holds
/// something other than mappings.
pub fn request_records(body: &Map<String, Value>) -> InventoryResult<Vec<RequestRecord>> {
    let empty = || InventoryError::request_shape("No information entered");
    let items: Vec<&Value> = match body.get("data") {
        None | Some(Value::Null) => return Err(empty()),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    };
    if items.is_empty() {
        return Err(empty());
    }
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(fields) if !fields.is_empty() => Ok(RequestRecord::from(fields.clone())),
            Value::Object(_) => Err(empty()),
            other => Err(InventoryError::request_shape("Data entries must be mappings")
                .with("data", other.clone())),
        })
        .collect()
}

// ============================================================================
// SECTION: Inventory Service
// ============================================================================

/// Column layouts resolved once from the schema descriptor.
#[derive(Debug, Clone, Copy)]
struct Layouts {
    /// Products table.
    products: EntityLayout,
    /// Clients table.
    clients: EntityLayout,
    /// Transactions table.
    transactions: TransactionLayout,
}

/// Inventory operations over a store.
pub struct InventoryService {
    /// Persistence collaborator.
    store: Arc<dyn InventoryStore>,
    /// Column layouts.
    layouts: Layouts,
    /// Serializes write batches.
    write_lock: Mutex<()>,
}

impl InventoryService {
    /// Creates a service, resolving column layouts from the store's schema.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Schema`] when a required column is missing.
    pub fn new(store: Arc<dyn InventoryStore>) -> Result<Self, ServiceError> {
        let schema = store.schema();
        let layouts = Layouts {
            products: EntityLayout::resolve(schema.table(Table::Products)?)?,
            clients: EntityLayout::resolve(schema.table(Table::Clients)?)?,
            transactions: TransactionLayout::resolve(schema.table(Table::Transactions)?)?,
        };
        Ok(Self {
            store,
            layouts,
            write_lock: Mutex::new(()),
        })
    }

    /// Runs an operation, turning domain errors into error responses.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for store or schema failures.
    pub fn handle(
        &self,
        operation: Operation,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        let result = match operation {
            Operation::AddProducts => self.add_products(body),
            Operation::RemoveProducts => self.remove_products(body),
            Operation::EditProducts => self.edit_products(body),
            Operation::ViewProducts => self.view_products(body),
            Operation::AddClients => self.add_clients(body),
            Operation::RemoveClients => self.remove_clients(body),
            Operation::EditClients => self.edit_clients(body),
            Operation::ViewClients => self.view_clients(body),
            Operation::ViewTransactions => self.view_transactions(body),
        };
        match result {
            Err(ServiceError::Inventory(error)) => Ok(ServiceResponse::error(&error)),
            other => other,
        }
    }

    // ------------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------------

    /// Adds products; existing names are reported as duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn add_products(&self, body: &Map<String, Value>) -> Result<ServiceResponse, ServiceError> {
        verify_user(body, true)?;
        let mut records = request_records(body)?;
        validate_records(&mut records, &PRODUCT_ADD_FIELDS)?;
        let records = merge_duplicates(records, &MERGE_QUANTITY)?;

        let _guard = self.write_guard()?;
        let stored = self.store.fetch_by_names(Table::Products, &names_of(&records, FIELD_NAME))?;
        let split = split_against_store(records, &stored, FIELD_NAME, &self.layouts.products);
        if split.unmatched.is_empty() {
            return Err(InventoryError::conflict("Task failed, all duplicates").into());
        }
        self.store.apply(&classify_product_inserts(&split.unmatched, &Actor::admin()))?;

        if split.matched.is_empty() {
            return Ok(ServiceResponse::created(message("Task successful")));
        }
        Ok(ServiceResponse::created(report(
            "Task partially successful, duplicates found",
            &[("Successful", &split.unmatched), ("Duplicates in database", &split.matched)],
        )))
    }

    /// Removes products by name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn remove_products(
        &self,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        verify_user(body, true)?;
        let mut records = request_records(body)?;
        validate_records(&mut records, &NAME_FIELDS)?;
        let records = merge_duplicates(records, &MERGE_NAME)?;

        let _guard = self.write_guard()?;
        let stored = self.store.fetch_by_names(Table::Products, &names_of(&records, FIELD_NAME))?;
        let split = split_against_store(records, &stored, FIELD_NAME, &self.layouts.products);
        let coverage = split.coverage();
        if coverage == Coverage::Nothing {
            return Err(
                InventoryError::not_found("No match found with any of the product names").into()
            );
        }
        self.store.apply(&classify_product_removals(&split.matched, &Actor::admin()))?;

        if coverage == Coverage::All {
            return Ok(ServiceResponse::created(message("Product/s deleted successfully")));
        }
        Ok(ServiceResponse::created(report(
            "Deletion partially successful",
            &[("Successful", &split.matched), ("No match found", &split.unmatched)],
        )))
    }

    /// Edits products (administrator) or buys and returns them (client).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn edit_products(
        &self,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        match verify_user(body, false)? {
            Principal::Admin => self.update_products(body),
            Principal::Client(name) => self.purchase_products(body, &name),
        }
    }

    /// Applies administrator renames and quantity changes.
    fn update_products(&self, body: &Map<String, Value>) -> Result<ServiceResponse, ServiceError> {
        let mut records = request_records(body)?;
        validate_records(&mut records, &PRODUCT_EDIT_FIELDS)?;
        let records = merge_duplicates(records, &MERGE_EDIT)?;
        detect_rename_conflicts(&records, Table::Products, FIELD_NAME, FIELD_NEW_NAME)?;

        let _guard = self.write_guard()?;
        let stored = self.store.fetch_by_names(Table::Products, &names_of(&records, FIELD_NAME))?;
        let split = split_against_store(records, &stored, FIELD_NAME, &self.layouts.products);
        if split.matched.is_empty() {
            return Err(
                InventoryError::not_found("No match found with any of the product names").into()
            );
        }
        let taken = self.taken_names(Table::Products, &split.matched)?;
        let screen = screen_rename_targets(split.matched, &taken, FIELD_NAME, FIELD_NEW_NAME);
        let classified = classify_product_edits(screen.kept, &Actor::admin());
        reject_unapplied_renames(&classified.applied, &screen.skipped)?;
        self.apply_if_needed(&classified.batch)?;

        if split.unmatched.is_empty() && screen.skipped.is_empty() {
            return Ok(ServiceResponse::created(message(
                "Product information changed successfully",
            )));
        }
        Ok(ServiceResponse::created(report(
            "Update partially successful",
            &[
                ("Successful", &classified.applied),
                ("No match for name found", &split.unmatched),
                (NEW_NAME_TAKEN_MESSAGE, &screen.skipped),
            ],
        )))
    }

    /// Applies a client's buys and returns.
    fn purchase_products(
        &self,
        body: &Map<String, Value>,
        client_name: &str,
    ) -> Result<ServiceResponse, ServiceError> {
        let actor = self.resolve_client(client_name)?;
        let mut records = request_records(body)?;
        validate_records(&mut records, &PURCHASE_FIELDS)?;
        let records = merge_duplicates(records, &MERGE_PURCHASE)?;

        let _guard = self.write_guard()?;
        let stored = self.store.fetch_by_names(Table::Products, &names_of(&records, FIELD_NAME))?;
        let split = split_against_store(records, &stored, FIELD_NAME, &self.layouts.products);
        if split.matched.is_empty() {
            return Err(
                InventoryError::not_found("No match found with any of the product names").into()
            );
        }
        let history = self.store.transactions_for_client(actor.id)?;
        let ledgers = client_ledger(&history, &self.layouts.transactions);
        let classified = classify_purchases(split.matched, &ledgers, &actor)?;
        self.apply_if_needed(&classified.batch)?;

        if split.unmatched.is_empty() {
            return Ok(ServiceResponse::ok(message("Transaction successful")));
        }
        Ok(ServiceResponse::ok(report(
            "Transaction partially successful",
            &[("Successful", &classified.applied), ("No match for name found", &split.unmatched)],
        )))
    }

    /// Lists products with optional filter and order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn view_products(
        &self,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        let rows = self.store.fetch_all(Table::Products)?;
        self.view(Table::Products, rows, body)
    }

    // ------------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------------

    /// Adds clients; more than one at a time requires the administrator.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn add_clients(&self, body: &Map<String, Value>) -> Result<ServiceResponse, ServiceError> {
        let mut records = request_records(body)?;
        if records.len() > 1 && !matches!(verify_user(body, true), Ok(Principal::Admin)) {
            return Err(InventoryError::unauthorized(
                "Not authorized to create more than one account",
            )
            .into());
        }
        validate_records(&mut records, &NAME_FIELDS)?;
        let records = merge_duplicates(records, &MERGE_NAME)?;

        let _guard = self.write_guard()?;
        let stored = self.store.fetch_by_names(Table::Clients, &names_of(&records, FIELD_NAME))?;
        let split = split_against_store(records, &stored, FIELD_NAME, &self.layouts.clients);
        if split.unmatched.is_empty() {
            return Err(InventoryError::conflict("Task failed, all duplicates").into());
        }
        self.store.apply(&classify_client_inserts(&split.unmatched))?;

        if split.matched.is_empty() {
            return Ok(ServiceResponse::created(message("Task successful")));
        }
        Ok(ServiceResponse::created(report(
            "Task partially successful, duplicates found",
            &[("Successful", &split.unmatched), ("Duplicates in database", &split.matched)],
        )))
    }

    /// Removes clients by name (administrator) or the caller's own account.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn remove_clients(
        &self,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        let client_name = match verify_user(body, false)? {
            Principal::Admin => return self.remove_named_clients(body),
            Principal::Client(name) => name,
        };
        let _guard = self.write_guard()?;
        let actor = self.resolve_client(&client_name)?;
        self.store.apply(&MutationBatch {
            mutations: vec![Mutation::DeleteClient {
                id: actor.id,
            }],
            transactions: Vec::new(),
        })?;
        Ok(ServiceResponse::created(message("Task successful")))
    }

    /// Removes clients by name.
    fn remove_named_clients(
        &self,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        let mut records = request_records(body)?;
        validate_records(&mut records, &NAME_FIELDS)?;
        let records = merge_duplicates(records, &MERGE_NAME)?;

        let _guard = self.write_guard()?;
        let stored = self.store.fetch_by_names(Table::Clients, &names_of(&records, FIELD_NAME))?;
        let split = split_against_store(records, &stored, FIELD_NAME, &self.layouts.clients);
        let coverage = split.coverage();
        if coverage == Coverage::Nothing {
            return Err(
                InventoryError::not_found("No match found with any of the client names").into()
            );
        }
        self.store.apply(&classify_client_removals(&split.matched))?;

        if coverage == Coverage::All {
            return Ok(ServiceResponse::created(message(
                "Client information deleted successfully",
            )));
        }
        Ok(ServiceResponse::created(report(
            "Deletion partially successful",
            &[("Successful", &split.matched), ("No match found", &split.unmatched)],
        )))
    }

    /// Renames clients (administrator) or the caller's own account.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn edit_clients(&self, body: &Map<String, Value>) -> Result<ServiceResponse, ServiceError> {
        match verify_user(body, false)? {
            Principal::Admin => self.rename_clients(body),
            Principal::Client(name) => self.rename_own_account(body, &name),
        }
    }

    /// Applies administrator client renames.
    fn rename_clients(&self, body: &Map<String, Value>) -> Result<ServiceResponse, ServiceError> {
        let mut records = request_records(body)?;
        validate_records(&mut records, &CLIENT_EDIT_FIELDS)?;
        let records = merge_duplicates(records, &MERGE_EDIT)?;
        detect_rename_conflicts(&records, Table::Clients, FIELD_NAME, FIELD_NEW_NAME)?;

        let _guard = self.write_guard()?;
        let stored = self.store.fetch_by_names(Table::Clients, &names_of(&records, FIELD_NAME))?;
        let split = split_against_store(records, &stored, FIELD_NAME, &self.layouts.clients);
        if split.matched.is_empty() {
            return Err(
                InventoryError::not_found("No match found with any of the client names").into()
            );
        }
        let taken = self.taken_names(Table::Clients, &split.matched)?;
        let screen = screen_rename_targets(split.matched, &taken, FIELD_NAME, FIELD_NEW_NAME);
        reject_unapplied_renames(&screen.kept, &screen.skipped)?;
        self.apply_if_needed(&classify_client_renames(&screen.kept))?;

        if split.unmatched.is_empty() && screen.skipped.is_empty() {
            return Ok(ServiceResponse::created(message(
                "Client information changed successfully",
            )));
        }
        Ok(ServiceResponse::created(report(
            "Update partially successful",
            &[
                ("Successful", &screen.kept),
                ("No match for name found", &split.unmatched),
                (NEW_NAME_TAKEN_MESSAGE, &screen.skipped),
            ],
        )))
    }

    /// Renames the caller's own account.
    fn rename_own_account(
        &self,
        body: &Map<String, Value>,
        client_name: &str,
    ) -> Result<ServiceResponse, ServiceError> {
        let mut records = request_records(body)?;
        if records.len() != 1 {
            return Err(InventoryError::request_shape("Please choose only one new name").into());
        }
        validate_records(&mut records, &SELF_RENAME_FIELDS)?;
        let new_name = records
            .first()
            .and_then(|record| record.text(FIELD_NEW_NAME))
            .unwrap_or_default()
            .to_string();

        let _guard = self.write_guard()?;
        let actor = self.resolve_client(client_name)?;
        if new_name != actor.name
            && !self.store.fetch_by_names(Table::Clients, &[new_name.clone()])?.is_empty()
        {
            return Err(InventoryError::conflict(NEW_NAME_TAKEN_MESSAGE)
                .with(FIELD_NEW_NAME, new_name)
                .into());
        }
        self.store.apply(&MutationBatch {
            mutations: vec![Mutation::RenameClient {
                id: actor.id,
                name: new_name,
            }],
            transactions: Vec::new(),
        })?;
        Ok(ServiceResponse::created(message("Client information changed successfully")))
    }

    /// Lists clients (administrator) or returns the caller's own record.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn view_clients(&self, body: &Map<String, Value>) -> Result<ServiceResponse, ServiceError> {
        match verify_user(body, false)? {
            Principal::Admin => {
                let rows = self.store.fetch_all(Table::Clients)?;
                self.view(Table::Clients, rows, body)
            }
            Principal::Client(name) => {
                let row = self.client_row(&name)?;
                let schema = self.store.schema().table(Table::Clients)?;
                Ok(ServiceResponse::ok(row_object(&row, schema)))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------------

    /// Lists the transaction log (administrator) or the caller's entries.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for domain, store, or schema failures.
    pub fn view_transactions(
        &self,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        let rows = match verify_user(body, false)? {
            Principal::Admin => self.store.fetch_all(Table::Transactions)?,
            Principal::Client(name) => {
                let actor = self.resolve_client(&name)?;
                self.store.transactions_for_client(actor.id)?
            }
        };
        self.view(Table::Transactions, rows, body)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Runs a view request over fetched rows.
    fn view(
        &self,
        table: Table,
        rows: Vec<Row>,
        body: &Map<String, Value>,
    ) -> Result<ServiceResponse, ServiceError> {
        if rows.is_empty() {
            return Err(InventoryError::not_found("Table empty").into());
        }
        let request = ViewRequest::from_body(body)?;
        let schema = self.store.schema().table(table)?;
        let outcome = run_view(rows, &request, schema)?;
        if !outcome.has_rows() && !outcome.errors.is_empty() {
            return Ok(ServiceResponse::errors(&outcome.errors));
        }
        Ok(ServiceResponse::ok(Value::Array(present(&outcome.entries, &outcome.errors, schema))))
    }

    /// Looks up a client row by name.
    fn client_row(&self, name: &str) -> Result<Row, ServiceError> {
        self.store
            .client_by_name(name)?
            .ok_or_else(|| InventoryError::not_found("Client not found").into())
    }

    /// Resolves a client name to a log identity.
    fn resolve_client(&self, name: &str) -> Result<Actor, ServiceError> {
        let row = self.client_row(name)?;
        let id = self.layouts.clients.id_of(&row).ok_or_else(|| {
            StoreError::Invalid(format!("client {name} has no integer identifier"))
        })?;
        Ok(Actor {
            id,
            name: name.to_string(),
        })
    }

    /// Returns stored names equal to any rename target in `records`.
    fn taken_names(
        &self,
        table: Table,
        records: &[RequestRecord],
    ) -> Result<BTreeSet<String>, ServiceError> {
        let targets = names_of(records, FIELD_NEW_NAME);
        if targets.is_empty() {
            return Ok(BTreeSet::new());
        }
        let layout = match table {
            Table::Clients => &self.layouts.clients,
            Table::Products | Table::Transactions => &self.layouts.products,
        };
        let rows = self.store.fetch_by_names(table, &targets)?;
        Ok(rows.iter().filter_map(|row| layout.name_of(row)).map(ToString::to_string).collect())
    }

    /// Applies a batch unless it is empty.
    fn apply_if_needed(&self, batch: &MutationBatch) -> Result<(), ServiceError> {
        if !batch.is_empty() {
            self.store.apply(batch)?;
        }
        Ok(())
    }

    /// Serializes write batches.
    fn write_guard(&self) -> Result<MutexGuard<'_, ()>, ServiceError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Store("inventory write lock poisoned".to_string()).into())
    }
}

// ============================================================================
// SECTION: Response Helpers
// ============================================================================

/// Collects the text values of one field.
fn names_of(records: &[RequestRecord], field: &str) -> Vec<String> {
    records.iter().filter_map(|record| record.text(field)).map(ToString::to_string).collect()
}

/// Fails when renames were held back and no record of the batch applied.
fn reject_unapplied_renames(
    applied: &[RequestRecord],
    skipped: &[RequestRecord],
) -> InventoryResult<()> {
    if !applied.is_empty() || skipped.is_empty() {
        return Ok(());
    }
    Err(skipped.iter().fold(InventoryError::conflict(NEW_NAME_TAKEN_MESSAGE), |error, record| {
        error.with_record(record.to_json())
    }))
}

/// Builds a `{"message": ...}` body.
fn message(text: &str) -> Value {
    json!({ "message": text })
}

/// Builds a partial-success report, omitting empty groups.
fn report(text: &str, groups: &[(&str, &Vec<RequestRecord>)]) -> Value {
    let mut parts = vec![message(text)];
    for (label, records) in groups {
        if records.is_empty() {
            continue;
        }
        let mut group = Map::new();
        group.insert(
            (*label).to_string(),
            Value::Array(records.iter().map(RequestRecord::to_json).collect()),
        );
        parts.push(Value::Object(group));
    }
    Value::Array(parts)
}
