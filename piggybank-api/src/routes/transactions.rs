/// Transaction endpoints
///
/// Every handler acts on the [`CurrentUser`] resolved by the auth middleware.
/// A transaction owned by someone else is indistinguishable from one that
/// does not exist: both answer 404.
///
/// # Endpoints
///
/// - `POST /api/v1/transactions/` - Record a transaction (201)
/// - `GET /api/v1/transactions/?skip=0&limit=100` - List, newest first
/// - `GET /api/v1/transactions/:id` - Fetch one
/// - `PUT /api/v1/transactions/:id` - Partial update
/// - `DELETE /api/v1/transactions/:id` - Delete (204)

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use piggybank_shared::{
    auth::context::CurrentUser,
    models::{
        double_option,
        transaction::{CreateTransaction, Transaction, UpdateTransaction},
    },
};
use serde::Deserialize;
use validator::Validate;

/// Largest page the list endpoint returns
pub const MAX_PAGE_SIZE: i64 = 100;

const CATEGORY_MAX: usize = 100;
const NOTE_MAX: usize = 500;

/// Create transaction request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(length(min = 1, max = 255, message = "Item name must be 1-255 characters"))]
    pub item_name: String,

    /// Smallest currency unit
    #[validate(range(
        min = 1,
        max = 2147483647,
        message = "Amount must be between 1 and 2147483647"
    ))]
    pub amount: i64,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Update transaction request
///
/// Omitted fields stay unchanged. `category` and `note` may be set to
/// `null` to clear them.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTransactionRequest {
    #[validate(length(min = 1, max = 255, message = "Item name must be 1-255 characters"))]
    pub item_name: Option<String>,

    #[validate(range(
        min = 1,
        max = 2147483647,
        message = "Amount must be between 1 and 2147483647"
    ))]
    pub amount: Option<i64>,

    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

impl UpdateTransactionRequest {
    /// Length checks for the nullable fields
    fn validate_nullable(&self) -> ApiResult<()> {
        check_max_chars("category", &self.category, CATEGORY_MAX)?;
        check_max_chars("note", &self.note, NOTE_MAX)
    }
}

fn check_max_chars(field: &str, value: &Option<Option<String>>, max: usize) -> ApiResult<()> {
    match value {
        Some(Some(text)) if text.chars().count() > max => Err(ApiError::invalid_field(
            field,
            &format!("{} must be at most {} characters", capitalize(field), max),
        )),
        _ => Ok(()),
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: Option<i64>,

    #[serde(default)]
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Offset and page size after defaults and clamping
    pub fn page(&self) -> ApiResult<(i64, i64)> {
        let skip = self.skip.unwrap_or(0);
        if skip < 0 {
            return Err(ApiError::invalid_field("skip", "skip must not be negative"));
        }
        let limit = self.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Ok((skip, limit))
    }
}

/// Record a transaction
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    validate_request(&req)?;

    let transaction = state
        .store
        .create(
            user.id(),
            CreateTransaction {
                item_name: req.item_name,
                amount: req.amount,
                category: req.category,
                note: req.note,
            },
        )
        .await?;

    tracing::info!(
        user_id = user.id(),
        transaction_id = transaction.id,
        amount = transaction.amount,
        "Transaction created"
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// List the caller's transactions, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let (skip, limit) = query.page()?;
    let transactions = state.store.list(user.id(), skip, limit).await?;
    Ok(Json(transactions))
}

/// Fetch one transaction
pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Transaction>> {
    state
        .store
        .find(user.id(), id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::transaction_not_found)
}

/// Partially update a transaction
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTransactionRequest>,
) -> ApiResult<Json<Transaction>> {
    validate_request(&req)?;
    req.validate_nullable()?;

    let changes = UpdateTransaction {
        item_name: req.item_name,
        amount: req.amount,
        category: req.category,
        note: req.note,
    };

    let transaction = state
        .store
        .update(user.id(), id, changes)
        .await?
        .ok_or_else(ApiError::transaction_not_found)?;

    tracing::info!(user_id = user.id(), transaction_id = id, "Transaction updated");

    Ok(Json(transaction))
}

/// Delete a transaction
pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.store.delete(user.id(), id).await? {
        return Err(ApiError::transaction_not_found());
    }

    tracing::info!(user_id = user.id(), transaction_id = id, "Transaction deleted");

    Ok(StatusCode::NO_CONTENT)
}
