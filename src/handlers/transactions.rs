//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/transactions - Deposit into or withdraw from an account
//! - GET /api/v1/transactions/:transaction_id - Get transaction details

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::transaction::{TransactionRecordResponse, TransactionRequest, TransactionResponse},
    services::transaction_service,
};

/// Apply a deposit or withdrawal.
///
/// # Request Body
///
/// ```json
/// {
///   "account_id": "550e8400-...",
///   "transaction_type": "withdrawal",
///   "amount": "150.00"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "transaction_id": "770e8400-...",
///   "account_balance": "50.00"
/// }
/// ```
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let applied = transaction_service::apply_transaction(
        state.store.as_ref(),
        request.account_id,
        &request.transaction_type,
        request.amount,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(applied.into())))
}

/// Get transaction by ID.
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionRecordResponse>, AppError> {
    let transaction =
        transaction_service::get_transaction(state.store.as_ref(), transaction_id).await?;

    Ok(Json(transaction.into()))
}
