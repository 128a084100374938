//! Account HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/v1/customers/:customer_id/accounts - Open a new account
//! - GET /api/v1/accounts/:account_id - Get account by ID
//! - GET /api/v1/accounts/:account_id/transactions - Transaction history

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::{
        account::{AccountResponse, NewAccountRequest, NewAccountResponse},
        transaction::TransactionRecordResponse,
    },
    services::{account_service, transaction_service},
};

/// Open a new account for a customer.
///
/// # Request Body
///
/// ```json
/// {
///   "account_type": "savings",
///   "amount": "6000.00"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{"account_id": "..."}`
/// - **Error (422)**: deposit below 5000 or unknown account type
pub async fn open_account(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<NewAccountRequest>,
) -> Result<(StatusCode, Json<NewAccountResponse>), AppError> {
    let account = account_service::open_account(
        state.store.as_ref(),
        &customer_id,
        &request.account_type,
        request.amount,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Get a specific account by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns account details
/// - **Error (404)**: Account not found
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = account_service::get_account(state.store.as_ref(), account_id).await?;

    Ok(Json(account.into()))
}

/// List the committed transactions of an account, oldest first.
pub async fn list_account_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<TransactionRecordResponse>>, AppError> {
    let transactions =
        transaction_service::list_transactions(state.store.as_ref(), account_id).await?;

    let responses: Vec<TransactionRecordResponse> =
        transactions.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}
