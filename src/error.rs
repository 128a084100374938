//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failure raised by a ledger store.
///
/// Both the PostgreSQL and the in-memory store report through this type, so
/// the services never see a backend-specific error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Query, connection or commit failure reported by sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Waiting for a row lock or a pooled connection exceeded its bound.
    #[error("timed out waiting for the ledger")]
    Busy,

    /// A write would break a table constraint (non-negative balance, foreign key).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The store cannot serve the request (in-memory store outage).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// SQLSTATE raised by PostgreSQL when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let busy = match &err {
            sqlx::Error::PoolTimedOut => true,
            sqlx::Error::Database(db) => db.code().as_deref() == Some(LOCK_NOT_AVAILABLE),
            _ => false,
        };

        if busy {
            StoreError::Busy
        } else {
            StoreError::Database(err)
        }
    }
}

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Business rule rejections**: `InvalidAmount`, `InvalidTransactionType`,
///   `InsufficientFunds`, `InvalidAccountType`, `InsufficientInitialDeposit`.
///   Returned to the caller as-is and never retried.
/// - **Lookup errors**: requested account or transaction does not exist
/// - **Operational errors**: `Busy` and `Storage`
/// - **Authorization errors**: raised by the HTTP middleware only
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requested account does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Account not found")]
    AccountNotFound,

    /// Requested transaction does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// Amount is zero, negative, or not storable without rounding.
    #[error("Amount must be positive, below 10^16, with at most four decimal places")]
    InvalidAmount,

    /// Transaction type is neither `deposit` nor `withdrawal`.
    #[error("Transaction type can only be deposit or withdrawal")]
    InvalidTransactionType,

    /// Withdrawal amount exceeds the current balance.
    #[error("Not enough funds for withdrawal")]
    InsufficientFunds,

    /// Account type is neither `savings` nor `checking`.
    #[error("Account type should be checking or savings")]
    InvalidAccountType,

    /// Opening deposit is below the minimum.
    #[error("To open a new account you need to deposit at least 5000.00")]
    InsufficientInitialDeposit,

    /// A lock or connection wait exceeded its bound.
    ///
    /// Returns HTTP 503 Service Unavailable. The caller may retry.
    #[error("Ledger is busy, try again later")]
    Busy,

    /// Persistence failed; the atomic scope has been rolled back.
    ///
    /// Returns HTTP 500 (hides details from client).
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// Authorization header is missing or not a bearer token.
    #[error("Missing token")]
    Unauthorized,

    /// The authorization service denied the operation.
    #[error("Unauthorized")]
    Forbidden,
}

impl AppError {
    /// True for rejections caused by the request violating a business rule.
    fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            AppError::InvalidAmount
                | AppError::InvalidTransactionType
                | AppError::InsufficientFunds
                | AppError::InvalidAccountType
                | AppError::InsufficientInitialDeposit
        )
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Busy => AppError::Busy,
            other => AppError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from(err).into()
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `Unauthorized` → 401
/// - `Forbidden` → 403
/// - `AccountNotFound`, `TransactionNotFound` → 404
/// - business rule rejections → 422 Unprocessable Entity
/// - `Busy` → 503
/// - `Storage` → 500 (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            ref rejection if rejection.is_business_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::AccountNotFound | AppError::TransactionNotFound => StatusCode::NOT_FOUND,
            AppError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let code = match self {
            AppError::Unauthorized => "missing_token",
            AppError::Forbidden => "forbidden",
            AppError::AccountNotFound => "account_not_found",
            AppError::TransactionNotFound => "transaction_not_found",
            AppError::InvalidAmount => "invalid_amount",
            AppError::InvalidTransactionType => "invalid_transaction_type",
            AppError::InsufficientFunds => "insufficient_funds",
            AppError::InvalidAccountType => "invalid_account_type",
            AppError::InsufficientInitialDeposit => "insufficient_initial_deposit",
            AppError::Busy => "busy",
            AppError::Storage(_) => "internal_error",
        };

        let message = match self {
            AppError::Storage(_) => "An internal error occurred".to_string(),
            ref other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
