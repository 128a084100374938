//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `Transaction`: Database entity representing a committed transaction
//! - `NewTransaction`: what the transaction service inserts inside a ledger scope
//! - `TransactionRequest` / `TransactionResponse`: API bodies

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::account::UnknownVariant;

/// Direction of a transaction. The stored amount is always positive;
/// the type decides the sign of its effect on the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    /// Column value stored in `transactions.transaction_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }

    /// Balance change caused by moving `amount` in this direction.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Deposit => amount,
            TransactionType::Withdrawal => -amount,
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            _ => Err(UnknownVariant {
                kind: "transaction type",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TransactionType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Rows are append-only: once committed
/// they are never updated or deleted.
///
/// `resulting_balance` is the account balance right after this transaction
/// was applied, stamped inside the same database transaction.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Transaction {
    #[sqlx(rename = "transaction_id")]
    pub id: Uuid,

    pub account_id: Uuid,

    #[sqlx(try_from = "String")]
    pub transaction_type: TransactionType,

    /// Positive magnitude (enforced by CHECK constraint)
    pub amount: Decimal,

    pub transaction_date: DateTime<Utc>,

    /// Always set on committed rows
    pub resulting_balance: Option<Decimal>,
}

/// A transaction row about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
}

/// Outcome of a successfully applied transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedTransaction {
    pub transaction_id: Uuid,
    pub resulting_balance: Decimal,
}

/// Request to deposit into or withdraw from an account.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": "550e8400-e29b-41d4-a716-446655440000",
///   "transaction_type": "withdrawal",
///   "amount": "150.00"
/// }
/// ```
///
/// `transaction_type` is kept as raw text so that an unknown type is reported
/// as a business rule rejection rather than a decoding failure.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub account_id: Uuid,
    pub transaction_type: String,
    pub amount: Decimal,
}

/// Response returned after applying a transaction.
///
/// ```json
/// {
///   "transaction_id": "770e8400-e29b-41d4-a716-446655440002",
///   "account_balance": "50.00"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction_id: Uuid,
    pub account_balance: Decimal,
}

impl From<AppliedTransaction> for TransactionResponse {
    fn from(applied: AppliedTransaction) -> Self {
        Self {
            transaction_id: applied.transaction_id,
            account_balance: applied.resulting_balance,
        }
    }
}

/// Full transaction record returned by history and lookup endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionRecordResponse {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub resulting_balance: Option<Decimal>,
}

impl From<Transaction> for TransactionRecordResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            transaction_id: transaction.id,
            account_id: transaction.account_id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            transaction_date: transaction.transaction_date,
            resulting_balance: transaction.resulting_balance,
        }
    }
}
