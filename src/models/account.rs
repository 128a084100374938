//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing an account
//! - `AccountType` / `AccountStatus`: the closed sets stored as text columns
//! - `NewAccount`: what the opener hands to the store
//! - `NewAccountRequest`, `NewAccountResponse`, `AccountResponse`: API bodies

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of account. Fixed at opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Checking,
}

impl AccountType {
    /// Column value stored in `accounts.account_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Checking => "checking",
        }
    }
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    /// Column value stored in `accounts.status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

/// A text value that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for AccountType {
    type Err = UnknownVariant;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountType::Savings),
            "checking" => Ok(AccountType::Checking),
            _ => Err(UnknownVariant {
                kind: "account type",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            _ => Err(UnknownVariant {
                kind: "account status",
                value: s.to_string(),
            }),
        }
    }
}

// sqlx decodes the text columns through these.
impl TryFrom<String> for AccountType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for AccountStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. Each account:
/// - Belongs to one customer (`owner_id`)
/// - Has a decimal balance that only the transaction service mutates
///
/// # Balance
///
/// Must be >= 0 after every committed transaction (also enforced by a
/// database CHECK constraint).
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    /// Unique identifier, assigned by the store
    #[sqlx(rename = "account_id")]
    pub id: Uuid,

    /// Customer that owns this account
    pub owner_id: String,

    /// When the account was opened
    pub opening_date: DateTime<Utc>,

    #[sqlx(try_from = "String")]
    pub account_type: AccountType,

    /// Current balance
    pub balance: Decimal,

    #[sqlx(try_from = "String")]
    pub status: AccountStatus,
}

/// Account fields supplied by the opener; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub owner_id: String,
    pub opening_date: DateTime<Utc>,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub status: AccountStatus,
}

impl NewAccount {
    /// Attach a store-assigned id.
    pub fn with_id(self, id: Uuid) -> Account {
        Account {
            id,
            owner_id: self.owner_id,
            opening_date: self.opening_date,
            account_type: self.account_type,
            balance: self.balance,
            status: self.status,
        }
    }
}

/// Request body for opening a new account.
///
/// The owning customer comes from the URL path.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_type": "savings",
///   "amount": "6000.00"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct NewAccountRequest {
    /// `savings` or `checking`, any case
    pub account_type: String,

    /// Initial deposit
    pub amount: Decimal,
}

/// Response body after opening an account.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewAccountResponse {
    pub account_id: Uuid,
}

impl From<Account> for NewAccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
        }
    }
}

/// Response body for account reads.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": "550e8400-e29b-41d4-a716-446655440000",
///   "customer_id": "2000",
///   "opening_date": "2025-12-20T10:00:00Z",
///   "account_type": "savings",
///   "balance": "5000",
///   "status": "active"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub customer_id: String,
    pub opening_date: DateTime<Utc>,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub status: AccountStatus,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            customer_id: account.owner_id,
            opening_date: account.opening_date,
            account_type: account.account_type,
            balance: account.balance,
            status: account.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_parses_any_case() {
        assert_eq!("SAVINGS".parse::<AccountType>(), Ok(AccountType::Savings));
        assert_eq!("Checking".parse::<AccountType>(), Ok(AccountType::Checking));
        assert!("brokerage".parse::<AccountType>().is_err());
    }

    #[test]
    fn column_values_round_trip_through_try_from() {
        for status in [AccountStatus::Active, AccountStatus::Inactive] {
            assert_eq!(
                AccountStatus::try_from(status.as_str().to_string()),
                Ok(status)
            );
        }
    }
}
