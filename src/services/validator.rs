//! Business rules for proposed transactions.
//!
//! Pure functions, no store access. Rules are checked in this order:
//!
//! 1. amount must be strictly positive and storable without rounding
//!    (at most four decimal places, below 10^16) → `InvalidAmount`
//! 2. type must be `deposit` or `withdrawal` (any case) → `InvalidTransactionType`
//! 3. a withdrawal must not exceed the balance → `InsufficientFunds`
//!
//! Rule 3 is only meaningful against a balance read inside the same ledger
//! scope that will apply the change.

use rust_decimal::Decimal;

use crate::{error::AppError, models::transaction::TransactionType, store::fits_money_column};

/// Check the rules that need no balance (1 and 2).
pub fn check_request(amount: Decimal, transaction_type: &str) -> Result<TransactionType, AppError> {
    if amount <= Decimal::ZERO || !fits_money_column(amount) {
        return Err(AppError::InvalidAmount);
    }

    transaction_type
        .parse()
        .map_err(|_| AppError::InvalidTransactionType)
}

/// Check that `balance` covers the transaction (rule 3).
pub fn check_funds(
    transaction_type: TransactionType,
    amount: Decimal,
    balance: Decimal,
) -> Result<(), AppError> {
    if transaction_type == TransactionType::Withdrawal && amount > balance {
        return Err(AppError::InsufficientFunds);
    }
    Ok(())
}

/// Run every rule against the given balance.
pub fn validate(
    amount: Decimal,
    transaction_type: &str,
    balance: Decimal,
) -> Result<TransactionType, AppError> {
    let transaction_type = check_request(amount, transaction_type)?;
    check_funds(transaction_type, amount, balance)?;
    Ok(transaction_type)
}
