//! Account service - opening and reading accounts.
//!
//! Opening an account is a single-row insert; there is no prior balance to
//! reconcile, so it does not need a ledger scope.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::account::{Account, AccountStatus, AccountType, NewAccount},
    store::{LedgerStore, fits_money_column},
};

/// Smallest initial deposit accepted when opening an account (5000.00).
pub const MIN_OPENING_DEPOSIT: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

/// Open a new account for `owner_id` funded with `initial_deposit`.
///
/// # Validation
///
/// - `initial_deposit` must be at least [`MIN_OPENING_DEPOSIT`]
/// - `initial_deposit` must fit the balance column, else `InvalidAmount`
/// - `account_type` must be `savings` or `checking`, any case
///
/// The account starts `active`, with `balance = initial_deposit` and `opening_date = now`.
pub async fn open_account(
    store: &dyn LedgerStore,
    owner_id: &str,
    account_type: &str,
    initial_deposit: Decimal,
) -> Result<Account, AppError> {
    if initial_deposit < MIN_OPENING_DEPOSIT {
        return Err(AppError::InsufficientInitialDeposit);
    }
    if !fits_money_column(initial_deposit) {
        return Err(AppError::InvalidAmount);
    }

    let account_type: AccountType = account_type
        .parse()
        .map_err(|_| AppError::InvalidAccountType)?;

    let account = store
        .insert_account(NewAccount {
            owner_id: owner_id.to_string(),
            opening_date: Utc::now(),
            account_type,
            balance: initial_deposit,
            status: AccountStatus::Active,
        })
        .await
        .inspect_err(|err| tracing::error!(owner_id, "account insert failed: {err}"))?;

    tracing::info!(
        account_id = %account.id,
        owner_id,
        account_type = %account.account_type,
        balance = %account.balance,
        "account opened"
    );

    Ok(account)
}

/// Committed state of an account.
pub async fn get_account(store: &dyn LedgerStore, account_id: Uuid) -> Result<Account, AppError> {
    store
        .get_account(account_id)
        .await
        .inspect_err(|err| tracing::error!(%account_id, "account lookup failed: {err}"))?
        .ok_or(AppError::AccountNotFound)
}
