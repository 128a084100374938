//! Transaction service - Core business logic for financial transactions.
//!
//! This service handles:
//! - Request validation before the store is touched
//! - Balance validation against a locked, freshly read balance
//! - Atomic insert-transaction + adjust-balance + stamp-resulting-balance
//! - Rollback on any failure inside the scope
//!
//! # Atomicity Guarantees
//!
//! Every write happens inside one [`LedgerScope`]. Either the transaction row
//! and the balance change are both committed, or neither is. Nothing is
//! retried here; a failed call can be repeated by the caller.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::{AppError, StoreError},
    models::transaction::{AppliedTransaction, NewTransaction, Transaction, TransactionType},
    services::validator,
    store::{LedgerScope, LedgerStore},
};

/// Apply a deposit or withdrawal to an account.
///
/// # Process
///
/// 1. Check amount and type (no store access)
/// 2. Open a ledger scope and lock the account's balance
/// 3. Check funds against that balance
/// 4. Insert the transaction row
/// 5. Adjust the balance by the signed amount, reading the new balance back
/// 6. Stamp the new balance onto the transaction row
/// 7. Commit (or roll back on error)
///
/// # Errors
///
/// - `InvalidAmount`, `InvalidTransactionType`, `InsufficientFunds`: business rule rejections
/// - `AccountNotFound`: account doesn't exist
/// - `Busy`: the account lock could not be obtained in time
/// - `Storage`: the store failed; nothing was persisted
pub async fn apply_transaction(
    store: &dyn LedgerStore,
    account_id: Uuid,
    transaction_type: &str,
    amount: Decimal,
) -> Result<AppliedTransaction, AppError> {
    let transaction_type = validator::check_request(amount, transaction_type)
        .inspect_err(|err| tracing::debug!(%account_id, %amount, "transaction rejected: {err}"))?;

    let mut scope = store
        .begin()
        .await
        .map_err(|err| storage_failure(account_id, err))?;

    let balance = match scope.lock_balance(account_id).await {
        Ok(Some(balance)) => balance,
        Ok(None) => {
            abort(scope, account_id).await;
            return Err(AppError::AccountNotFound);
        }
        Err(err) => {
            abort(scope, account_id).await;
            return Err(storage_failure(account_id, err));
        }
    };

    if let Err(err) = validator::check_funds(transaction_type, amount, balance) {
        abort(scope, account_id).await;
        tracing::debug!(%account_id, %amount, %balance, "transaction rejected: {err}");
        return Err(err);
    }

    let applied = match write(scope.as_mut(), account_id, transaction_type, amount).await {
        Ok(applied) => applied,
        Err(err) => {
            abort(scope, account_id).await;
            return Err(storage_failure(account_id, err));
        }
    };

    scope
        .commit()
        .await
        .map_err(|err| storage_failure(account_id, err))?;

    tracing::info!(
        %account_id,
        transaction_id = %applied.transaction_id,
        transaction_type = %transaction_type,
        %amount,
        resulting_balance = %applied.resulting_balance,
        "transaction committed"
    );

    Ok(applied)
}

/// Writes of steps 4-6. Any error leaves the scope for the caller to roll back.
async fn write(
    scope: &mut dyn LedgerScope,
    account_id: Uuid,
    transaction_type: TransactionType,
    amount: Decimal,
) -> Result<AppliedTransaction, StoreError> {
    let transaction_id = scope
        .insert_transaction(NewTransaction {
            account_id,
            transaction_type,
            amount,
            transaction_date: Utc::now(),
        })
        .await?;

    let resulting_balance = scope
        .adjust_balance(account_id, transaction_type.signed(amount))
        .await?;

    scope
        .stamp_resulting_balance(transaction_id, resulting_balance)
        .await?;

    Ok(AppliedTransaction {
        transaction_id,
        resulting_balance,
    })
}

async fn abort(scope: Box<dyn LedgerScope>, account_id: Uuid) {
    if let Err(err) = scope.rollback().await {
        // the scope is gone either way; the store discards uncommitted work
        tracing::warn!(%account_id, "rollback failed: {err}");
    }
}

fn storage_failure(account_id: Uuid, err: StoreError) -> AppError {
    match AppError::from(err) {
        AppError::Busy => {
            tracing::warn!(%account_id, "ledger busy, transaction not applied");
            AppError::Busy
        }
        err => {
            tracing::error!(%account_id, "transaction rolled back: {err}");
            err
        }
    }
}

/// Get transaction by ID.
pub async fn get_transaction(
    store: &dyn LedgerStore,
    transaction_id: Uuid,
) -> Result<Transaction, AppError> {
    store
        .get_transaction(transaction_id)
        .await
        .inspect_err(|err| tracing::error!(%transaction_id, "transaction lookup failed: {err}"))?
        .ok_or(AppError::TransactionNotFound)
}

/// Committed history of an account, oldest first.
pub async fn list_transactions(
    store: &dyn LedgerStore,
    account_id: Uuid,
) -> Result<Vec<Transaction>, AppError> {
    let account = store
        .get_account(account_id)
        .await
        .inspect_err(|err| tracing::error!(%account_id, "account lookup failed: {err}"))?;
    if account.is_none() {
        return Err(AppError::AccountNotFound);
    }

    let transactions = store
        .list_transactions(account_id)
        .await
        .inspect_err(|err| tracing::error!(%account_id, "history lookup failed: {err}"))?;

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::account::{AccountStatus, AccountType, NewAccount},
        store::{FailPoint, MemoryLedger},
    };
    use rust_decimal::dec;

    async fn ledger_with(balance: Decimal) -> (MemoryLedger, Uuid) {
        let ledger = MemoryLedger::default();
        let account = ledger
            .insert_account(NewAccount {
                owner_id: "2000".to_string(),
                opening_date: Utc::now(),
                account_type: AccountType::Savings,
                balance,
                status: AccountStatus::Active,
            })
            .await
            .unwrap();
        (ledger, account.id)
    }

    async fn balance_of(ledger: &MemoryLedger, id: Uuid) -> Decimal {
        ledger.get_account(id).await.unwrap().unwrap().balance
    }

    #[tokio::test]
    async fn deposit_then_withdrawal_stamps_each_balance() {
        let (ledger, id) = ledger_with(dec!(0)).await;

        let first = apply_transaction(&ledger, id, "deposit", dec!(200)).await.unwrap();
        let second = apply_transaction(&ledger, id, "withdrawal", dec!(150))
            .await
            .unwrap();

        assert_eq!(first.resulting_balance, dec!(200));
        assert_eq!(second.resulting_balance, dec!(50));
        assert_eq!(balance_of(&ledger, id).await, dec!(50));

        let history = list_transactions(&ledger, id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].id, second.transaction_id);
        assert_eq!(history[1].resulting_balance, Some(dec!(50)));
    }

    #[tokio::test]
    async fn insufficient_funds_leaves_balance_untouched() {
        let (ledger, id) = ledger_with(dec!(50)).await;

        let err = apply_transaction(&ledger, id, "withdrawal", dec!(100))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientFunds));
        assert_eq!(balance_of(&ledger, id).await, dec!(50));
        assert_eq!(ledger.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (ledger, _) = ledger_with(dec!(50)).await;

        let err = apply_transaction(&ledger, Uuid::new_v4(), "deposit", dec!(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AccountNotFound));
    }

    #[tokio::test]
    async fn invalid_request_never_opens_a_scope() {
        // A scope held elsewhere would make any store access time out.
        let ledger = MemoryLedger::new(std::time::Duration::from_millis(10));
        let _held = ledger.begin().await.unwrap();
        let id = Uuid::new_v4();

        let err = apply_transaction(&ledger, id, "deposit", dec!(-10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount));

        let err = apply_transaction(&ledger, id, "loan", dec!(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransactionType));
    }

    #[tokio::test]
    async fn failure_at_any_write_step_persists_nothing() {
        for point in [
            FailPoint::InsertTransaction,
            FailPoint::AdjustBalance,
            FailPoint::StampBalance,
            FailPoint::Commit,
        ] {
            let (ledger, id) = ledger_with(dec!(100)).await;
            ledger.fail_next(point).await;

            let err = apply_transaction(&ledger, id, "withdrawal", dec!(40))
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::Storage(_)), "{point:?}");
            assert_eq!(balance_of(&ledger, id).await, dec!(100), "{point:?}");
            assert_eq!(ledger.transaction_count().await, 0, "{point:?}");
        }
    }

    #[tokio::test]
    async fn amounts_the_ledger_cannot_store_are_invalid() {
        let (ledger, id) = ledger_with(dec!(5000)).await;

        for amount in [dec!(0.00001), Decimal::MAX] {
            let err = apply_transaction(&ledger, id, "deposit", amount)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidAmount), "{amount}");
        }
        assert_eq!(balance_of(&ledger, id).await, dec!(5000));
        assert_eq!(ledger.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn deposit_past_the_balance_ceiling_fails_without_panicking() {
        let (ledger, id) = ledger_with(dec!(5000)).await;

        let err = apply_transaction(&ledger, id, "deposit", dec!(9999999999999000))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(StoreError::Constraint(_))));
        assert_eq!(balance_of(&ledger, id).await, dec!(5000));
        assert_eq!(ledger.transaction_count().await, 0);

        // the ledger is still usable afterwards
        let applied = apply_transaction(&ledger, id, "deposit", dec!(1)).await.unwrap();
        assert_eq!(applied.resulting_balance, dec!(5001));
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let (ledger, _) = ledger_with(dec!(0)).await;

        assert!(matches!(
            get_transaction(&ledger, Uuid::new_v4()).await,
            Err(AppError::TransactionNotFound)
        ));
    }
}
