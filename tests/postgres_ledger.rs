//! Ledger behaviour against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a server where the test user may create
//! databases, then `cargo test -- --ignored`.

use std::time::Duration;

use ledger_core::{
    error::AppError,
    services::{account_service, transaction_service::apply_transaction},
    store::{LedgerStore, PgLedger},
};
use rust_decimal::{Decimal, dec};
use sqlx::PgPool;

fn ledger(pool: PgPool) -> PgLedger {
    PgLedger::new(pool, Duration::from_secs(5))
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn opened_account_is_readable(pool: PgPool) {
    let ledger = ledger(pool);

    let account = account_service::open_account(&ledger, "2000", "checking", dec!(5000))
        .await
        .unwrap();
    let stored = ledger.get_account(account.id).await.unwrap().unwrap();

    assert_eq!(stored.owner_id, "2000");
    assert_eq!(stored.balance, dec!(5000));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn applied_transaction_is_stamped(pool: PgPool) {
    let ledger = ledger(pool);
    let account = account_service::open_account(&ledger, "2000", "savings", dec!(5000))
        .await
        .unwrap();

    let applied = apply_transaction(&ledger, account.id, "withdrawal", dec!(4950))
        .await
        .unwrap();
    assert_eq!(applied.resulting_balance, dec!(50));

    let err = apply_transaction(&ledger, account.id, "withdrawal", dec!(100))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds));

    let history = ledger.list_transactions(account.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].resulting_balance, Some(dec!(50)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn row_lock_serializes_concurrent_withdrawals(pool: PgPool) {
    let ledger = ledger(pool);
    let id = account_service::open_account(&ledger, "2000", "savings", dec!(10000))
        .await
        .unwrap()
        .id;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { apply_transaction(&ledger, id, "withdrawal", dec!(750)).await })
        })
        .collect();

    let mut succeeded = 0u32;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientFunds) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 13);
    let balance = ledger.get_account(id).await.unwrap().unwrap().balance;
    assert_eq!(balance, dec!(10000) - dec!(750) * Decimal::from(succeeded));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rolled_back_scope_leaves_no_trace(pool: PgPool) {
    let ledger = ledger(pool);
    let account = account_service::open_account(&ledger, "2000", "savings", dec!(5000))
        .await
        .unwrap();

    let mut scope = ledger.begin().await.unwrap();
    scope.lock_balance(account.id).await.unwrap();
    scope.adjust_balance(account.id, dec!(-1000)).await.unwrap();
    scope.rollback().await.unwrap();

    let stored = ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, dec!(5000));
}
