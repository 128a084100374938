mod common;

use std::time::Duration;

use common::open;
use ledger_core::{
    error::AppError,
    services::transaction_service::{apply_transaction, list_transactions},
    store::{FailPoint, LedgerStore, MemoryLedger},
};
use rust_decimal::{Decimal, dec};
use uuid::Uuid;

async fn balance_of(ledger: &MemoryLedger, id: Uuid) -> Decimal {
    ledger.get_account(id).await.unwrap().unwrap().balance
}

/// N concurrent withdrawals of the same amount: exactly floor(B / amount) succeed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_lose_updates() {
    let ledger = MemoryLedger::default();
    let id = open(&ledger, dec!(10000)).await.id;
    let amount = dec!(750);

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                apply_transaction(&ledger, id, "withdrawal", amount).await
            })
        })
        .collect();

    let mut succeeded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientFunds) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 13);
    assert_eq!(rejected, 27);
    assert_eq!(
        balance_of(&ledger, id).await,
        dec!(10000) - amount * Decimal::from(succeeded)
    );
    assert_eq!(ledger.transaction_count().await, 13);
}

/// Concurrent deposits and withdrawals settle to the sum of what committed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_deposits_and_withdrawals_stay_consistent() {
    let ledger = MemoryLedger::default();
    let id = open(&ledger, dec!(5000)).await.id;

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let ledger = ledger.clone();
            let kind = if i % 2 == 0 { "deposit" } else { "withdrawal" };
            tokio::spawn(async move {
                apply_transaction(&ledger, id, kind, dec!(100)).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(balance_of(&ledger, id).await, dec!(5000));

    // Every stamped balance is non-negative and the last one matches the account.
    let history = list_transactions(&ledger, id).await.unwrap();
    assert_eq!(history.len(), 50);
    assert!(
        history
            .iter()
            .all(|t| t.resulting_balance.is_some_and(|b| b >= Decimal::ZERO))
    );
    assert_eq!(
        history.last().unwrap().resulting_balance,
        Some(dec!(5000))
    );
}

#[tokio::test]
async fn read_after_commit_matches_stamped_balance() {
    let ledger = MemoryLedger::default();
    let account = open(&ledger, dec!(5000)).await;

    let applied = apply_transaction(&ledger, account.id, "Deposit", dec!(123.45))
        .await
        .unwrap();

    assert_eq!(applied.resulting_balance, dec!(5123.45));
    assert_eq!(
        balance_of(&ledger, account.id).await,
        applied.resulting_balance
    );
    let stored = ledger
        .get_transaction(applied.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.resulting_balance, Some(applied.resulting_balance));
}

#[tokio::test]
async fn mid_operation_failure_is_all_or_nothing() {
    let ledger = MemoryLedger::default();
    let account = open(&ledger, dec!(5000)).await;

    ledger.fail_next(FailPoint::AdjustBalance).await;
    let err = apply_transaction(&ledger, account.id, "deposit", dec!(10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(balance_of(&ledger, account.id).await, dec!(5000));
    assert_eq!(ledger.transaction_count().await, 0);

    // The fault is one-shot and the ledger keeps working afterwards.
    let applied = apply_transaction(&ledger, account.id, "deposit", dec!(10))
        .await
        .unwrap();
    assert_eq!(applied.resulting_balance, dec!(5010));
    assert_eq!(ledger.transaction_count().await, 1);
}

#[tokio::test]
async fn lock_wait_is_bounded() {
    let ledger = MemoryLedger::new(Duration::from_millis(50));
    let account = open(&ledger, dec!(5000)).await;

    let held = ledger.begin().await.unwrap();
    let err = apply_transaction(&ledger, account.id, "withdrawal", dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Busy));
    drop(held);

    assert_eq!(balance_of(&ledger, account.id).await, dec!(5000));
}

#[tokio::test]
async fn request_cancelled_while_waiting_for_the_lock_changes_nothing() {
    let ledger = MemoryLedger::default();
    let account = open(&ledger, dec!(5000)).await;
    let id = account.id;

    let held = ledger.begin().await.unwrap();
    let pending = {
        let ledger = ledger.clone();
        tokio::spawn(async move { apply_transaction(&ledger, id, "withdrawal", dec!(500)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    drop(held);

    assert_eq!(balance_of(&ledger, account.id).await, dec!(5000));
    assert_eq!(ledger.transaction_count().await, 0);

    let applied = apply_transaction(&ledger, account.id, "withdrawal", dec!(500))
        .await
        .unwrap();
    assert_eq!(applied.resulting_balance, dec!(4500));
}

#[tokio::test]
async fn request_cancelled_mid_write_changes_nothing() {
    let ledger = MemoryLedger::default();
    let id = open(&ledger, dec!(5000)).await.id;

    // Park the scope after its transaction row is staged, before the balance moves.
    let parked = ledger.stall_next(FailPoint::AdjustBalance).await;
    let pending = {
        let ledger = ledger.clone();
        tokio::spawn(async move { apply_transaction(&ledger, id, "withdrawal", dec!(500)).await })
    };
    parked.await.unwrap();
    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());

    assert_eq!(balance_of(&ledger, id).await, dec!(5000));
    assert_eq!(ledger.transaction_count().await, 0);

    let applied = apply_transaction(&ledger, id, "withdrawal", dec!(500))
        .await
        .unwrap();
    assert_eq!(applied.resulting_balance, dec!(4500));
    assert_eq!(ledger.transaction_count().await, 1);
}

#[tokio::test]
async fn withdrawal_from_fifty_is_rejected() {
    let ledger = MemoryLedger::default();
    let account = open(&ledger, dec!(5000)).await;
    apply_transaction(&ledger, account.id, "withdrawal", dec!(4950))
        .await
        .unwrap();

    let err = apply_transaction(&ledger, account.id, "withdrawal", dec!(100))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientFunds));
    assert_eq!(balance_of(&ledger, account.id).await, dec!(50));
}
