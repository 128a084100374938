//! In-memory ledger store.
//!
//! The tables live behind a single `tokio::sync::Mutex`. A [`MemoryScope`]
//! holds the owned guard for its whole lifetime, so scopes are fully
//! serialized. Writes are staged in the scope and only copied into the tables
//! on commit; dropping the scope discards them.
//!
//! [`MemoryLedger::fail_next`] arms a one-shot fault at a chosen step so that
//! callers can observe rollback behaviour. [`MemoryLedger::stall_next`] parks
//! the next scope at a step instead, so a caller can cancel it mid-write.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard, oneshot};
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{
        account::{Account, NewAccount},
        transaction::{NewTransaction, Transaction},
    },
    store::{LedgerScope, LedgerStore, fits_money_column},
};

/// Step of a scope at which an armed fault or stall fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertTransaction,
    AdjustBalance,
    StampBalance,
    Commit,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    // append-only, commit order
    transactions: Vec<Transaction>,
    fault: Option<FailPoint>,
    stall: Option<(FailPoint, oneshot::Sender<()>)>,
}

impl Tables {
    fn trip(&mut self, point: FailPoint) -> Result<(), StoreError> {
        if self.fault == Some(point) {
            self.fault = None;
            return Err(StoreError::Unavailable(format!(
                "injected fault at {point:?}"
            )));
        }
        Ok(())
    }

    /// Take the armed stall if it is set for `point`.
    fn stall_at(&mut self, point: FailPoint) -> Option<oneshot::Sender<()>> {
        match self.stall.take() {
            Some((at, reached)) if at == point => Some(reached),
            other => {
                self.stall = other;
                None
            }
        }
    }
}

fn out_of_range(what: &str) -> StoreError {
    StoreError::Constraint(format!("{what} out of range"))
}

/// Ledger store keeping everything in process memory.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    tables: Arc<Mutex<Tables>>,
    lock_timeout: Duration,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl MemoryLedger {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            lock_timeout,
        }
    }

    /// Make the next scope that reaches `point` fail with a storage error.
    pub async fn fail_next(&self, point: FailPoint) {
        self.tables.lock().await.fault = Some(point);
    }

    /// Park the next scope that reaches `point` until it is dropped.
    ///
    /// The returned receiver resolves once the scope is parked.
    pub async fn stall_next(&self, point: FailPoint) -> oneshot::Receiver<()> {
        let (reached, parked) = oneshot::channel();
        self.tables.lock().await.stall = Some((point, reached));
        parked
    }

    /// Number of committed transaction rows across all accounts.
    pub async fn transaction_count(&self) -> usize {
        self.tables.lock().await.transactions.len()
    }

    async fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        tokio::time::timeout(self.lock_timeout, self.tables.lock())
            .await
            .map_err(|_| StoreError::Busy)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().await.map(|_| ())
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.lock().await?.accounts.get(&account_id).cloned())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        if account.balance < Decimal::ZERO {
            return Err(StoreError::Constraint("balance must be >= 0".to_string()));
        }
        if !fits_money_column(account.balance) {
            return Err(out_of_range("balance"));
        }

        let account = account.with_id(Uuid::new_v4());
        self.lock()
            .await?
            .accounts
            .insert(account.id, account.clone());

        Ok(account)
    }

    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .lock()
            .await?
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned())
    }

    async fn list_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .lock()
            .await?
            .transactions
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerScope>, StoreError> {
        let guard = tokio::time::timeout(self.lock_timeout, self.tables.clone().lock_owned())
            .await
            .map_err(|_| StoreError::Busy)?;

        Ok(Box::new(MemoryScope {
            guard,
            balances: HashMap::new(),
            inserted: Vec::new(),
        }))
    }
}

/// Scope over the in-memory tables; holds the table lock until it ends.
pub struct MemoryScope {
    guard: OwnedMutexGuard<Tables>,
    // staged balances, keyed by account
    balances: HashMap<Uuid, Decimal>,
    inserted: Vec<Transaction>,
}

impl MemoryScope {
    async fn checkpoint(&mut self, point: FailPoint) -> Result<(), StoreError> {
        self.guard.trip(point)?;

        if let Some(reached) = self.guard.stall_at(point) {
            let _ = reached.send(());
            // resumes only by being dropped
            std::future::pending::<()>().await;
        }

        Ok(())
    }

    fn current_balance(&self, account_id: Uuid) -> Option<Decimal> {
        self.balances.get(&account_id).copied().or_else(|| {
            self.guard
                .accounts
                .get(&account_id)
                .map(|account| account.balance)
        })
    }
}

#[async_trait]
impl LedgerScope for MemoryScope {
    async fn lock_balance(&mut self, account_id: Uuid) -> Result<Option<Decimal>, StoreError> {
        Ok(self.current_balance(account_id))
    }

    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Uuid, StoreError> {
        self.checkpoint(FailPoint::InsertTransaction).await?;

        if !self.guard.accounts.contains_key(&transaction.account_id) {
            return Err(StoreError::Constraint(format!(
                "account {} does not exist",
                transaction.account_id
            )));
        }
        if transaction.amount <= Decimal::ZERO {
            return Err(StoreError::Constraint("amount must be > 0".to_string()));
        }
        if !fits_money_column(transaction.amount) {
            return Err(out_of_range("amount"));
        }

        let id = Uuid::new_v4();
        self.inserted.push(Transaction {
            id,
            account_id: transaction.account_id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            transaction_date: transaction.transaction_date,
            resulting_balance: None,
        });

        Ok(id)
    }

    async fn adjust_balance(
        &mut self,
        account_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, StoreError> {
        self.checkpoint(FailPoint::AdjustBalance).await?;

        let current = self
            .current_balance(account_id)
            .ok_or_else(|| StoreError::Constraint(format!("account {account_id} does not exist")))?;

        let updated = current
            .checked_add(delta)
            .filter(|balance| fits_money_column(*balance))
            .ok_or_else(|| out_of_range("balance"))?;
        if updated < Decimal::ZERO {
            return Err(StoreError::Constraint("balance must be >= 0".to_string()));
        }

        self.balances.insert(account_id, updated);
        Ok(updated)
    }

    async fn stamp_resulting_balance(
        &mut self,
        transaction_id: Uuid,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        self.checkpoint(FailPoint::StampBalance).await?;

        let row = self
            .inserted
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| {
                StoreError::Constraint(format!("transaction {transaction_id} not in this scope"))
            })?;
        row.resulting_balance = Some(balance);

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryScope {
            mut guard,
            balances,
            inserted,
        } = *self;

        guard.trip(FailPoint::Commit)?;
        if let Some(reached) = guard.stall_at(FailPoint::Commit) {
            let _ = reached.send(());
            std::future::pending::<()>().await;
        }

        for (account_id, balance) in balances {
            if let Some(account) = guard.accounts.get_mut(&account_id) {
                account.balance = balance;
            }
        }
        guard.transactions.extend(inserted);

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // staged writes are dropped with the scope
        Ok(())
    }
}
