//! PostgreSQL ledger store.
//!
//! # Atomicity Guarantees
//!
//! Every [`PgScope`] wraps one PostgreSQL transaction. The account row is
//! locked with `SELECT ... FOR UPDATE` before its balance is checked, so two
//! concurrent withdrawals on the same account are serialized by the database
//! instead of both reading a stale balance.
//!
//! Lock waits are bounded per scope with `lock_timeout`; an expired wait
//! surfaces as [`StoreError::Busy`].

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Postgres;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::StoreError,
    models::{
        account::{Account, NewAccount},
        transaction::{NewTransaction, Transaction},
    },
    store::{LedgerScope, LedgerStore},
};

const ACCOUNT_COLUMNS: &str =
    "account_id, owner_id, opening_date, account_type, balance, status";

const TRANSACTION_COLUMNS: &str =
    "transaction_id, account_id, transaction_type, amount, transaction_date, resulting_balance";

/// `lock_timeout` value for `set_config`, at least one millisecond.
fn lock_timeout_setting(timeout: Duration) -> String {
    format!("{}ms", timeout.as_millis().max(1))
}

/// Ledger store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: DbPool,
    lock_timeout: Duration,
}

impl PgLedger {
    pub fn new(pool: DbPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (owner_id, opening_date, account_type, balance, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.owner_id)
        .bind(account.opening_date)
        .bind(account.account_type.as_str())
        .bind(account.balance)
        .bind(account.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, StoreError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn list_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>, StoreError> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE account_id = $1
            ORDER BY transaction_date ASC, transaction_id ASC
            "#
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerScope>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // `true` scopes the setting to this transaction only; 0ms would disable it
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(lock_timeout_setting(self.lock_timeout))
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgScope { tx }))
    }
}

/// One open PostgreSQL transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct PgScope {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerScope for PgScope {
    async fn lock_balance(&mut self, account_id: Uuid) -> Result<Option<Decimal>, StoreError> {
        // FOR UPDATE holds the row lock until commit or rollback
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE account_id = $1 FOR UPDATE")
                .bind(account_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(balance)
    }

    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Uuid, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (account_id, transaction_type, amount, transaction_date)
            VALUES ($1, $2, $3, $4)
            RETURNING transaction_id
            "#,
        )
        .bind(transaction.account_id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.amount)
        .bind(transaction.transaction_date)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn adjust_balance(
        &mut self,
        account_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, StoreError> {
        let balance: Decimal = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance = balance + $1
            WHERE account_id = $2
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(account_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(balance)
    }

    async fn stamp_resulting_balance(
        &mut self,
        transaction_id: Uuid,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE transactions SET resulting_balance = $1 WHERE transaction_id = $2",
        )
        .bind(balance)
        .bind(transaction_id)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
