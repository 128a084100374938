//! Ledger store: durable persistence for accounts and transactions.
//!
//! The store is the only component that mutates balances. Mutations happen
//! inside a [`LedgerScope`], an atomic unit of work obtained from
//! [`LedgerStore::begin`]. A scope either commits every write it made or none:
//! an explicit [`LedgerScope::rollback`], an error, or simply dropping the
//! scope (for example when the request future is cancelled) discards all of
//! its writes.
//!
//! Two implementations exist:
//! - [`PgLedger`]: PostgreSQL, row-level `FOR UPDATE` locks with a bounded `lock_timeout`
//! - [`MemoryLedger`]: in-process tables behind an async mutex, used by tests

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{
        account::{Account, NewAccount},
        transaction::{NewTransaction, Transaction},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryLedger};
pub use postgres::PgLedger;

/// Fractional digits kept by the `NUMERIC(20, 4)` money columns.
pub const MONEY_SCALE: u32 = 4;

/// Exclusive bound on the magnitude a money column can hold (10^16).
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(1_874_919_424, 2_328_306, 0, false, 0);

/// True if `value` is stored exactly, without rounding or overflow, by a money column.
pub fn fits_money_column(value: Decimal) -> bool {
    value.abs() < MONEY_LIMIT && value.normalize().scale() <= MONEY_SCALE
}

/// Persistence capability for accounts and transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Committed state of one account.
    async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Insert a new account and return it with its assigned id.
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Committed history of one account, oldest first.
    async fn list_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>, StoreError>;

    /// Open an atomic scope.
    async fn begin(&self) -> Result<Box<dyn LedgerScope>, StoreError>;
}

/// An open atomic unit of work against the ledger.
///
/// Dropping a scope without calling [`commit`](LedgerScope::commit) rolls it back.
#[async_trait]
pub trait LedgerScope: Send {
    /// Read the balance of `account_id` and hold its lock until the scope ends.
    ///
    /// Returns `None` when the account does not exist.
    async fn lock_balance(&mut self, account_id: Uuid) -> Result<Option<Decimal>, StoreError>;

    /// Insert a transaction row and return its assigned id.
    async fn insert_transaction(&mut self, transaction: NewTransaction)
    -> Result<Uuid, StoreError>;

    /// Add `delta` to the balance and return the balance as read back afterwards.
    async fn adjust_balance(
        &mut self,
        account_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, StoreError>;

    /// Record the balance observed right after `transaction_id` was applied.
    async fn stamp_resulting_balance(
        &mut self,
        transaction_id: Uuid,
        balance: Decimal,
    ) -> Result<(), StoreError>;

    /// Make every write in this scope durable.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write in this scope.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn money_limit_is_ten_to_the_sixteenth() {
        assert_eq!(MONEY_LIMIT, dec!(10000000000000000));
    }

    #[test]
    fn money_column_bounds() {
        assert!(fits_money_column(dec!(9999999999999999.9999)));
        assert!(fits_money_column(dec!(0.0001)));
        // trailing zeros do not count towards the scale
        assert!(fits_money_column(dec!(10.500000)));

        assert!(!fits_money_column(dec!(10000000000000000)));
        assert!(!fits_money_column(dec!(0.00001)));
        assert!(!fits_money_column(Decimal::MAX));
    }
}
