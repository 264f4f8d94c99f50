//! Storage seams used by the transfer services.
//!
//! - [`Queries`]: the single-row operations a transfer needs
//! - [`Store`]: something that can open a transaction
//! - [`StoreTx`]: an open transaction, which hands out a [`Queries`] bound to it
//!
//! [`postgres`] implements all three on top of sqlx. The test-only `memory`
//! store implements them with per-account row locks and fault injection.

use async_trait::async_trait;
use tokio::time::Instant;

use crate::models::{
    Account, AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, Entry, Transfer,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Single-row operations executed against whatever connection or
/// transaction the implementor is bound to.
#[async_trait]
pub trait Queries: Send {
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, sqlx::Error>;

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, sqlx::Error>;

    /// Atomically add `arg.amount` to the balance and return the updated row.
    ///
    /// Takes the row lock on the account until the surrounding transaction ends.
    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, sqlx::Error>;
}

/// A transactional store.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: StoreTx;

    /// Open a transaction.
    ///
    /// With a `deadline`, lock waits and statements inside the transaction
    /// must fail on the store's side once it passes, with SQLSTATE `55P03`
    /// or `57014`. Client-side timeouts alone leave the server waiting.
    async fn begin(&self, deadline: Option<Instant>) -> Result<Self::Tx, sqlx::Error>;
}

/// An open transaction.
///
/// Dropping it without calling [`commit`](StoreTx::commit) rolls it back.
#[async_trait]
pub trait StoreTx: Send + Sized {
    type Queries: Queries;

    /// Collaborator scoped to this transaction.
    fn queries(&mut self) -> &mut Self::Queries;

    async fn commit(self) -> Result<(), sqlx::Error>;

    async fn rollback(self) -> Result<(), sqlx::Error>;
}
