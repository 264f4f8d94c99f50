//! PostgreSQL store backed by a sqlx connection pool.
//!
//! The transfer operations are implemented directly on [`PgConnection`], so
//! the same code runs against a pooled connection or against the connection
//! owned by an open [`sqlx::Transaction`].

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, Transaction};
use tokio::time::Instant;

use crate::db::DbPool;
use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, Transfer,
};
use crate::store::{Queries, Store, StoreTx};

#[async_trait]
impl Queries for PgConnection {
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, sqlx::Error> {
        sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(arg.from_account_id)
        .bind(arg.to_account_id)
        .bind(arg.amount)
        .fetch_one(&mut *self)
        .await
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, sqlx::Error> {
        sqlx::query_as::<_, Entry>(
            "INSERT INTO entries (account_id, amount) VALUES ($1, $2) RETURNING *",
        )
        .bind(arg.account_id)
        .bind(arg.amount)
        .fetch_one(&mut *self)
        .await
    }

    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, sqlx::Error> {
        // The UPDATE takes the row lock and holds it until commit/rollback
        sqlx::query_as::<_, Account>(
            "UPDATE accounts SET balance = balance + $1 WHERE id = $2 RETURNING *",
        )
        .bind(arg.amount)
        .bind(arg.id)
        .fetch_one(&mut *self)
        .await
    }
}

/// Store handle shared by every caller. Cloning is cheap (the pool is an `Arc`).
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

/// An open PostgreSQL transaction.
///
/// sqlx rolls the transaction back if this is dropped without committing.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self, deadline: Option<Instant>) -> Result<PgTx, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if let Some(deadline) = deadline {
            // set_config(.., true) is SET LOCAL: both settings end with the
            // transaction, so the pooled connection goes back unchanged
            let budget = format!("{}ms", remaining_millis(deadline));
            sqlx::query(
                r#"
                SELECT set_config('lock_timeout', $1, true),
                       set_config('statement_timeout', $1, true)
                "#,
            )
            .bind(&budget)
            .execute(&mut *tx)
            .await?;
        }

        Ok(PgTx { tx })
    }
}

/// Milliseconds left until `deadline`, at least 1 (0 disables the timeouts).
fn remaining_millis(deadline: Instant) -> u128 {
    deadline
        .saturating_duration_since(Instant::now())
        .as_millis()
        .max(1)
}

#[async_trait]
impl StoreTx for PgTx {
    type Queries = PgConnection;

    fn queries(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Open a new account with its opening balance.
    pub async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (owner, balance, currency)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&arg.owner)
        .bind(arg.balance)
        .bind(&arg.currency)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_account(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_accounts(&self, arg: ListAccountsParams) -> Result<Vec<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY id LIMIT $1 OFFSET $2")
            .bind(arg.limit)
            .bind(arg.offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_transfer(&self, id: i64) -> Result<Option<Transfer>, sqlx::Error> {
        sqlx::query_as::<_, Transfer>("SELECT * FROM transfers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Transfers moving money from `from_account_id` to `to_account_id`, oldest first.
    pub async fn list_transfers(
        &self,
        from_account_id: i64,
        to_account_id: i64,
    ) -> Result<Vec<Transfer>, sqlx::Error> {
        sqlx::query_as::<_, Transfer>(
            r#"
            SELECT * FROM transfers
            WHERE from_account_id = $1 AND to_account_id = $2
            ORDER BY id
            "#,
        )
        .bind(from_account_id)
        .bind(to_account_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Ledger entries of one account, oldest first.
    pub async fn list_entries(&self, account_id: i64) -> Result<Vec<Entry>, sqlx::Error> {
        sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE account_id = $1 ORDER BY id")
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
    }
}
