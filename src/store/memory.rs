//! In-memory store for tests.
//!
//! Models what the transfer services rely on from PostgreSQL:
//! - `add_account_balance` takes a per-account row lock that is held until
//!   the transaction commits or rolls back
//! - writes are staged in the transaction and only become visible on commit
//! - ids come from a sequence, so rolled-back inserts leave gaps
//! - a row lock wait gives up at the transaction's deadline with SQLSTATE
//!   `55P03`, and rows referencing a missing account fail with `23503`
//!
//! Each operation can be made to fail through [`Faults`].

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::error::{DatabaseError, ErrorKind};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tokio::time::Instant;

use crate::models::{
    Account, AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, Entry, Transfer,
};
use crate::store::{Queries, Store, StoreTx};

/// Operations that should fail with an injected error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub begin: bool,
    pub create_transfer: bool,
    pub create_entry: bool,
    pub add_account_balance: bool,
    pub rollback: bool,
    pub commit: bool,
}

fn injected(op: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected {op} failure"))
}

/// Error reported "by the server", carrying a SQLSTATE.
#[derive(Debug)]
struct ServerError {
    code: &'static str,
    message: String,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ServerError {}

impl DatabaseError for ServerError {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.code))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.code {
            "23503" => ErrorKind::ForeignKeyViolation,
            _ => ErrorKind::Other,
        }
    }
}

/// A database error with the given SQLSTATE.
pub fn server_error(code: &'static str, message: impl Into<String>) -> sqlx::Error {
    sqlx::Error::Database(Box::new(ServerError {
        code,
        message: message.into(),
    }))
}

#[derive(Default)]
struct Ledger {
    accounts: BTreeMap<i64, Account>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
}

#[derive(Default)]
struct Inner {
    ledger: Mutex<Ledger>,
    row_locks: Mutex<HashMap<i64, Arc<RowLock<()>>>>,
    faults: Mutex<Faults>,
    next_id: AtomicI64,
    open: AtomicUsize,
    lock_history: Mutex<Vec<Vec<i64>>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("memory store mutex poisoned")
}

impl MemoryStore {
    /// Store seeded with `(id, balance)` accounts in USD.
    pub fn with_accounts(balances: &[(i64, i64)]) -> Self {
        let store = Self::default();
        {
            let mut ledger = lock(&store.inner.ledger);
            let mut row_locks = lock(&store.inner.row_locks);
            for &(id, balance) in balances {
                ledger.accounts.insert(
                    id,
                    Account {
                        id,
                        owner: format!("owner-{id}"),
                        balance,
                        currency: "USD".to_string(),
                        created_at: Utc::now(),
                    },
                );
                row_locks.insert(id, Arc::new(RowLock::new(())));
            }
        }
        store
    }

    pub fn set_faults(&self, faults: Faults) {
        *lock(&self.inner.faults) = faults;
    }

    pub fn account(&self, id: i64) -> Option<Account> {
        lock(&self.inner.ledger).accounts.get(&id).cloned()
    }

    pub fn balance(&self, id: i64) -> Option<i64> {
        self.account(id).map(|account| account.balance)
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        lock(&self.inner.ledger).transfers.clone()
    }

    pub fn entries(&self) -> Vec<Entry> {
        lock(&self.inner.ledger).entries.clone()
    }

    /// Order in which each finished transaction acquired its row locks.
    pub fn lock_history(&self) -> Vec<Vec<i64>> {
        lock(&self.inner.lock_history).clone()
    }

    /// Transactions begun but not yet committed, rolled back or dropped.
    pub fn open_transactions(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    fn faults(&self) -> Faults {
        *lock(&self.inner.faults)
    }

    fn next_id(&self) -> i64 {
        self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn account_exists(&self, id: i64) -> bool {
        lock(&self.inner.ledger).accounts.contains_key(&id)
    }

    fn row_lock(&self, id: i64) -> Option<Arc<RowLock<()>>> {
        lock(&self.inner.row_locks).get(&id).cloned()
    }
}

pub struct MemoryTx {
    store: MemoryStore,
    deadline: Option<Instant>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
    /// Rows this transaction holds the lock on, with their pending balances
    accounts: BTreeMap<i64, Account>,
    guards: Vec<OwnedMutexGuard<()>>,
    lock_order: Vec<i64>,
}

impl MemoryTx {
    fn foreign_key(&self, account_id: i64) -> Result<(), sqlx::Error> {
        if self.store.account_exists(account_id) {
            Ok(())
        } else {
            Err(server_error(
                "23503",
                format!("foreign key violation: account {account_id} does not exist"),
            ))
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.lock_order.is_empty() {
            lock(&self.store.inner.lock_history).push(std::mem::take(&mut self.lock_order));
        }
        self.store.inner.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Queries for MemoryTx {
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, sqlx::Error> {
        if self.store.faults().create_transfer {
            return Err(injected("create_transfer"));
        }
        self.foreign_key(arg.from_account_id)?;
        self.foreign_key(arg.to_account_id)?;

        let transfer = Transfer {
            id: self.store.next_id(),
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, sqlx::Error> {
        if self.store.faults().create_entry {
            return Err(injected("create_entry"));
        }
        self.foreign_key(arg.account_id)?;

        let entry = Entry {
            id: self.store.next_id(),
            account_id: arg.account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, sqlx::Error> {
        if self.store.faults().add_account_balance {
            return Err(injected("add_account_balance"));
        }

        if !self.accounts.contains_key(&arg.id) {
            let row_lock = self.store.row_lock(arg.id).ok_or(sqlx::Error::RowNotFound)?;
            let guard = match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, row_lock.lock_owned())
                    .await
                    .map_err(|_| {
                        server_error("55P03", "canceling statement due to lock timeout")
                    })?,
                None => row_lock.lock_owned().await,
            };
            // Give a concurrent transaction the chance to grab its first row
            // before this one reaches for its second.
            tokio::task::yield_now().await;

            let row = self.store.account(arg.id).ok_or(sqlx::Error::RowNotFound)?;
            self.guards.push(guard);
            self.lock_order.push(arg.id);
            self.accounts.insert(arg.id, row);
        }

        let account = self
            .accounts
            .get_mut(&arg.id)
            .ok_or(sqlx::Error::RowNotFound)?;
        account.balance += arg.amount;
        Ok(account.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self, deadline: Option<Instant>) -> Result<MemoryTx, sqlx::Error> {
        if self.faults().begin {
            return Err(injected("begin"));
        }
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTx {
            store: self.clone(),
            deadline,
            transfers: Vec::new(),
            entries: Vec::new(),
            accounts: BTreeMap::new(),
            guards: Vec::new(),
            lock_order: Vec::new(),
        })
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    type Queries = MemoryTx;

    fn queries(&mut self) -> &mut MemoryTx {
        self
    }

    async fn commit(mut self) -> Result<(), sqlx::Error> {
        if self.store.faults().commit {
            return Err(injected("commit"));
        }

        // Publish while the row locks are still held; they are released when
        // `self` drops.
        let mut ledger = lock(&self.store.inner.ledger);
        ledger.accounts.extend(std::mem::take(&mut self.accounts));
        ledger.transfers.append(&mut self.transfers);
        ledger.entries.append(&mut self.entries);
        drop(ledger);
        Ok(())
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        if self.store.faults().rollback {
            return Err(injected("rollback"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store = MemoryStore::with_accounts(&[(1, 100)]);
        let mut tx = store.begin(None).await.unwrap();

        let account = tx
            .queries()
            .add_account_balance(AddAccountBalanceParams { id: 1, amount: 25 })
            .await
            .unwrap();
        assert_eq!(account.balance, 125);
        assert_eq!(store.balance(1), Some(100));
        assert_eq!(store.open_transactions(), 1);

        tx.commit().await.unwrap();
        assert_eq!(store.balance(1), Some(125));
        assert_eq!(store.open_transactions(), 0);
        assert_eq!(store.lock_history(), vec![vec![1]]);
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::with_accounts(&[(1, 100), (2, 0)]);
        {
            let mut tx = store.begin(None).await.unwrap();
            tx.queries()
                .create_entry(CreateEntryParams {
                    account_id: 2,
                    amount: 5,
                })
                .await
                .unwrap();
        }
        assert!(store.entries().is_empty());
        assert_eq!(store.open_transactions(), 0);
    }

    #[tokio::test]
    async fn lock_wait_gives_up_at_the_deadline() {
        let store = MemoryStore::with_accounts(&[(1, 100)]);
        let mut holder = store.begin(None).await.unwrap();
        holder
            .queries()
            .add_account_balance(AddAccountBalanceParams { id: 1, amount: 0 })
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_millis(50);
        let mut waiter = store.begin(Some(deadline)).await.unwrap();
        let err = waiter
            .queries()
            .add_account_balance(AddAccountBalanceParams { id: 1, amount: 5 })
            .await
            .unwrap_err();

        let sqlstate = err.as_database_error().and_then(|db| db.code());
        assert_eq!(sqlstate.as_deref(), Some("55P03"));
        assert!(Instant::now() < deadline + Duration::from_millis(500));

        waiter.rollback().await.unwrap();
        holder.rollback().await.unwrap();
        assert_eq!(store.balance(1), Some(100));
        assert_eq!(store.open_transactions(), 0);
    }

    #[tokio::test]
    async fn missing_account_is_a_foreign_key_violation() {
        let store = MemoryStore::with_accounts(&[(1, 100)]);
        let mut tx = store.begin(None).await.unwrap();

        let err = tx
            .queries()
            .create_entry(CreateEntryParams {
                account_id: 42,
                amount: 5,
            })
            .await
            .unwrap_err();

        let db = err.as_database_error().expect("database error");
        assert!(db.is_foreign_key_violation());
        assert_eq!(db.code().as_deref(), Some("23503"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn opposite_lock_order_deadlocks() {
        let store = MemoryStore::with_accounts(&[(1, 100), (2, 100)]);
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let run = |first: i64, second: i64| {
            let store = store.clone();
            let barrier = barrier.clone();
            async move {
                let mut tx = store.begin(None).await?;
                tx.queries()
                    .add_account_balance(AddAccountBalanceParams { id: first, amount: -1 })
                    .await?;
                barrier.wait().await;
                tx.queries()
                    .add_account_balance(AddAccountBalanceParams { id: second, amount: 1 })
                    .await?;
                tx.commit().await
            }
        };

        let both = futures::future::try_join(run(1, 2), run(2, 1));
        let outcome = tokio::time::timeout(Duration::from_millis(200), both).await;
        assert!(outcome.is_err(), "circular wait should never resolve");
    }
}
