//! Per-call execution context.
//!
//! A [`TxContext`] travels with every transfer. It names the call for log
//! output and carries the caller's deadline, which bounds every store call
//! made on the caller's behalf.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct TxContext {
    tx_name: String,
    deadline: Option<Instant>,
}

impl TxContext {
    /// Context with an explicit name and no deadline.
    pub fn new(tx_name: impl Into<String>) -> Self {
        Self {
            tx_name: tx_name.into(),
            deadline: None,
        }
    }

    /// Expire `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn tx_name(&self) -> &str {
        &self.tx_name
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Await a store call, failing with [`AppError::Timeout`] once the
    /// deadline has passed. The call's future is dropped on expiry.
    ///
    /// Dropping the future does not stop a query already sent to the server.
    /// The store enforces the same deadline server-side (see
    /// [`Store::begin`](crate::store::Store::begin)), and its cancellation
    /// errors are classified by [`AppError::from_store`].
    pub async fn run<T, F>(&self, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call)
                .await
                .map_err(|_| AppError::Timeout)?
                .map_err(AppError::from_store),
            None => call.await.map_err(AppError::from_store),
        }
    }
}

impl Default for TxContext {
    fn default() -> Self {
        Self::new(format!("tx-{}", Uuid::new_v4()))
    }
}
