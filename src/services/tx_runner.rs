//! Unit-of-work runner.
//!
//! [`exec_tx`] opens a transaction, hands the unit of work a [`Queries`](crate::store::Queries)
//! bound to that transaction, and commits or rolls back depending on the
//! outcome. No retries, no nesting.

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::context::TxContext;
use crate::error::{AppError, TxError};
use crate::store::{Store, StoreTx};

/// Queries handed to a unit of work running on store `S`.
pub type TxQueries<S> = <<S as Store>::Tx as StoreTx>::Queries;

/// Run `work` as one database transaction.
///
/// # Process
///
/// 1. Begin, handing the context deadline to the store so it is also
///    enforced server-side
/// 2. Invoke `work` exactly once with the transaction-scoped queries
/// 3. Commit on success, roll back on failure
///
/// # Errors
///
/// - `BeginFailed`: the transaction never started and `work` was not called
/// - `StepFailed`: `work` failed and was rolled back
/// - `RollbackFailed`: `work` failed and the rollback failed too; both causes are kept
/// - `CommitFailed`: `work` succeeded but commit did not; the outcome is up to the store
pub async fn exec_tx<S, T, F>(store: &S, ctx: &TxContext, work: F) -> Result<T, TxError>
where
    S: Store,
    T: Send,
    F: for<'q> FnOnce(&'q mut TxQueries<S>) -> BoxFuture<'q, Result<T, AppError>> + Send,
{
    let mut tx = ctx
        .run(store.begin(ctx.deadline()))
        .await
        .map_err(|e| TxError::BeginFailed(Box::new(e)))?;
    debug!(tx_name = %ctx.tx_name(), "transaction started");

    let outcome = work(tx.queries()).await;

    match outcome {
        Ok(value) => {
            // Commit is not bounded by the deadline: once issued it must be
            // allowed to finish.
            tx.commit().await.map_err(|e| {
                warn!(tx_name = %ctx.tx_name(), error = %e, "commit failed");
                TxError::CommitFailed(e)
            })?;
            debug!(tx_name = %ctx.tx_name(), "transaction committed");
            Ok(value)
        }
        Err(step) => {
            debug!(tx_name = %ctx.tx_name(), error = %step, "rolling back");
            match tx.rollback().await {
                Ok(()) => Err(TxError::StepFailed(Box::new(step))),
                Err(rollback) => {
                    warn!(
                        tx_name = %ctx.tx_name(),
                        error = %step,
                        rollback_error = %rollback,
                        "rollback failed"
                    );
                    Err(TxError::RollbackFailed {
                        step: Box::new(step),
                        rollback,
                    })
                }
            }
        }
    }
}
