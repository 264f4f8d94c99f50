//! Transfer service - Core business logic for moving money between accounts.
//!
//! This service handles:
//! - Request validation
//! - Writing the transfer record and both ledger entries
//! - Deadlock-free balance updates
//! - Database transaction management
//!
//! # Atomicity Guarantees
//!
//! All five writes of a transfer happen within one database transaction.
//! The database ensures all-or-nothing execution.

use tracing::{debug, info};

use crate::context::TxContext;
use crate::error::AppError;
use crate::models::{
    AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, TransferParams,
    TransferResult,
};
use crate::services::{balance, tx_runner::exec_tx};
use crate::store::{Queries, Store};

/// Execute a transfer transaction (move money between accounts).
///
/// # Process
///
/// 1. Validate the request (no store access on failure)
/// 2. Start database transaction
/// 3. Record the transfer
/// 4. Record the source entry (`-amount`) and destination entry (`+amount`)
/// 5. Update both balances, smaller account id first
/// 6. Commit (or rollback on error)
///
/// The records are written before the balances move so every balance change
/// has its ledger trail in the same transaction.
///
/// # Errors
///
/// - `InvalidRequest`: Amount is not positive, or source equals destination
/// - `Transaction`: The unit of work failed; see [`crate::error::TxError`]
///
/// Lock-wait and serialization failures are returned as-is; it is up to the
/// caller to run the whole transfer again.
pub async fn execute_transfer<S>(
    store: &S,
    ctx: &TxContext,
    params: TransferParams,
) -> Result<TransferResult, AppError>
where
    S: Store,
{
    params.validate()?;

    info!(
        tx_name = %ctx.tx_name(),
        from_account_id = params.from_account_id,
        to_account_id = params.to_account_id,
        amount = params.amount,
        "executing transfer"
    );

    let step_ctx = ctx.clone();
    let result = exec_tx(store, ctx, move |q| {
        Box::pin(async move { transfer_steps(&step_ctx, q, params).await })
    })
    .await?;

    info!(
        tx_name = %ctx.tx_name(),
        transfer_id = result.transfer.id,
        "transfer committed"
    );
    Ok(result)
}

async fn transfer_steps<Q>(
    ctx: &TxContext,
    q: &mut Q,
    params: TransferParams,
) -> Result<TransferResult, AppError>
where
    Q: Queries + ?Sized,
{
    debug!(tx_name = %ctx.tx_name(), "create transfer");
    let transfer = ctx
        .run(q.create_transfer(CreateTransferParams {
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
        }))
        .await?;

    debug!(tx_name = %ctx.tx_name(), "create entry 1");
    let from_entry = ctx
        .run(q.create_entry(CreateEntryParams {
            account_id: params.from_account_id,
            amount: -params.amount,
        }))
        .await?;

    debug!(tx_name = %ctx.tx_name(), "create entry 2");
    let to_entry = ctx
        .run(q.create_entry(CreateEntryParams {
            account_id: params.to_account_id,
            amount: params.amount,
        }))
        .await?;

    let (from_account, to_account) = balance::update_pair(
        ctx,
        q,
        AddAccountBalanceParams {
            id: params.from_account_id,
            amount: -params.amount,
        },
        AddAccountBalanceParams {
            id: params.to_account_id,
            amount: params.amount,
        },
    )
    .await?;

    Ok(TransferResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}
