//! Transfer handlers.
//!
//! - `transfer` - Move money between accounts
//! - `get-transfer` - Show one transfer
//! - `transfers` - List transfers from one account to another

use crate::{
    context::TxContext,
    error::AppError,
    models::{Transfer, TransferParams, TransferResult},
    services::transfer_service,
    store::postgres::PgStore,
};

/// Transfer money between accounts.
///
/// # Atomicity
///
/// The transfer record, both entries and both balances are written in a
/// single database transaction. Either all succeed or all fail.
///
/// # Validation
///
/// Amount and account checks happen in [`transfer_service::execute_transfer`].
/// An unknown account is caught by the foreign keys on `transfers` and
/// `entries` inside the transaction and reported as `account_not_found`.
pub async fn create_transfer(
    store: &PgStore,
    ctx: &TxContext,
    params: TransferParams,
) -> Result<TransferResult, AppError> {
    transfer_service::execute_transfer(store, ctx, params).await
}

/// Transfers moving money from `from_account_id` to `to_account_id`.
pub async fn list_transfers(
    store: &PgStore,
    from_account_id: i64,
    to_account_id: i64,
) -> Result<Vec<Transfer>, AppError> {
    Ok(store.list_transfers(from_account_id, to_account_id).await?)
}

/// Get a single transfer by id.
pub async fn get_transfer(store: &PgStore, id: i64) -> Result<Transfer, AppError> {
    store
        .get_transfer(id)
        .await?
        .ok_or(AppError::TransferNotFound)
}
