//! Ledger entry handlers.

use crate::{error::AppError, models::Entry, store::postgres::PgStore};

/// All ledger entries of one account, oldest first.
///
/// # Errors
///
/// - `AccountNotFound`: no account has this id
pub async fn list_entries(store: &PgStore, account_id: i64) -> Result<Vec<Entry>, AppError> {
    if store.get_account(account_id).await?.is_none() {
        return Err(AppError::AccountNotFound);
    }

    Ok(store.list_entries(account_id).await?)
}
