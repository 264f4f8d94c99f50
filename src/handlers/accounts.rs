//! Account handlers.
//!
//! - `account create` - Open a new account
//! - `account get <id>` - Show one account
//! - `account list` - Page through accounts

use tracing::info;

use crate::{
    error::AppError,
    models::{Account, CreateAccountParams, ListAccountsParams},
    store::postgres::PgStore,
};

/// Open a new account.
///
/// # Validation
///
/// - `owner` must not be empty
/// - `currency` must be a 3 letter code
/// - `balance` must not be negative
pub async fn create_account(
    store: &PgStore,
    params: CreateAccountParams,
) -> Result<Account, AppError> {
    if params.owner.trim().is_empty() {
        return Err(AppError::InvalidRequest("Owner is required".to_string()));
    }

    if params.currency.len() != 3 || !params.currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(AppError::InvalidRequest(
            "Currency must be a 3 letter ISO 4217 code".to_string(),
        ));
    }

    if params.balance < 0 {
        return Err(AppError::InvalidRequest(
            "Opening balance cannot be negative".to_string(),
        ));
    }

    let account = store.create_account(params).await?;
    info!(account_id = account.id, owner = %account.owner, "account created");

    Ok(account)
}

/// Get account details by id.
///
/// # Errors
///
/// - `AccountNotFound`: no account has this id
pub async fn get_account(store: &PgStore, id: i64) -> Result<Account, AppError> {
    store
        .get_account(id)
        .await?
        .ok_or(AppError::AccountNotFound)
}

/// List accounts ordered by id.
pub async fn list_accounts(
    store: &PgStore,
    params: ListAccountsParams,
) -> Result<Vec<Account>, AppError> {
    if params.limit <= 0 || params.offset < 0 {
        return Err(AppError::InvalidRequest(
            "Limit must be positive and offset non-negative".to_string(),
        ));
    }

    Ok(store.list_accounts(params).await?)
}
