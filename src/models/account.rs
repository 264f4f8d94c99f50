//! Account data models and parameter types.
//!
//! This module defines:
//! - `Account`: Database entity representing an account
//! - `CreateAccountParams`: Input for opening an account
//! - `AddAccountBalanceParams`: Signed balance increment
//! - `ListAccountsParams`: Pagination for account listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table.
///
/// # Balance Storage
///
/// Balances are stored as `i64` in the smallest currency unit to avoid
/// floating-point precision issues. For example, $10.50 is stored as 1050.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: i64,

    /// Name of the account holder
    pub owner: String,

    /// Current balance in the smallest currency unit
    ///
    /// Only ever changed through [`AddAccountBalanceParams`] deltas.
    pub balance: i64,

    /// Currency code (ISO 4217, 3 letters)
    ///
    /// Examples: "USD", "EUR", "CAD"
    pub currency: String,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "owner": "alice",
///   "balance": 10000,
///   "currency": "USD"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountParams {
    /// Name of the account holder
    pub owner: String,

    /// Opening balance (defaults to 0 if not provided)
    #[serde(default)]
    pub balance: i64,

    /// Currency code (defaults to "USD" if not provided)
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Default currency value when not specified.
fn default_currency() -> String {
    "USD".to_string()
}

/// Signed increment applied to one account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddAccountBalanceParams {
    pub id: i64,
    /// Negative to debit, positive to credit
    pub amount: i64,
}

/// Page of accounts ordered by id.
#[derive(Debug, Clone, Copy)]
pub struct ListAccountsParams {
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListAccountsParams {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}
