//! Ledger entry models.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One signed balance change for one account.
///
/// Maps to the `entries` table. Entries are append-only; a transfer writes
/// exactly two of them and their amounts sum to zero.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,

    /// Negative for money leaving the account, positive for money arriving
    pub amount: i64,

    pub created_at: DateTime<Utc>,
}

/// Input for appending a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount: i64,
}
