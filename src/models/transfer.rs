//! Transfer data models and request/result types.
//!
//! This module defines:
//! - `Transfer`: Database entity recording money moved between two accounts
//! - `TransferParams`: Request for a transfer
//! - `TransferResult`: Everything a committed transfer produced

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{account::Account, entry::Entry};

/// Represents a transfer record from the database.
///
/// # Database Table
///
/// Maps to the `transfers` table. Each transfer:
/// - References a source and a destination account
/// - Stores a strictly positive amount (enforced by CHECK constraint)
/// - Is never updated after insertion
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Transfer {
    pub id: i64,

    /// Account the money leaves
    pub from_account_id: i64,

    /// Account the money arrives in
    pub to_account_id: i64,

    pub amount: i64,

    pub created_at: DateTime<Utc>,
}

/// Input for inserting a transfer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Request to transfer money between accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_account_id": 1,
///   "to_account_id": 2,
///   "amount": 100
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// The transfer record, both entries and both balance updates are written in
/// the same database transaction. Either all five land or none do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    /// Account to transfer from (will decrease)
    pub from_account_id: i64,

    /// Account to transfer to (will increase)
    pub to_account_id: i64,

    /// Amount to transfer, in the smallest currency unit
    pub amount: i64,
}

impl TransferParams {
    pub fn new(from_account_id: i64, to_account_id: i64, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }

    /// Reject requests that cannot describe a real transfer.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: Amount is zero or negative
    /// - `InvalidRequest`: Source and destination are the same account
    pub fn validate(&self) -> Result<(), AppError> {
        if self.amount <= 0 {
            return Err(AppError::InvalidRequest(
                "Amount must be positive".to_string(),
            ));
        }

        if self.from_account_id == self.to_account_id {
            return Err(AppError::InvalidRequest(
                "Cannot transfer to same account".to_string(),
            ));
        }

        Ok(())
    }
}

/// Result of a committed transfer.
///
/// # JSON Example
///
/// ```json
/// {
///   "transfer": { "id": 7, "from_account_id": 1, "to_account_id": 2, "amount": 100, "created_at": "..." },
///   "from_account": { "id": 1, "owner": "alice", "balance": 400, "currency": "USD", "created_at": "..." },
///   "to_account": { "id": 2, "owner": "bob", "balance": 400, "currency": "USD", "created_at": "..." },
///   "from_entry": { "id": 13, "account_id": 1, "amount": -100, "created_at": "..." },
///   "to_entry": { "id": 14, "account_id": 2, "amount": 100, "created_at": "..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub transfer: Transfer,

    /// Source account as it looks after the debit
    pub from_account: Account,

    /// Destination account as it looks after the credit
    pub to_account: Account,

    pub from_entry: Entry,
    pub to_entry: Entry,
}
