//! Error types and their JSON error bodies.
//!
//! This module defines all application errors, the transaction-level error
//! taxonomy produced by the unit-of-work runner, and how errors are rendered
//! for the command line.

use serde_json::json;

/// SQLSTATE raised when a lock wait outlives `lock_timeout`.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE raised when a statement outlives `statement_timeout`.
const QUERY_CANCELED: &str = "57014";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a stable error code (see [`AppError::code`]).
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from a store operation
/// - **Deadline Errors**: A store call did not finish before the caller's deadline
/// - **Resource Errors**: Requested resources not found
/// - **Validation Errors**: Invalid request data
/// - **Transaction Errors**: Begin/step/rollback/commit failures of a unit of work
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The caller's deadline expired before a store call completed.
    #[error("Operation timed out")]
    Timeout,

    /// Requested account does not exist.
    #[error("Account not found")]
    AccountNotFound,

    /// Requested transfer does not exist.
    #[error("Transfer not found")]
    TransferNotFound,

    /// Request parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A unit of work could not be completed atomically.
    #[error(transparent)]
    Transaction(#[from] TxError),
}

/// Failure of a unit of work run by [`crate::services::tx_runner::exec_tx`].
///
/// Whatever the variant, the unit of work's result must be treated as
/// unusable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// The transaction could not start. Nothing was executed.
    #[error("failed to begin transaction: {0}")]
    BeginFailed(#[source] Box<AppError>),

    /// A step inside the unit of work failed and the transaction was rolled back.
    #[error("transaction step failed: {0}")]
    StepFailed(#[source] Box<AppError>),

    /// A step failed and the rollback that followed failed too.
    #[error("transaction step failed: {step}; rollback failed: {rollback}")]
    RollbackFailed {
        step: Box<AppError>,
        #[source]
        rollback: sqlx::Error,
    },

    /// Every step succeeded but the commit did not. The outcome is decided by
    /// the store and must not be assumed successful.
    #[error("failed to commit transaction: {0}")]
    CommitFailed(#[source] sqlx::Error),
}

impl TxError {
    /// The failure raised inside the unit of work, if any.
    pub fn step_error(&self) -> Option<&AppError> {
        match self {
            TxError::StepFailed(step) | TxError::RollbackFailed { step, .. } => Some(&**step),
            TxError::BeginFailed(_) | TxError::CommitFailed(_) => None,
        }
    }

    /// The failure raised while rolling back, if any.
    pub fn rollback_error(&self) -> Option<&sqlx::Error> {
        match self {
            TxError::RollbackFailed { rollback, .. } => Some(rollback),
            _ => None,
        }
    }
}

impl AppError {
    /// Classify a failure of a store call made inside a unit of work.
    ///
    /// - lock or statement timeout (`55P03`, `57014`) → `Timeout`: the server
    ///   gave up at the caller's deadline
    /// - foreign key violation (`23503`) → `AccountNotFound`: the ledger rows
    ///   only reference accounts
    /// - anything else → `Database`
    pub fn from_store(err: sqlx::Error) -> Self {
        let sqlstate = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());

        match sqlstate.as_deref() {
            Some(LOCK_NOT_AVAILABLE | QUERY_CANCELED) => AppError::Timeout,
            Some(FOREIGN_KEY_VIOLATION) => AppError::AccountNotFound,
            _ => AppError::Database(err),
        }
    }

    /// Stable machine-readable code for this error.
    ///
    /// A failed step is reported with the code of the error that caused it,
    /// so an invalid account inside a transfer still reads as
    /// `account_not_found`.
    ///
    /// - `AccountNotFound` → `account_not_found`
    /// - `TransferNotFound` → `transfer_not_found`
    /// - `InvalidRequest` → `invalid_request`
    /// - `Timeout` → `timeout`
    /// - `Database` → `internal_error`
    /// - `RollbackFailed` / `CommitFailed` / `BeginFailed` → `transaction_failed`
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AccountNotFound => "account_not_found",
            AppError::TransferNotFound => "transfer_not_found",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Timeout => "timeout",
            AppError::Database(_) => "internal_error",
            AppError::Transaction(TxError::StepFailed(step)) => step.code(),
            AppError::Transaction(_) => "transaction_failed",
        }
    }

    /// Render the error body printed by the command line.
    ///
    /// ```json
    /// {
    ///   "error": {
    ///     "code": "error_type",
    ///     "message": "Human-readable error message"
    ///   }
    /// }
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        })
    }
}
