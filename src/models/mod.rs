//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the parameter types the store operations take.

/// Account model
pub mod account;
/// Ledger entry model
pub mod entry;
/// Transfer model and the transfer request/result
pub mod transfer;

pub use account::{AddAccountBalanceParams, Account, CreateAccountParams, ListAccountsParams};
pub use entry::{CreateEntryParams, Entry};
pub use transfer::{CreateTransferParams, Transfer, TransferParams, TransferResult};
