//! Command handlers.
//!
//! Each handler is an async function that:
//! 1. Receives already-parsed command arguments
//! 2. Performs business logic (database queries, validation)
//! 3. Returns a serializable value for the command line to print

/// Account management commands
pub mod accounts;
/// Ledger entry queries
pub mod entries;
/// Database connectivity check
pub mod health;
/// Transfer commands
pub mod transfers;
