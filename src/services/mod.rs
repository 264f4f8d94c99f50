//! Business logic services.
//!
//! Services contain core business logic separated from the command handlers.
//! They handle database transactions, validation, and lock ordering.

pub mod balance;
pub mod transfer_service;
pub mod tx_runner;
