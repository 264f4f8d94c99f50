//! simple_bank - atomic money transfers over PostgreSQL.
//!
//! A transfer writes one transfer record and two ledger entries and moves
//! both account balances inside a single database transaction. Concurrent
//! transfers between the same accounts never deadlock because balance rows
//! are always locked in ascending account id order.
//!
//! # Layout
//!
//! - [`store`]: transaction/query seams and the sqlx implementation
//! - [`services::tx_runner`]: run a closure as one unit of work
//! - [`services::balance`]: two-account balance update with lock ordering
//! - [`services::transfer_service`]: the transfer itself
//! - [`handlers`]: command handlers used by the `simple_bank` binary

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

pub use context::TxContext;
pub use error::{AppError, TxError};
pub use services::transfer_service::execute_transfer;
pub use store::postgres::PgStore;
