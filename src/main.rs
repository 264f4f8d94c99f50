//! simple_bank - Command line entry point
//!
//! Opens accounts and moves money between them against a PostgreSQL
//! database. Every command prints its result as JSON on stdout; failures
//! print a JSON error body on stderr and exit non-zero.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Dispatch the requested command

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use simple_bank::{
    PgStore, TxContext,
    config::Config,
    db,
    error::AppError,
    handlers,
    models::{CreateAccountParams, ListAccountsParams, TransferParams},
};

#[derive(Debug, Parser)]
#[command(name = "simple_bank", version, about = "Atomic money transfers over PostgreSQL")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check database connectivity and pool usage
    Health,

    /// Manage accounts
    #[command(subcommand)]
    Account(AccountCommand),

    /// Move money from one account to another
    Transfer {
        #[arg(long)]
        from: i64,

        #[arg(long)]
        to: i64,

        #[arg(long, allow_hyphen_values = true)]
        amount: i64,

        /// Name used to tag this transfer's log lines
        #[arg(long)]
        name: Option<String>,

        /// Overrides TRANSFER_TIMEOUT_MS
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Show a single transfer
    GetTransfer { id: i64 },

    /// List transfers from one account to another
    Transfers {
        #[arg(long)]
        from: i64,

        #[arg(long)]
        to: i64,
    },

    /// List the ledger entries of an account
    Entries { account_id: i64 },
}

#[derive(Debug, Subcommand)]
enum AccountCommand {
    /// Open a new account
    Create {
        #[arg(long)]
        owner: String,

        #[arg(long, default_value = "USD")]
        currency: String,

        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        balance: i64,
    },

    /// Show one account
    Get { id: i64 },

    /// List accounts ordered by id
    List {
        #[arg(long, default_value_t = 10)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    // Logs go to stderr so stdout stays pure JSON.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let store = PgStore::new(pool);

    let outcome = match cli.command {
        Command::Health => render(handlers::health::health_check(&store).await),
        Command::Account(AccountCommand::Create {
            owner,
            currency,
            balance,
        }) => render(
            handlers::accounts::create_account(
                &store,
                CreateAccountParams {
                    owner,
                    balance,
                    currency,
                },
            )
            .await,
        ),
        Command::Account(AccountCommand::Get { id }) => {
            render(handlers::accounts::get_account(&store, id).await)
        }
        Command::Account(AccountCommand::List { limit, offset }) => render(
            handlers::accounts::list_accounts(&store, ListAccountsParams { limit, offset }).await,
        ),
        Command::Transfer {
            from,
            to,
            amount,
            name,
            timeout_ms,
        } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.transfer_timeout());
            let ctx = name
                .map(TxContext::new)
                .unwrap_or_default()
                .with_timeout(timeout);

            render(
                handlers::transfers::create_transfer(
                    &store,
                    &ctx,
                    TransferParams::new(from, to, amount),
                )
                .await,
            )
        }
        Command::GetTransfer { id } => {
            render(handlers::transfers::get_transfer(&store, id).await)
        }
        Command::Transfers { from, to } => {
            render(handlers::transfers::list_transfers(&store, from, to).await)
        }
        Command::Entries { account_id } => {
            render(handlers::entries::list_entries(&store, account_id).await)
        }
    }?;

    Ok(outcome)
}

/// Print a handler result: the value on stdout, or the error body on stderr.
fn render<T: Serialize>(result: Result<T, AppError>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::warn!(code = err.code(), error = %err, "command failed");
            eprintln!("{}", serde_json::to_string_pretty(&err.to_json())?);
            Ok(ExitCode::FAILURE)
        }
    }
}
