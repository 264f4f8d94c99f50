//! `health` command: database reachability and pool usage.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::AppError, store::postgres::PgStore};

/// What the `health` command prints.
///
/// ```json
/// {
///   "status": "ok",
///   "server_version": "16.4",
///   "pool_size": 1,
///   "idle_connections": 0,
///   "checked_at": "2026-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,

    /// PostgreSQL `server_version` setting
    pub server_version: String,

    /// Connections currently open in the pool, idle or not
    pub pool_size: u32,

    pub idle_connections: usize,

    pub checked_at: DateTime<Utc>,
}

/// Round-trip to the database and report on the pool.
///
/// An unreachable database returns the usual error body instead.
pub async fn health_check(store: &PgStore) -> Result<HealthReport, AppError> {
    let pool = store.pool();
    let server_version: String = sqlx::query_scalar("SHOW server_version")
        .fetch_one(pool)
        .await?;

    Ok(HealthReport {
        status: "ok",
        server_version,
        pool_size: pool.size(),
        idle_connections: pool.num_idle(),
        checked_at: Utc::now(),
    })
}
