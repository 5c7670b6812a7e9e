//! Row counts for the admin stats endpoint.

use serde::Serialize;
use sqlx::PgPool;

use crate::otp;

/// Per-collection row counts.
#[derive(Debug, Clone, Serialize)]
pub struct StatsCounts {
    pub users: i64,
    pub workers: i64,
    pub events: i64,
    pub otps: i64,
}

async fn count_table(pool: &PgPool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
}

/// Collect row counts across the stats-relevant tables.
pub async fn collect(pool: &PgPool) -> Result<StatsCounts, sqlx::Error> {
    Ok(StatsCounts {
        users: count_table(pool, "SELECT COUNT(*) FROM users").await?,
        workers: count_table(pool, "SELECT COUNT(*) FROM workers").await?,
        events: count_table(pool, "SELECT COUNT(*) FROM events").await?,
        otps: otp::queries::count_all(pool).await?,
    })
}
