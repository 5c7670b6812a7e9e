//! One-time code database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::otp::OtpRecord;
use crate::uuid::uuidv7;

type OtpRow = (Uuid, String, String, bool, i32, DateTime<Utc>, DateTime<Utc>);

fn row_to_record(
    (id, phone, code, used, attempts, expires_at, created_at): OtpRow,
) -> OtpRecord {
    OtpRecord {
        id,
        phone,
        code,
        used,
        attempts,
        expires_at,
        created_at,
    }
}

/// Count codes created for `phone` since `since` (rate-limit window).
pub async fn count_created_since(
    pool: &PgPool,
    phone: &str,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM otp_codes WHERE phone = $1 AND created_at >= $2",
    )
    .bind(phone)
    .bind(since)
    .fetch_one(pool)
    .await
}

/// Insert a new code row, returning the stored record.
pub async fn create(
    pool: &PgPool,
    phone: &str,
    code: &str,
    expires_at: DateTime<Utc>,
) -> Result<OtpRecord, sqlx::Error> {
    let row = sqlx::query_as::<_, OtpRow>(
        "INSERT INTO otp_codes (id, phone, code, expires_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, phone, code, used, attempts, expires_at, created_at",
    )
    .bind(uuidv7())
    .bind(phone)
    .bind(code)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(row_to_record(row))
}

/// Find the most recently created unused code matching (phone, code).
///
/// Expired rows are still returned; the caller decides how expiry surfaces.
pub async fn find_latest_unused(
    pool: &PgPool,
    phone: &str,
    code: &str,
) -> Result<Option<OtpRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, OtpRow>(
        "SELECT id, phone, code, used, attempts, expires_at, created_at \
         FROM otp_codes \
         WHERE phone = $1 AND code = $2 AND used = false \
         ORDER BY created_at DESC \
         LIMIT 1",
    )
    .bind(phone)
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_record))
}

/// Mark a code row as consumed.
pub async fn mark_used(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE otp_codes SET used = true WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Count all code rows (admin stats).
pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM otp_codes")
        .fetch_one(pool)
        .await
}
