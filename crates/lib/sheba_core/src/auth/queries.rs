//! Auth-related database queries.

use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{User, UserWithPassword};

type UserRow = (Uuid, String, Option<String>, String, String, bool);

fn row_to_user((id, name, email, phone, role, is_active): UserRow) -> User {
    User {
        id,
        name,
        email,
        phone,
        role,
        is_active,
    }
}

/// Fetch a user by email, including the stored password hash.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, (Uuid, String, Option<String>, String, String, bool, Option<String>)>(
        "SELECT id, name, email, phone, role::text, is_active, password_hash \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, name, email, phone, role, is_active, password_hash)| UserWithPassword {
        user: row_to_user((id, name, email, phone, role, is_active)),
        password_hash,
    }))
}

/// Fetch a user by phone.
pub async fn find_user_by_phone(pool: &PgPool, phone: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, phone, role::text, is_active FROM users WHERE phone = $1",
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_user))
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Create a new user, returning the stored record.
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    phone: &str,
) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (name, email, password_hash, role, phone) \
         VALUES ($1, $2, $3, $4::user_role, $5) \
         RETURNING id, name, email, phone, role::text, is_active",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(phone)
    .fetch_one(pool)
    .await?;
    Ok(row_to_user(row))
}
