//! Authentication service — register/login flows delegating to `sheba_core::auth`.

use sqlx::PgPool;

use sheba_core::auth::{jwt, password, phone, queries};
use sheba_core::models::auth::User;

use crate::error::{AppError, AppResult, is_unique_violation};
use crate::models::AuthResponse;

/// Build the user projection + token returned by every auth flow.
pub(crate) fn build_auth_response(user: User, token: String) -> AuthResponse {
    AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        phone: user.phone,
        token,
    }
}

/// Register a new user account.
pub async fn register(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_plain: &str,
    role: &str,
    phone_number: &str,
    jwt_secret: &[u8],
) -> AppResult<AuthResponse> {
    let email = email.trim().to_lowercase();

    if queries::email_exists(pool, &email).await? {
        return Err(AppError::Validation("User already exists".into()));
    }

    if !phone::is_valid_bd_phone(phone_number) {
        return Err(AppError::Validation(
            "Invalid Bangladeshi phone number".into(),
        ));
    }

    let password_hash = password::hash_password(password_plain)?;

    let user = queries::create_user(pool, name, &email, &password_hash, role, phone_number)
        .await
        .map_err(|e| match e {
            // Concurrent duplicate or reused phone: same answer as the
            // up-front email check.
            sheba_core::auth::AuthError::DbError(db) if is_unique_violation(&db) => {
                AppError::Validation("User already exists".into())
            }
            other => other.into(),
        })?;

    let token = jwt::generate_token(&user.id.to_string(), &user.role, jwt_secret)?;
    Ok(build_auth_response(user, token))
}

/// Authenticate with email + password.
pub async fn login(
    pool: &PgPool,
    email: &str,
    password_plain: &str,
    jwt_secret: &[u8],
) -> AppResult<AuthResponse> {
    let email = email.trim().to_lowercase();

    let row = queries::find_user_by_email(pool, &email).await?;

    // Same message for unknown email, passwordless row, and hash mismatch —
    // the caller cannot tell which check failed.
    let record = match row {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(r) => r,
    };

    let password_hash = match record.password_hash {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(h) => h,
    };

    if !password::verify_password(password_plain, &password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let user = record.user;
    let token = jwt::generate_token(&user.id.to_string(), &user.role, jwt_secret)?;
    Ok(build_auth_response(user, token))
}
