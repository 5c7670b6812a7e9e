//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use sheba_core::models::auth::{ALLOWED_ROLES, DEFAULT_ROLE};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthResponse, LoginRequest, OtpRequestedResponse, RegisterRequest, RequestOtpRequest,
    VerifyOtpRequest,
};
use crate::services::{auth, otp};

/// `POST /api/auth/register` — create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    // Role strings are restricted here, not in the service.
    let role = body.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());
    if !ALLOWED_ROLES.contains(&role.as_str()) {
        return Err(AppError::Validation("Invalid Role".into()));
    }

    let resp = auth::register(
        &state.pool,
        &body.name,
        &body.email,
        &body.password,
        &role,
        &body.phone,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /api/auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::login(
        &state.pool,
        &body.email,
        &body.password,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/auth/request-otp` — issue a one-time code for a phone number.
pub async fn request_otp_handler(
    State(state): State<AppState>,
    Json(body): Json<RequestOtpRequest>,
) -> AppResult<Json<OtpRequestedResponse>> {
    let phone = body.phone.as_deref().map(str::trim).unwrap_or_default();
    if phone.is_empty() {
        return Err(AppError::Validation("Phone is required".into()));
    }

    let resp = otp::request_otp(&state, phone).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/verify-otp` — verify a code and log the user in.
pub async fn verify_otp_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> AppResult<Json<AuthResponse>> {
    let phone = body.phone.as_deref().map(str::trim).unwrap_or_default();
    let code = body.code.as_deref().map(str::trim).unwrap_or_default();
    if phone.is_empty() || code.is_empty() {
        return Err(AppError::Validation("Phone and code are required".into()));
    }

    let resp = otp::verify_otp(&state, phone, code).await?;
    Ok(Json(resp))
}
