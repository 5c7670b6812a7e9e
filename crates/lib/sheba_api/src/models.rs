//! Request and response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /api/auth/register` request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `user` when absent; restricted to user | worker | admin.
    pub role: Option<String>,
    pub phone: String,
}

/// `POST /api/auth/login` request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/request-otp` request body.
#[derive(Debug, Deserialize)]
pub struct RequestOtpRequest {
    pub phone: Option<String>,
}

/// `POST /api/auth/verify-otp` request body.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: Option<String>,
    pub code: Option<String>,
}

/// User projection plus a freshly issued token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub phone: String,
    pub token: String,
}

/// `POST /api/auth/request-otp` success body.
#[derive(Debug, Serialize)]
pub struct OtpRequestedResponse {
    pub message: String,
    pub phone: String,
    /// Seconds until the issued code expires.
    pub ttl: i64,
}

/// `GET /api/health` response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_connected: bool,
}

/// Error body shared by all failure responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
