//! # sheba_api
//!
//! HTTP API library for the Sheba marketplace backend.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use sheba_core::sms::SmsSender;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Outbound SMS channel.
    pub sms: Arc<dyn SmsSender>,
}

/// Run embedded database migrations.
///
/// Delegates to `sheba_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sheba_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/request-otp", post(auth::request_otp_handler))
        .route("/api/auth/verify-otp", post(auth::verify_otp_handler));

    // Admin routes (bearer token + admin role)
    let admin = Router::new()
        .route("/api/admin/stats", get(admin::stats_handler))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .layer(cors)
        .with_state(state)
}
