//! Admin request handlers.

use axum::Json;
use axum::extract::State;

use sheba_core::stats::{self, StatsCounts};

use crate::AppState;
use crate::error::AppResult;

/// `GET /api/admin/stats` — row counts across the marketplace collections.
/// Reached only through the auth + admin-role middleware.
pub async fn stats_handler(State(state): State<AppState>) -> AppResult<Json<StatsCounts>> {
    let counts = stats::collect(&state.pool).await?;
    Ok(Json(counts))
}
