//! Liveness probe.

use axum::{extract::State, Json};

use crate::{error::Result, models::HealthResponse, services::AppState};

/// `GET /health`
///
/// Answers `healthy` when the database responds, `degraded` otherwise.
/// Always 200 so orchestrators can distinguish "up but degraded" from
/// "down".
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let db_ok = state.database.health_check().await.is_ok();

    Ok(Json(HealthResponse::healthy(db_ok)))
}
