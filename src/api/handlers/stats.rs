//! Analytics handlers: per-link stats, click export, system totals.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::{
    error::Result,
    models::{ApiResponse, StatsResponse, SystemStats},
    services::AppState,
};

/// `GET /api/links/:code/stats`
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "code": "aZ3kq1",
///     "total_clicks": 3,
///     "by_day": [{ "day": "2026-08-28", "clicks": 3 }],
///     "devices": { "mobile": 1, "desktop": 2 }
///   }
/// }
/// ```
pub async fn link_stats(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<StatsResponse>>> {
    let stats = state.analytics_service.link_stats(&code).await?;

    Ok(Json(ApiResponse::success(stats)))
}

/// `GET /api/links/:code/clicks.csv`
///
/// Raw click log as a spreadsheet-friendly download.
pub async fn clicks_csv(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let csv = state.analytics_service.clicks_csv(&code).await?;

    let disposition = format!("attachment; filename=\"{code}-clicks.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// `GET /api/stats`
pub async fn system_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SystemStats>>> {
    let stats = state.analytics_service.system_stats().await?;

    Ok(Json(ApiResponse::success(stats)))
}
