//! Link lifecycle handlers: create, list, detail, redirect, QR image.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Response as HttpResponse, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::{
    api::extractors::{ValidatedJson, VisitorInfo},
    error::{AppError, Result},
    models::{ApiResponse, CreateLinkRequest, LinkResponse, ListParams},
    services::AppState,
};

/// `POST /api/links`
///
/// Request body:
/// ```json
/// { "destination_url": "https://zillow.com/home/123", "owner_id": "agent-7" }
/// ```
///
/// Responds `201 Created` with the code, short URL and QR image URL.
pub async fn create_link(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLinkRequest>,
) -> Result<impl IntoResponse> {
    let link = state.link_service.create_link(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(link).with_message("link created")),
    ))
}

/// `GET /api/links[?owner=...]`
pub async fn list_links(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<LinkResponse>>>> {
    let links = state
        .link_service
        .list_links(params.owner.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(links)))
}

/// `GET /api/links/:code`
pub async fn get_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<LinkResponse>>> {
    let link = state.link_service.get_link(&code).await?;

    Ok(Json(ApiResponse::success(link)))
}

/// `GET /:code`
///
/// The core redirect: records the click, then answers
/// `302 Found` with the destination in `Location`. Unknown codes get a
/// plain 404 and never a redirect.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    VisitorInfo(visitor): VisitorInfo,
) -> Result<Response> {
    let destination = state.link_service.resolve(&code, visitor).await?;

    info!(code = %code, "redirecting");

    // An explicit 302; axum's Redirect helpers answer 303/307/308.
    let response = HttpResponse::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, destination)
        .body(Body::empty())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

/// `GET /api/links/:code/qr.svg`
///
/// QR image for the short URL, ready for flyers and listing sheets.
pub async fn qr_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    // 404 for unknown codes, same as the redirect path.
    state.link_service.get_link(&code).await?;

    let svg = state.qr_service.render_svg(&code)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}
