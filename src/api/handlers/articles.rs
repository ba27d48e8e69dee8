use crate::{
    AppState,
    report::Report,
    types::{AppError, Result},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// Fetch a cached report by slug
#[utoipa::path(
    get,
    path = "/api/article/{slug}",
    params(("slug" = String, Path, description = "Report slug")),
    responses(
        (status = 200, description = "Cached report", body = Report),
        (status = 404, description = "No report under this slug")
    ),
    tag = "research"
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Report>> {
    let report = state
        .cache
        .get(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Article '{}' not found", slug)))?;

    Ok(Json(report.as_ref().clone()))
}

/// Report feed; not populated yet
#[utoipa::path(
    get,
    path = "/api/feed",
    responses(
        (status = 200, description = "Always an empty list", body = [Report])
    ),
    tag = "research"
)]
pub async fn get_feed() -> Json<Vec<Report>> {
    Json(Vec::new())
}
