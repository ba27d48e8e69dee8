use crate::{
    AppState,
    types::{AppError, ResearchRequest, ResearchResponse, Result},
};
use axum::{Json, extract::State};
use std::time::Instant;

/// Generate a report for a query and publish it under its slug
#[utoipa::path(
    post,
    path = "/api/research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Report generated and cached", body = ResearchResponse),
        (status = 400, description = "Empty query"),
        (status = 500, description = "Pipeline failed or report did not validate")
    ),
    tag = "research"
)]
pub async fn create_report(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }

    let start = Instant::now();
    let report = state.pipeline().run(query).await?;

    tracing::info!(
        slug = %report.slug(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Research request completed"
    );

    Ok(Json(ResearchResponse {
        slug: report.slug().to_string(),
    }))
}
