//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

use axum::Json;

use crate::types::LivenessResponse;

/// Cached report retrieval and the feed placeholder.
pub mod articles;
/// Report generation.
pub mod research;

/// Liveness message
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = LivenessResponse)
    ),
    tag = "service"
)]
pub async fn root() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "Welcome to the Research Agent API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Plain-text health probe
pub async fn health() -> &'static str {
    "OK"
}
