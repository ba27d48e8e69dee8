//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Dossier, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Research (`/api`)
//! - `POST /api/research` - Run the pipeline for `{query}` and return `{slug}`
//! - `GET /api/article/{slug}` - Fetch a cached report
//! - `GET /api/feed` - Report feed (always empty for now)
//!
//! ## Service
//! - `GET /` - Liveness message and version
//! - `GET /health` - Plain `OK`
//! - `GET /api-docs/openapi.json` - OpenAPI document
//!
//! Failed pipeline runs answer `500` with `{"error", "detail"}`, where
//! `detail` carries either the graph error or the validation problems and
//! the partial report.

use utoipa::OpenApi;

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

/// OpenAPI document for the public endpoints
#[derive(OpenApi)]
#[openapi(
    info(title = "Dossier Research API"),
    paths(
        crate::api::handlers::research::create_report,
        crate::api::handlers::articles::get_article,
        crate::api::handlers::articles::get_feed,
        crate::api::handlers::root,
    ),
    components(schemas(
        crate::types::ResearchRequest,
        crate::types::ResearchResponse,
        crate::types::LivenessResponse,
        crate::report::Report,
        crate::report::Article,
        crate::report::ExecutiveSummary,
        crate::report::TimelineItem,
        crate::report::CitedSource,
        crate::report::RawFacts,
        crate::report::Perspective,
    )),
    tags(
        (name = "research", description = "Report generation and retrieval"),
        (name = "service", description = "Liveness")
    )
)]
pub struct ApiDoc;
