//! System handlers: health, rescan, OpenAPI.

use crate::api::AppState;
use crate::error::Error;
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use super::RescanResponse;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "swagger_ui": state.config.swagger_ui,
        "frontend": state.config.static_dir.is_some()
    }))
}

/// POST /api/rescan - Re-scan the library root for question folders
#[utoipa::path(
    post,
    path = "/api/rescan",
    tag = "system",
    responses(
        (status = 200, description = "Folders re-scanned", body = RescanResponse),
        (status = 500, description = "The library root could not be read", body = crate::error::ApiError)
    )
)]
pub async fn rescan(State(state): State<AppState>) -> Result<Json<RescanResponse>, Error> {
    let folders = state.library.rescan().await?;
    tracing::info!(folders, "Question library re-scanned");
    Ok(Json(RescanResponse {
        success: true,
        folders,
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
