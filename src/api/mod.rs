//! REST API server module
//!
//! Serves the question library to the browser front-end: question lookup by id,
//! folder listings and per-folder question ids, plus an optional static directory
//! holding the front-end itself.

use crate::config::ApiConfig;
use crate::library::QuestionLibrary;
use crate::Result;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Questions
/// - `GET /api/question/:id` - Find a question in any folder
/// - `GET /api/folders` - List folders with question counts
/// - `GET /api/questions/*folder` - List question ids in a folder
///
/// ## System
/// - `GET /health` - Health check
/// - `POST /api/rescan` - Re-scan the library root
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
///
/// Any other path is served from `static_dir` when one is configured.
pub fn create_router(library: Arc<QuestionLibrary>, config: Arc<ApiConfig>) -> Router {
    let state = AppState::new(library, config.clone());

    let router = Router::new()
        // Questions
        .route("/api/question/:id", get(routes::get_question))
        .route("/api/folders", get(routes::list_folders))
        .route("/api/questions/*folder", get(routes::list_questions))
        // System
        .route("/health", get(routes::health_check))
        .route("/api/rescan", post(routes::rescan))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI gets its own copy of the document so it does not clash with /openapi.json
    let router = if config.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    let router = match &config.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    let router = router.layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        router.layer(build_cors_layer(&config.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed origins
/// are allowed. All methods and headers are permitted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until `shutdown` is cancelled; in-flight requests are allowed to finish.
///
/// # Example
///
/// ```no_run
/// use qbank_dl::config::{ApiConfig, LibraryConfig};
/// use qbank_dl::library::QuestionLibrary;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let library = Arc::new(QuestionLibrary::open(LibraryConfig::default()).await?);
/// let config = Arc::new(ApiConfig::default());
///
/// // Blocks until the token is cancelled
/// qbank_dl::api::start_api_server(library, config, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    library: Arc<QuestionLibrary>,
    config: Arc<ApiConfig>,
    shutdown: CancellationToken,
) -> Result<()> {
    let bind_address = config.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(library, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
