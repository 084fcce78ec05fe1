//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the question library API
///
/// Served as JSON at `/openapi.json`; Swagger UI (when enabled) lives at
/// `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "qbank-dl question library API",
        version = "0.1.0",
        description = "Read-only access to downloaded question records: lookup by id, folder listings and per-folder question ids",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local server")
    ),
    paths(
        // Questions
        crate::api::routes::get_question,
        crate::api::routes::list_folders,
        crate::api::routes::list_questions,

        // System
        crate::api::routes::health_check,
        crate::api::routes::rescan,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::library::FolderInfo,
        crate::api::routes::QuestionResponse,
        crate::api::routes::FoldersResponse,
        crate::api::routes::QuestionListResponse,
        crate::api::routes::RescanResponse,
        crate::error::ApiError,
    )),
    tags(
        (name = "questions", description = "Question lookup and folder listings"),
        (name = "system", description = "Health check, library rescan, OpenAPI spec"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/api/question/{id}",
            "/api/folders",
            "/api/questions/{folder}",
            "/health",
            "/api/rescan",
            "/openapi.json",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn spec_has_schemas_and_tags() {
        let spec = ApiDoc::openapi();

        let components = spec.components.expect("components");
        assert!(components.schemas.contains_key("FolderInfo"));
        assert!(components.schemas.contains_key("ApiError"));

        let tags = spec.tags.expect("tags");
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert!(tag_names.contains(&"questions"));
        assert!(tag_names.contains(&"system"));
    }

    #[test]
    fn spec_serializes_as_openapi_3() {
        let json = serde_json::to_value(ApiDoc::openapi()).expect("Should serialize to JSON");
        let version = json.get("openapi").and_then(|v| v.as_str()).unwrap();
        assert!(version.starts_with("3."));
        assert_eq!(json["info"]["title"], "qbank-dl question library API");
    }
}
