use super::*;
use crate::config::LibraryConfig;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

mod system;

async fn write_record(root: &Path, folder: &str, id: &str, value: Value) {
    let dir = root.join(folder);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join(format!("{id}.json")), value.to_string())
        .await
        .unwrap();
}

/// Library with two folders: `math/algebra` (q1, q2) and `geometry` (g1)
async fn create_test_library() -> (Arc<QuestionLibrary>, TempDir) {
    let root = tempfile::tempdir().unwrap();
    write_record(
        root.path(),
        "math/algebra",
        "q2",
        json!({"stem": "two\\nlines", "answerOptions": [{"content": "\\\"a\\\""}]}),
    )
    .await;
    write_record(root.path(), "math/algebra", "q1", json!({"stem": "one"})).await;
    write_record(root.path(), "geometry", "g1", json!({"stem": "circle"})).await;

    let library = QuestionLibrary::open(LibraryConfig {
        root: root.path().to_path_buf(),
        ..LibraryConfig::default()
    })
    .await
    .unwrap();
    (Arc::new(library), root)
}

fn router(library: Arc<QuestionLibrary>) -> Router {
    create_router(library, Arc::new(ApiConfig::default()))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn server_binds_and_stops_on_shutdown() {
    let (library, _root) = create_test_library().await;
    let config = Arc::new(ApiConfig {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        ..ApiConfig::default()
    });
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(start_api_server(library, config, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn cors_enabled_allows_any_origin() {
    let (library, _root) = create_test_library().await;
    let app = router(library);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn cors_disabled_sends_no_cors_headers() {
    let (library, _root) = create_test_library().await;
    let app = create_router(
        library,
        Arc::new(ApiConfig {
            cors_enabled: false,
            ..ApiConfig::default()
        }),
    );

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn cors_specific_origins() {
    let (library, _root) = create_test_library().await;
    let app = create_router(
        library,
        Arc::new(ApiConfig {
            cors_origins: vec!["http://allowed.example".into()],
            ..ApiConfig::default()
        }),
    );

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://allowed.example")
    );
}
