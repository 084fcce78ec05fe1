use super::*;

#[tokio::test]
async fn health_reports_version() {
    let (library, _root) = create_test_library().await;
    let (status, body) = get_json(router(library), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["swagger_ui"], true);
    assert_eq!(body["frontend"], false);
}

#[tokio::test]
async fn health_reflects_server_config() {
    let (library, root) = create_test_library().await;
    let app = create_router(
        library,
        Arc::new(ApiConfig {
            swagger_ui: false,
            static_dir: Some(root.path().to_path_buf()),
            ..ApiConfig::default()
        }),
    );
    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["swagger_ui"], false);
    assert_eq!(body["frontend"], true);
}

#[tokio::test]
async fn openapi_json_is_served() {
    let (library, _root) = create_test_library().await;
    let (status, body) = get_json(router(library), "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/folders").is_some());
}

#[tokio::test]
async fn rescan_picks_up_new_folders() {
    let (library, root) = create_test_library().await;
    write_record(root.path(), "algebra", "a1", json!({})).await;

    let app = router(Arc::clone(&library));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/rescan")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["folders"], 3);

    let (status, _) = get_json(router(library), "/api/question/a1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn static_dir_is_served_as_fallback() {
    let (library, _root) = create_test_library().await;
    let site = tempfile::tempdir().unwrap();
    tokio::fs::write(site.path().join("index.html"), "<h1>questions</h1>")
        .await
        .unwrap();

    let app = create_router(
        library,
        Arc::new(ApiConfig {
            static_dir: Some(site.path().to_path_buf()),
            ..ApiConfig::default()
        }),
    );
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>questions</h1>");
}
