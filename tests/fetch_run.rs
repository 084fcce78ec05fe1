//! End-to-end runs against a mock question endpoint
//!
//! Every test drives the public API (`RunController`) over real HTTP to a
//! wiremock server and checks what ends up on disk.

mod common;

use common::{
    mount_question, mount_status, question_payload, read_record, test_config, write_input,
    write_raw_input,
};
use qbank_dl::{ConcurrencyPolicy, Error, Event, RunController};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

#[tokio::test]
async fn rate_limited_question_is_the_only_one_fetched_again() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "algebra.json", &[("q1", "e1"), ("q2", "e2"), ("q3", "e3")]).await;

    // First run: e2 is rate limited
    let server = MockServer::start().await;
    mount_question(&server, "e1", 1).await;
    mount_status(&server, "e2", 429, 1).await;
    mount_question(&server, "e3", 1).await;

    let controller = RunController::new(test_config(&server, dir.path())).unwrap();
    let summary = controller.run(&input).await.unwrap();

    assert_eq!(summary.stats.total, 3);
    assert_eq!(summary.stats.successful, 2);
    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.stats.rate_limited, 1);

    let folder = dir.path().join("algebra");
    assert_eq!(read_record(&folder.join("q1.json")).await, question_payload("e1"));
    assert_eq!(read_record(&folder.join("q3.json")).await, question_payload("e3"));
    assert!(!folder.join("q2.json").exists());
    server.verify().await;

    // Second run: only e2 goes out, and it is still rate limited
    let rerun_server = MockServer::start().await;
    mount_question(&rerun_server, "e1", 0).await;
    mount_status(&rerun_server, "e2", 429, 1).await;
    mount_question(&rerun_server, "e3", 0).await;

    let controller = RunController::new(test_config(&rerun_server, dir.path())).unwrap();
    let summary = controller.run(&input).await.unwrap();

    assert_eq!(summary.stats.successful, 2);
    assert_eq!(summary.stats.skipped, 2);
    assert_eq!(summary.stats.failed, 1);
    assert_eq!(rerun_server.received_requests().await.unwrap().len(), 1);
    rerun_server.verify().await;
}

#[tokio::test]
async fn sequential_mode_spaces_requests_by_the_delay() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "geometry.json", &[("g1", "e1"), ("g2", "e2")]).await;

    let server = MockServer::start().await;
    mount_question(&server, "e1", 1).await;
    mount_question(&server, "e2", 1).await;

    let mut config = test_config(&server, dir.path());
    config.policy = ConcurrencyPolicy::sequential(Duration::from_secs(1));
    let controller = RunController::new(config).unwrap();

    let started = Instant::now();
    let summary = controller.run(&input).await.unwrap();

    assert_eq!(summary.stats.successful, 2);
    // One delay between the two requests, none after the last
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(2) + Duration::from_millis(900));
    server.verify().await;
}

#[tokio::test]
async fn malformed_records_are_never_sent() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw_input(
        dir.path(),
        "standardEnglish.json",
        r#"[
            {"questionId": "s1", "external_id": "e1"},
            {"questionId": "s2"},
            {"external_id": "e3"},
            {"questionId": "../escape", "external_id": "e4"}
        ]"#,
    )
    .await;

    let server = MockServer::start().await;
    mount_question(&server, "e1", 1).await;

    let controller = RunController::new(test_config(&server, dir.path())).unwrap();
    let summary = controller.run(&input).await.unwrap();

    assert_eq!(summary.stats.total, 4);
    assert_eq!(summary.stats.completed, 4);
    assert_eq!(summary.stats.successful, 1);
    assert_eq!(summary.stats.malformed, 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(!dir.path().join("escape.json").exists());
}

#[tokio::test]
async fn server_errors_fail_only_their_item() {
    let dir = tempfile::tempdir().unwrap();
    let pairs: Vec<(String, String)> = (1..=20).map(|i| (format!("q{i}"), format!("e{i}"))).collect();
    let borrowed: Vec<(&str, &str)> = pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    let input = write_input(dir.path(), "advancedmath.json", &borrowed).await;

    let server = MockServer::start().await;
    for i in 1..=20 {
        let external_id = format!("e{i}");
        if i == 7 {
            mount_status(&server, &external_id, 500, 1).await;
        } else {
            mount_question(&server, &external_id, 1).await;
        }
    }

    let mut config = test_config(&server, dir.path());
    config.policy = ConcurrencyPolicy::bounded(5);
    let controller = RunController::new(config).unwrap();
    let summary = controller.run(&input).await.unwrap();

    assert_eq!(summary.stats.completed, 20);
    assert_eq!(summary.stats.successful, 19);
    assert_eq!(summary.stats.failed, 1);
    assert!(!dir.path().join("advancedmath/q7.json").exists());
    server.verify().await;
}

#[tokio::test]
async fn records_keep_unicode_literal() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "craftAndStructure.json", &[("c1", "e1")]).await;

    let server = MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(json!({"stem": "résumé ≥ 2π"})),
        )
        .mount(&server)
        .await;

    let controller = RunController::new(test_config(&server, dir.path())).unwrap();
    controller.run(&input).await.unwrap();

    let text = tokio::fs::read_to_string(dir.path().join("craftAndStructure/c1.json"))
        .await
        .unwrap();
    assert!(text.contains("résumé ≥ 2π"));
}

#[tokio::test]
async fn missing_input_is_fatal_and_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;

    let controller = RunController::new(test_config(&server, dir.path())).unwrap();
    let err = controller
        .run(&dir.path().join("nope.json"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InputList { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_input_completes_with_zero_counts() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw_input(dir.path(), "empty.json", "[]").await;
    let server = MockServer::start().await;

    let controller = RunController::new(test_config(&server, dir.path())).unwrap();
    let summary = controller.run(&input).await.unwrap();

    assert_eq!(summary.stats.total, 0);
    assert_eq!(summary.success_rate(), 0.0);
    assert!(dir.path().join("empty").is_dir());
    assert!(summary.to_string().contains("PROCESSING COMPLETE"));
}

#[tokio::test]
async fn cancelled_before_start_dispatches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "algebra.json", &[("q1", "e1"), ("q2", "e2")]).await;
    let server = MockServer::start().await;

    let controller = RunController::new(test_config(&server, dir.path())).unwrap();
    let mut events = controller.subscribe();
    let plan = controller.prepare(&input).await.unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let summary = controller.execute(plan, token).await;

    assert!(summary.cancelled);
    assert_eq!(summary.stats.completed, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(summary.to_string().contains("PROCESSING CANCELLED"));

    let mut finished = false;
    while let Ok(event) = events.try_recv() {
        if let Event::RunFinished { summary } = event {
            assert!(summary.cancelled);
            finished = true;
        }
    }
    assert!(finished);
}
