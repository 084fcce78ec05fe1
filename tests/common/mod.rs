//! Common test utilities for qbank-dl end-to-end tests

#![allow(dead_code)]

use qbank_dl::Config;
use qbank_dl::config::{FetchConfig, OutputConfig};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock endpoint listens on
pub const ENDPOINT_PATH: &str = "/get-question";

/// Configuration pointing at `server`, writing under `base_dir`
pub fn test_config(server: &MockServer, base_dir: &Path) -> Config {
    Config {
        fetch: FetchConfig {
            endpoint: format!("{}{ENDPOINT_PATH}", server.uri()),
            ..FetchConfig::default()
        },
        output: OutputConfig {
            base_dir: base_dir.to_path_buf(),
        },
        ..Config::default()
    }
}

/// Payload the mock endpoint returns for `external_id`
pub fn question_payload(external_id: &str) -> Value {
    json!({
        "externalid": external_id,
        "stem": format!("<p>Question {external_id}</p>"),
        "answerOptions": [{"id": "a", "content": "<p>4</p>"}],
        "correct_answer": ["A"]
    })
}

/// Answer `external_id` with 200 and [`question_payload`], expecting exactly `times` calls
pub async fn mount_question(server: &MockServer, external_id: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({ "external_id": external_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(question_payload(external_id)))
        .expect(times)
        .mount(server)
        .await;
}

/// Answer `external_id` with `status` and no body, expecting exactly `times` calls
pub async fn mount_status(server: &MockServer, external_id: &str, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({ "external_id": external_id })))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

/// Write an input list of `(questionId, external_id)` pairs
pub async fn write_input(dir: &Path, name: &str, pairs: &[(&str, &str)]) -> PathBuf {
    let records: Vec<Value> = pairs
        .iter()
        .map(|(local_id, external_id)| json!({"questionId": local_id, "external_id": external_id}))
        .collect();
    write_raw_input(dir, name, &Value::Array(records).to_string()).await
}

/// Write an input list verbatim
pub async fn write_raw_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let input = dir.join(name);
    tokio::fs::write(&input, contents).await.unwrap();
    input
}

/// Parse a persisted record
pub async fn read_record(path: &Path) -> Value {
    serde_json::from_str(&tokio::fs::read_to_string(path).await.unwrap()).unwrap()
}
