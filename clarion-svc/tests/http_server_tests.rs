//! HTTP surface integration tests
//!
//! Drive the axum router directly with `tower::ServiceExt::oneshot`.
//! The job-submission test points the client at an unreachable local
//! port, so every file fails fast without touching the network.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

use clarion_common::TomlConfig;
use clarion_svc::{build_router, AppState};

fn test_state(api_key: Option<&str>) -> AppState {
    AppState::new(TomlConfig {
        api_key: api_key.map(|k| k.to_string()),
        // Nothing listens here; submissions fail with a transport error
        api_base_url: "http://127.0.0.1:9".to_string(),
        max_concurrency: 4,
        ..TomlConfig::default()
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let app = build_router(test_state(Some("k")));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "clarion-svc");
}

#[tokio::test]
async fn test_root_serves_html() {
    let app = build_router(test_state(Some("k")));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().contains("text/html"));
}

#[tokio::test]
async fn test_unknown_job_returns_404_envelope() {
    let app = build_router(test_state(Some("k")));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/jobs/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_submit_with_no_files_rejected() {
    let app = build_router(test_state(Some("k")));
    let dir = tempfile::tempdir().unwrap();

    let response = app
        .oneshot(post_json(
            "/jobs",
            json!({
                "files": [],
                "output_folder": dir.path().join("out"),
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_without_api_key_rejected() {
    let app = build_router(test_state(None));
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("take.wav");
    std::fs::write(&input, b"RIFF").unwrap();

    let response = app
        .oneshot(post_json(
            "/jobs",
            json!({
                "files": [input],
                "output_folder": dir.path().join("out"),
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("API key"));
}

#[tokio::test]
async fn test_submit_runs_to_done_with_per_file_failures() {
    let state = test_state(Some("test-key"));
    let app = build_router(state);
    let dir = tempfile::tempdir().unwrap();

    let wav = dir.path().join("take.wav");
    std::fs::write(&wav, vec![0u8; 512]).unwrap();
    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, b"not audio").unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/jobs",
            json!({
                "files": [wav, txt],
                "output_folder": dir.path().join("out"),
                "enhancement_model": "FINCH",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "processing");
    let job_id = body["job_id"].as_str().unwrap().to_string();
    let expected = body["expected_outputs"].as_array().unwrap();
    assert_eq!(expected.len(), 2);
    assert!(expected
        .iter()
        .any(|p| p.as_str().unwrap().ends_with("take_FINCH.wav")));

    // Both files fail fast (unsupported extension, unreachable API), so
    // the job reaches done well within this polling window.
    let mut last = Value::Null;
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/jobs/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        last = body_json(response).await;
        if last["status"] == "done" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(last["status"], "done", "job never completed: {}", last);
    let outputs = last["outputs"].as_array().unwrap();
    let failures = last["failures"].as_array().unwrap();
    assert_eq!(outputs.len() + failures.len(), 2);
    assert!(outputs.is_empty());
    assert!(failures
        .iter()
        .any(|f| f.as_str().unwrap().contains("Unsupported file extension")));
}
