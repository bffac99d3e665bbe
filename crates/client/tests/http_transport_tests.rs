//! Integration tests for [`HttpTransport`] against a mock HTTP server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{run_meta, tasks, RUN_ID, SPACE_ID};
use runspace_client::report::{self, RunReport};
use runspace_client::{
    DispatchError, Dispatcher, DispatcherConfig, HttpTransport, HttpTransportConfig, Method,
    Transport, TransportError,
};

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(HttpTransportConfig {
        api_url: server.uri(),
        token: Some("tok_123".to_string()),
        team_id: Some("team_1".to_string()),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn post_sends_json_with_auth_and_team() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v0/spaces/sp_1/runs"))
        .and(header("authorization", "Bearer tok_123"))
        .and(header("content-type", "application/json"))
        .and(query_param("teamId", "team_1"))
        .and(body_partial_json(json!({"status": "running"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"run_1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let body = serde_json::to_vec(&json!({"status": "running"})).unwrap();
    let response = transport
        .create_or_update(Method::Post, "/v0/spaces/sp_1/runs", body)
        .await
        .unwrap();

    assert_eq!(response, br#"{"id":"run_1"}"#.to_vec());
}

#[tokio::test]
async fn patch_uses_patch_verb_on_shared_client() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v0/spaces/sp_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::with_client(
        reqwest::Client::new(),
        HttpTransportConfig {
            api_url: format!("{}/", server.uri()),
            token: Some("tok_123".to_string()),
            team_id: Some("team_1".to_string()),
            request_timeout: Duration::from_secs(5),
        },
    );
    assert!(transport.is_linked());
    let response = transport
        .create_or_update(Method::Patch, "/v0/spaces/sp_1/runs/run_1", b"{}".to_vec())
        .await
        .unwrap();

    assert!(response.is_empty());
}

#[tokio::test]
async fn non_success_status_becomes_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport
        .create_or_update(Method::Post, "/v0/spaces/sp_1/runs", b"{}".to_vec())
        .await
        .unwrap_err();

    assert_matches!(
        err,
        TransportError::Status { status: 403, ref body } if body == "forbidden"
    );
}

#[tokio::test]
async fn unreachable_server_is_request_error() {
    let transport = HttpTransport::new(HttpTransportConfig {
        api_url: "http://127.0.0.1:1".to_string(),
        token: None,
        team_id: None,
        request_timeout: Duration::from_secs(2),
    })
    .unwrap();

    let err = transport
        .create_or_update(Method::Post, "/v0/spaces/sp_1/runs", b"{}".to_vec())
        .await
        .unwrap_err();

    assert_matches!(err, TransportError::Request(_));
}

// ---------------------------------------------------------------------------
// Test: dispatcher end-to-end over HTTP
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn replay_over_http_hits_every_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v0/spaces/{SPACE_ID}/runs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": RUN_ID,
            "url": "https://spaces.example.com/runs/run_1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v0/spaces/{SPACE_ID}/runs/{RUN_ID}/tasks")))
        .and(body_partial_json(json!({"cache": {"status": "MISS"}})))
        .respond_with(ResponseTemplate::new(201))
        .expect(12)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/v0/spaces/{SPACE_ID}/runs/{RUN_ID}")))
        .and(body_partial_json(json!({"status": "completed", "exitCode": 0})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(
        Arc::new(transport_for(&server)),
        DispatcherConfig::new(SPACE_ID),
    );
    let report = RunReport {
        meta: run_meta(),
        tasks: tasks(12),
    };

    let outcome = report::replay(&dispatcher, &report).await;

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(
        outcome.run.map(|r| r.url),
        Some("https://spaces.example.com/runs/run_1".to_string())
    );
}

#[tokio::test]
async fn failing_task_endpoint_does_not_stop_other_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v0/spaces/{SPACE_ID}/runs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": RUN_ID, "url": ""})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v0/spaces/{SPACE_ID}/runs/{RUN_ID}/tasks")))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(
        Arc::new(transport_for(&server)),
        DispatcherConfig::new(SPACE_ID),
    );
    let report = RunReport {
        meta: run_meta(),
        tasks: tasks(3),
    };

    let outcome = report::replay(&dispatcher, &report).await;

    assert!(outcome.run.is_some());
    assert_eq!(outcome.errors.len(), 3);
    for err in &outcome.errors {
        assert_matches!(&err.kind, DispatchError::Transport(msg) if msg.contains("500"));
        assert_eq!(err.method, Method::Post);
    }
}
