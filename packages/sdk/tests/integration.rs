//! Integration tests against a mocked backend API

use std::collections::HashMap;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use daytona_sdk::{
    Config, ConfigOverrides, CreateParams, Credentials, Daytona, SandboxState,
};

fn sandbox_json(id: &str, state: &str) -> serde_json::Value {
    json!({ "id": id, "state": state, "labels": {}, "target": "eu" })
}

fn labeled_json(id: &str, labels: serde_json::Value) -> serde_json::Value {
    json!({ "id": id, "state": "started", "labels": labels, "target": "eu" })
}

async fn client_for(server: &MockServer) -> Daytona {
    let config = Config::resolve(ConfigOverrides {
        api_key: Some("test-key".to_string()),
        api_url: Some(server.uri()),
        target: Some("eu".to_string()),
        ..Default::default()
    })
    .unwrap();
    Daytona::new(config).unwrap()
}

#[tokio::test]
async fn create_polls_until_the_sandbox_starts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandbox"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "language": "python",
            "autoStopInterval": 15,
            "target": "eu",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "creating")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "creating")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "started")))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let sandbox = client
        .create(CreateParams::default(), Some(30.0))
        .await
        .unwrap();

    assert_eq!(sandbox.id(), "sb-1");
    assert_eq!(sandbox.state(), SandboxState::Started);
    assert_eq!(sandbox.target(), Some("eu"));
}

#[tokio::test]
async fn create_times_out_while_the_backend_is_stuck() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "creating")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "creating")))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .create(CreateParams::default(), Some(1.5))
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "{err}");
    assert!(err.to_string().contains("creating"), "{err}");
}

#[tokio::test]
async fn create_fails_fast_when_the_backend_reports_a_failure_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "creating")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sb-1",
            "state": "error",
            "errorReason": "quota exceeded",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .create(CreateParams::default(), Some(30.0))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Failed to create sandbox: "), "{message}");
    assert!(message.contains("quota exceeded"), "{message}");
}

#[tokio::test]
async fn missing_sandboxes_surface_as_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sandbox/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Sandbox missing not found",
            "statusCode": 404,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("missing").await.unwrap_err();

    assert!(err.is_not_found(), "{err}");
    assert_eq!(
        err.to_string(),
        "Failed to get sandbox: Sandbox missing not found"
    );
}

#[tokio::test]
async fn list_and_find_filter_by_label_superset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sandbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            labeled_json("sb-1", json!({"env": "dev"})),
            labeled_json("sb-2", json!({"env": "prod"})),
            labeled_json("sb-3", json!({"env": "dev", "team": "core"})),
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let filter: HashMap<String, String> = [("env".to_string(), "dev".to_string())]
        .into_iter()
        .collect();
    let sandboxes = client.list(Some(&filter)).await.unwrap();
    let ids: Vec<&str> = sandboxes.iter().map(|sandbox| sandbox.id()).collect();
    assert_eq!(ids, vec!["sb-1", "sb-3"]);

    let all = client.list(None).await.unwrap();
    assert_eq!(all.len(), 3);

    let prod: HashMap<String, String> = [("env".to_string(), "prod".to_string())]
        .into_iter()
        .collect();
    let found = client.find_one(None, Some(&prod)).await.unwrap();
    assert_eq!(found.id(), "sb-2");
}

#[tokio::test]
async fn delete_waits_until_the_backend_reports_absence() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "started")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "destroying")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Sandbox sb-1 not found",
            "statusCode": 404,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let sandbox = client.get("sb-1").await.unwrap();
    client.delete(&sandbox, Some(30.0)).await.unwrap();
}

#[tokio::test]
async fn delete_of_a_missing_sandbox_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "started")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Sandbox sb-1 not found",
            "statusCode": 404,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let sandbox = client.get("sb-1").await.unwrap();
    client.delete(&sandbox, Some(30.0)).await.unwrap();
}

#[tokio::test]
async fn start_polls_and_refreshes_the_handle() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "stopped")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sandbox/sb-1/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandbox/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1", "started")))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut sandbox = client.get("sb-1").await.unwrap();
    assert_eq!(sandbox.state(), SandboxState::Stopped);

    client.start(&mut sandbox, Some(30.0)).await.unwrap();
    assert_eq!(sandbox.state(), SandboxState::Started);
}

#[tokio::test]
async fn jwt_authentication_sends_the_organization_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sandbox"))
        .and(header("Authorization", "Bearer jwt-token"))
        .and(header("X-Daytona-Organization-ID", "org-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        credentials: Credentials::Jwt {
            token: "jwt-token".to_string(),
            organization_id: "org-1".to_string(),
        },
        api_url: server.uri(),
        target: "eu".to_string(),
    };
    let client = Daytona::new(config).unwrap();

    let sandboxes = client.list(None).await.unwrap();
    assert!(sandboxes.is_empty());
}
