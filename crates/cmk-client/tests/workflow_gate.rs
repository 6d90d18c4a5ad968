//! Approval gating against a mock CMK backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use cmk_client::{
    ActionType, ApiError, ArtifactType, GateOutcome, WorkflowCheck, WorkflowError, WorkflowGate,
    WorkflowRequest,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::client;

fn link_request() -> WorkflowRequest {
    WorkflowRequest::new(ArtifactType::System, "sys-123", ActionType::Link)
        .with_parameters("kc-456")
}

async fn mount_check(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/cmk/v1/t1/workflows/check"))
        .and(header("content-type", "application/json"))
        .and(header("x-csrf-token", "tok-1"))
        .and(body_json(json!({
            "artifactType": "SYSTEM",
            "artifactID": "sys-123",
            "actionType": "LINK",
            "parameters": "kc-456"
        })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn required_check_then_create_returns_workflow_id() {
    let server = MockServer::start().await;
    mount_check(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "required": true, "exists": false })),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/cmk/v1/t1/workflows"))
        .and(body_json(json!({
            "artifactType": "SYSTEM",
            "artifactID": "sys-123",
            "actionType": "LINK",
            "parameters": "kc-456"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "wf-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let gate = WorkflowGate::new(&client);
    let request = link_request();

    assert_eq!(gate.check(&request).await.unwrap(), WorkflowCheck::Required);
    let created = gate.create(&request).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("wf-1"));
    assert!(created.confirmation().contains("wf-1"));
}

#[tokio::test]
async fn existing_workflow_wins_over_required() {
    let server = MockServer::start().await;
    mount_check(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "required": true, "exists": true })),
    )
    .await;

    let (client, _) = client(&server);
    let check = WorkflowGate::new(&client).check(&link_request()).await;
    assert_eq!(check.unwrap(), WorkflowCheck::AlreadyExists);
}

#[tokio::test]
async fn not_required_when_backend_says_so() {
    let server = MockServer::start().await;
    mount_check(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "required": false, "exists": false })),
    )
    .await;

    let (client, _) = client(&server);
    let check = WorkflowGate::new(&client).check(&link_request()).await;
    assert_eq!(check.unwrap(), WorkflowCheck::NotRequired);
}

#[tokio::test]
async fn server_error_fails_closed() {
    let server = MockServer::start().await;
    mount_check(&server, ResponseTemplate::new(500)).await;

    let (client, _) = client(&server);
    let err = WorkflowGate::new(&client)
        .check(&link_request())
        .await
        .unwrap_err();
    let WorkflowError::Api(ApiError::Http(http)) = err else {
        unreachable!("expected http error, got {err:?}");
    };
    assert_eq!(http.status(), 500);
}

#[tokio::test]
async fn empty_check_body_is_no_response() {
    let server = MockServer::start().await;
    mount_check(&server, ResponseTemplate::new(200)).await;

    let (client, _) = client(&server);
    let err = WorkflowGate::new(&client)
        .check(&link_request())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NoResponse));
}

#[tokio::test]
async fn check_body_without_flags_fails_closed() {
    for body in [json!({}), json!({ "exists": false }), json!({ "required": false })] {
        let server = MockServer::start().await;
        mount_check(&server, ResponseTemplate::new(200).set_body_json(body)).await;

        let (client, _) = client(&server);
        let err = WorkflowGate::new(&client)
            .check(&link_request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, WorkflowError::Api(ApiError::Json(_))),
            "expected decode error, got {err:?}"
        );
    }
}

#[tokio::test]
async fn absorbed_unauthorized_is_no_response() {
    let server = MockServer::start().await;
    mount_check(&server, ResponseTemplate::new(401)).await;

    let (client, nav) = client(&server);
    let err = WorkflowGate::new(&client)
        .check(&link_request())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NoResponse));
    assert_eq!(nav.calls(), 1);
}

#[tokio::test]
async fn create_absorbed_by_login_is_no_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cmk/v1/t1/workflows"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, nav) = client(&server);
    let err = WorkflowGate::new(&client)
        .create(&link_request())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NoResponse));
    assert_eq!(nav.calls(), 1);
}

#[tokio::test]
async fn create_without_workflow_id_is_no_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cmk/v1/t1/workflows"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let err = WorkflowGate::new(&client)
        .create(&link_request())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NoResponse));
}

#[tokio::test]
async fn create_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cmk/v1/t1/workflows"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": { "code": "WORKFLOW_EXISTS", "requestID": "req-3" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let err = WorkflowGate::new(&client)
        .create(&link_request())
        .await
        .unwrap_err();
    let WorkflowError::Api(api) = err else {
        unreachable!("expected api error, got {err:?}");
    };
    assert_eq!(api.http().unwrap().request_id(), Some("req-3"));
}

#[tokio::test]
async fn run_gated_executes_only_when_not_required() {
    let server = MockServer::start().await;
    mount_check(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "required": false, "exists": false })),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path("/cmk/v1/t1/systems/sys-123/link"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let outcome = WorkflowGate::new(&client)
        .run_gated(&link_request(), || client.link_system("sys-123", "kc-456"))
        .await
        .unwrap();
    assert_eq!(outcome, GateOutcome::Executed(Some(())));
}

#[tokio::test]
async fn run_gated_reports_mutation_absorbed_by_login() {
    let server = MockServer::start().await;
    mount_check(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "required": false, "exists": false })),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path("/cmk/v1/t1/systems/sys-123/link"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, nav) = client(&server);
    let outcome = WorkflowGate::new(&client)
        .run_gated(&link_request(), || client.link_system("sys-123", "kc-456"))
        .await
        .unwrap();
    assert_eq!(outcome, GateOutcome::Executed(None));
    assert_eq!(nav.calls(), 1);
}

#[tokio::test]
async fn run_gated_skips_mutation_when_approval_required() {
    let server = MockServer::start().await;
    mount_check(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "required": true, "exists": false })),
    )
    .await;

    let (client, _) = client(&server);
    let calls = AtomicUsize::new(0);
    let outcome = WorkflowGate::new(&client)
        .run_gated(&link_request(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(outcome, GateOutcome::ApprovalRequired);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_gated_skips_mutation_when_check_fails() {
    let server = MockServer::start().await;
    mount_check(&server, ResponseTemplate::new(503)).await;

    let (client, _) = client(&server);
    let calls = AtomicUsize::new(0);
    let result = WorkflowGate::new(&client)
        .run_gated(&link_request(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_gated_reports_pending_workflow() {
    let server = MockServer::start().await;
    mount_check(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "required": false, "exists": true })),
    )
    .await;

    let (client, _) = client(&server);
    let outcome = WorkflowGate::new(&client)
        .run_gated(&link_request(), || async { Ok::<_, ApiError>(()) })
        .await
        .unwrap();
    assert_eq!(outcome, GateOutcome::AlreadyPending);
}
