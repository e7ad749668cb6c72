//! Integration tests for the authorization gate and the health endpoint.

mod helpers;

use axum::http::StatusCode;
use gatehouse_core::config::ReloadMode;
use gatehouse_core::types::PolicyRule;
use serde_json::json;

#[tokio::test]
async fn test_read_allowed_by_rule() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;

    let response = app.request("GET", "/api/resource", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"code": 1, "message": "read resource successfully", "data": "resource"})
    );
}

#[tokio::test]
async fn test_write_forbidden_without_rule() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;

    let response = app.request("POST", "/api/resource", Some(&token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.body,
        json!({"code": 0, "message": "forbidden", "data": null})
    );
}

#[tokio::test]
async fn test_policy_file_edit_applies_to_next_request() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;
    assert_eq!(
        app.request("POST", "/api/resource", Some(&token)).await.status,
        StatusCode::FORBIDDEN
    );

    app.append_policy_line("p, alice, resource, write");

    let response = app.request("POST", "/api/resource", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "write resource successfully");
}

#[tokio::test]
async fn test_role_link_grants_write() {
    let app = helpers::TestApp::new().await;
    let token = app.login("bob", "123").await;

    let response = app.request("POST", "/api/resource", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], "resource");
}

#[tokio::test]
async fn test_subject_without_rules_is_denied() {
    let app = helpers::TestApp::builder()
        .policy("p, carol, resource, read\n")
        .build()
        .await;
    let token = app.login("bob", "123").await;

    let response = app.request("GET", "/api/resource", Some(&token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_add_then_remove_through_enforcer() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;
    let rule = PolicyRule::permission("alice", "resource", "write");

    assert!(app.enforcer.add_policy(&rule).await.unwrap());
    assert_eq!(
        app.request("POST", "/api/resource", Some(&token)).await.status,
        StatusCode::OK
    );

    assert!(app.enforcer.remove_policy(&rule).await.unwrap());
    assert_eq!(
        app.request("POST", "/api/resource", Some(&token)).await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_on_write_reload_ignores_out_of_band_edits() {
    let app = helpers::TestApp::builder()
        .reload(ReloadMode::OnWrite)
        .build()
        .await;
    let token = app.login("alice", "111").await;
    assert_eq!(
        app.request("POST", "/api/resource", Some(&token)).await.status,
        StatusCode::FORBIDDEN
    );

    app.append_policy_line("p, alice, resource, write");
    assert_eq!(
        app.request("POST", "/api/resource", Some(&token)).await.status,
        StatusCode::FORBIDDEN
    );

    app.enforcer
        .add_policy(&PolicyRule::grouping("carol", "writer"))
        .await
        .unwrap();
    assert_eq!(
        app.request("POST", "/api/resource", Some(&token)).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_unreadable_policy_is_server_error() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;

    std::fs::write(&app.policy_path, "p, alice, resource, read\nq, broken\n").unwrap();

    let response = app.request("GET", "/api/resource", Some(&token)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body,
        json!({"code": 0, "message": "error occurred when authorizing user", "data": null})
    );
}

#[tokio::test]
async fn test_missing_policy_file_is_server_error() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;

    std::fs::remove_file(&app.policy_path).unwrap();

    let response = app.request("GET", "/api/resource", Some(&token)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unauthenticated_request_never_reaches_enforcer() {
    let app = helpers::TestApp::new().await;
    std::fs::remove_file(&app.policy_path).unwrap();

    let response = app.request("GET", "/api/resource", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_store_and_sessions() {
    let app = helpers::TestApp::new().await;
    app.login("alice", "111").await;

    let response = app.request("GET", "/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.code(), 1);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["policy_store"], "file");
    assert_eq!(response.body["data"]["policy_store_reachable"], true);
    assert_eq!(response.body["data"]["active_sessions"], 1);
}

#[tokio::test]
async fn test_health_degraded_without_policy_file() {
    let app = helpers::TestApp::new().await;
    std::fs::remove_file(&app.policy_path).unwrap();

    let response = app.request("GET", "/health", None).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.code(), 0);
    assert_eq!(response.body["data"]["status"], "degraded");
}
