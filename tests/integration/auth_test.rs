//! Integration tests for login, logout and the authentication gate.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use gatehouse_core::config::LoginFailureStatus;
use gatehouse_core::types::Subject;

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = helpers::TestApp::new().await;

    let response = app.login_request("alice", "111").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.code(), 1);
    assert_eq!(response.message(), "alice logged in successfully");

    let cookie = response.set_cookie.clone().expect("No Set-Cookie header");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/api"));
    assert!(cookie.contains("Max-Age=1800"));

    let token = response.session_token().unwrap();
    assert_eq!(app.sessions.lookup(&token), Some(Subject::from("alice")));
}

#[tokio::test]
async fn test_second_login_invalidates_first_token() {
    let app = helpers::TestApp::new().await;

    let first = app.login("alice", "111").await;
    let second = app.login("alice", "111").await;
    assert_ne!(first, second);

    let stale = app.request("GET", "/api/resource", Some(&first)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.message(), "user hasn't logged in yet");

    let live = app.request("GET", "/api/resource", Some(&second)).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(app.sessions.len(), 1);
}

#[tokio::test]
async fn test_login_with_missing_fields_is_rejected_as_bad_credentials() {
    let app = helpers::TestApp::new().await;

    for body in ["username=alice", "password=111", ""] {
        let response = app.login_form(body).await;

        assert_eq!(response.status, StatusCode::OK, "body {body:?}");
        assert_eq!(response.code(), 0);
        assert_eq!(response.message(), "no such account");
        assert!(response.session_token().is_none());
    }
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = helpers::TestApp::new().await;

    let response = app.login_request("alice", "wrong").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.code(), 0);
    assert_eq!(response.message(), "no such account");
    assert!(response.set_cookie.is_none());
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_login_nonexistent_user_unauthorized_status() {
    let app = helpers::TestApp::builder()
        .login_failure_status(LoginFailureStatus::Unauthorized)
        .build()
        .await;

    let response = app.login_request("nobody", "111").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.code(), 0);
    assert_eq!(response.message(), "no such account");
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;

    app.login_request("alice", "nope").await;

    let response = app.request("GET", "/api/resource", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_cookie_is_unauthenticated() {
    let app = helpers::TestApp::new().await;

    for method in ["GET", "POST"] {
        let response = app.request(method, "/api/resource", None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method}");
        assert_eq!(response.code(), 0);
        assert_eq!(response.message(), "user hasn't logged in yet");
    }
}

#[tokio::test]
async fn test_unknown_token_is_unauthenticated() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/resource", Some("not-a-session"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = helpers::TestApp::new().await;
    let token = app.login("alice", "111").await;

    let response = app.request("POST", "/api/logout", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.code(), 1);
    let cleared = response.set_cookie.expect("Logout should clear the cookie");
    assert!(cleared.starts_with("current_subject="));
    assert!(cleared.contains("Max-Age=0"));

    let after = app.request("GET", "/api/resource", Some(&token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = helpers::TestApp::new().await;
    let token = app.login("bob", "123").await;

    let first = app.request("POST", "/api/logout", Some(&token)).await;
    let second = app.request("POST", "/api/logout", Some(&token)).await;
    let anonymous = app.request("POST", "/api/logout", None).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(anonymous.status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_session_expires_after_ttl() {
    let app = helpers::TestApp::builder().ttl_seconds(60).build().await;
    let token = app.login("alice", "111").await;

    tokio::time::advance(Duration::from_secs(59)).await;
    let fresh = app.request("GET", "/api/resource", Some(&token)).await;
    assert_eq!(fresh.status, StatusCode::OK);

    tokio::time::advance(Duration::from_secs(1)).await;
    let expired = app.request("GET", "/api/resource", Some(&token)).await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired.message(), "user hasn't logged in yet");
}

#[tokio::test]
async fn test_distinct_subjects_keep_their_sessions() {
    let app = helpers::TestApp::new().await;

    let (alice, bob) = tokio::join!(app.login("alice", "111"), app.login("bob", "123"));

    assert_eq!(app.sessions.lookup(&alice), Some(Subject::from("alice")));
    assert_eq!(app.sessions.lookup(&bob), Some(Subject::from("bob")));
    assert_eq!(
        app.request("GET", "/api/resource", Some(&alice)).await.status,
        StatusCode::OK
    );
    assert_eq!(
        app.request("GET", "/api/resource", Some(&bob)).await.status,
        StatusCode::OK
    );
}
