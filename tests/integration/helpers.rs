//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use gatehouse_api::{AppState, build_app};
use gatehouse_auth::{LoginFlow, SessionStore, StaticCredentialVerifier};
use gatehouse_core::config::{AppConfig, LoginFailureStatus, ReloadMode};
use gatehouse_policy::model::DEFAULT_MODEL;
use gatehouse_policy::{PolicyEnforcer, PolicyStoreManager};

/// Rule set most tests start from: alice may read, bob writes through a role.
pub const BASE_POLICY: &str = "\
p, alice, resource, read
p, writer, resource, read
p, writer, resource, write
g, bob, writer
";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config
    pub config: AppConfig,
    /// Session store behind the router
    pub sessions: Arc<SessionStore>,
    /// Enforcer behind the router
    pub enforcer: Arc<PolicyEnforcer>,
    /// Flat policy file the store reads
    pub policy_path: PathBuf,
    _dir: TempDir,
}

/// Knobs for [`TestApp`].
pub struct TestAppBuilder {
    policy: String,
    reload: ReloadMode,
    login_failure_status: LoginFailureStatus,
    ttl_seconds: u64,
}

impl TestAppBuilder {
    /// Initial policy file contents.
    pub fn policy(mut self, policy: &str) -> Self {
        self.policy = policy.to_string();
        self
    }

    /// Snapshot refresh strategy.
    pub fn reload(mut self, reload: ReloadMode) -> Self {
        self.reload = reload;
        self
    }

    /// Status for rejected logins.
    pub fn login_failure_status(mut self, status: LoginFailureStatus) -> Self {
        self.login_failure_status = status;
        self
    }

    /// Session TTL.
    pub fn ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Wire every component the way the server binary does.
    pub async fn build(self) -> TestApp {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let model_path = dir.path().join("rbac_model.conf");
        let policy_path = dir.path().join("policy.csv");
        std::fs::write(&model_path, DEFAULT_MODEL).expect("Failed to write model");
        std::fs::write(&policy_path, &self.policy).expect("Failed to write policy");

        let mut config = AppConfig::default();
        config.policy.model_path = model_path.display().to_string();
        config.policy.file_path = policy_path.display().to_string();
        config.policy.reload = self.reload;
        config.session.ttl_seconds = self.ttl_seconds;
        config.auth.login_failure_status = self.login_failure_status;
        config.validate().expect("Invalid test config");

        let store = PolicyStoreManager::new(&config.policy, None)
            .await
            .expect("Failed to open policy store");
        let enforcer = Arc::new(
            PolicyEnforcer::from_config(&config.policy, Arc::new(store))
                .expect("Failed to build enforcer"),
        );

        let sessions = Arc::new(SessionStore::from_config(&config.session));
        let verifier = Arc::new(StaticCredentialVerifier::from_config(&config.auth));
        let login = Arc::new(LoginFlow::new(verifier, Arc::clone(&sessions)));

        let state = AppState::new(Arc::new(config.clone()), login, Arc::clone(&enforcer));

        TestApp {
            router: build_app(state),
            config,
            sessions,
            enforcer,
            policy_path,
            _dir: dir,
        }
    }
}

impl TestApp {
    /// Create a new test application with default settings
    pub async fn new() -> Self {
        Self::builder().build().await
    }

    /// Start customizing a test application
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            policy: BASE_POLICY.to_string(),
            reload: ReloadMode::PerRequest,
            login_failure_status: LoginFailureStatus::Ok,
            ttl_seconds: 1800,
        }
    }

    /// Append one line to the policy file, bypassing the enforcer.
    pub fn append_policy_line(&self, line: &str) {
        let mut contents =
            std::fs::read_to_string(&self.policy_path).expect("Failed to read policy");
        contents.push_str(line);
        contents.push('\n');
        std::fs::write(&self.policy_path, contents).expect("Failed to write policy");
    }

    /// POST the login form
    pub async fn login_request(&self, username: &str, password: &str) -> TestResponse {
        self.login_form(&format!("username={username}&password={password}"))
            .await
    }

    /// POST a raw urlencoded body to the login route
    pub async fn login_form(&self, body: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri("/user/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Login and return the session token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.login_request(username, password).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        response.session_token().expect("No session cookie in login response")
    }

    /// Make an HTTP request to the test app, optionally carrying a session cookie
    pub async fn request(&self, method: &str, path: &str, token: Option<&str>) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            req = req.header(
                header::COOKIE,
                format!("{}={}", self.config.session.cookie_name, token),
            );
        }

        let req = req.body(Body::empty()).expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            set_cookie,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
    /// Raw `Set-Cookie` header, if any
    pub set_cookie: Option<String>,
}

impl TestResponse {
    /// Token carried by the `current_subject` cookie
    pub fn session_token(&self) -> Option<String> {
        let cookie = self.set_cookie.as_deref()?;
        let pair = cookie.split(';').next()?;
        let token = pair.trim().strip_prefix("current_subject=")?;
        (!token.is_empty()).then(|| token.to_string())
    }

    /// Envelope `code`
    pub fn code(&self) -> i64 {
        self.body["code"].as_i64().expect("No code in body")
    }

    /// Envelope `message`
    pub fn message(&self) -> &str {
        self.body["message"].as_str().expect("No message in body")
    }
}
