//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use gatehouse_auth::login::LoginFlow;
use gatehouse_auth::session::SessionStore;
use gatehouse_core::config::AppConfig;
use gatehouse_policy::PolicyEnforcer;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Live sessions
    pub sessions: Arc<SessionStore>,
    /// Credential check + session issue
    pub login: Arc<LoginFlow>,
    /// Policy decisions for guarded routes
    pub enforcer: Arc<PolicyEnforcer>,
}

impl AppState {
    /// Build state around an existing login flow and enforcer.
    pub fn new(config: Arc<AppConfig>, login: Arc<LoginFlow>, enforcer: Arc<PolicyEnforcer>) -> Self {
        Self {
            config,
            sessions: Arc::clone(login.sessions()),
            login,
            enforcer,
        }
    }
}
