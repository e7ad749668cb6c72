//! Login configuration.

use serde::{Deserialize, Serialize};

/// A known account for the static credential verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Login name; becomes the session subject.
    pub username: String,
    /// Plaintext password compared by exact match.
    pub password: String,
}

/// Status returned by the login endpoint when credentials are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFailureStatus {
    /// `200 OK` with a failure envelope (`code = 0`).
    #[default]
    Ok,
    /// `401 Unauthorized` with a failure envelope.
    Unauthorized,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Accounts accepted by the static credential verifier.
    #[serde(default = "default_accounts")]
    pub accounts: Vec<AccountConfig>,
    /// Status used for rejected logins.
    #[serde(default)]
    pub login_failure_status: LoginFailureStatus,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            login_failure_status: LoginFailureStatus::default(),
        }
    }
}

fn default_accounts() -> Vec<AccountConfig> {
    vec![
        AccountConfig {
            username: "alice".to_string(),
            password: "111".to_string(),
        },
        AccountConfig {
            username: "bob".to_string(),
            password: "123".to_string(),
        },
    ]
}
