//! Credential verification against the configured account table.

use std::collections::HashMap;

use async_trait::async_trait;

use gatehouse_core::config::AuthConfig;
use gatehouse_core::error::AppError;
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::CredentialVerifier;
use gatehouse_core::types::Subject;

/// Message returned for any rejected username/password pair.
pub const NO_SUCH_ACCOUNT: &str = "no such account";

/// Exact-match verifier over a fixed set of accounts.
///
/// Passwords are compared as given. Swap in another [`CredentialVerifier`]
/// to back logins with hashed credentials.
#[derive(Clone)]
pub struct StaticCredentialVerifier {
    accounts: HashMap<String, String>,
}

impl std::fmt::Debug for StaticCredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialVerifier")
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

impl StaticCredentialVerifier {
    /// Build a verifier from `(username, password)` pairs.
    pub fn new<I, U, P>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            accounts: accounts
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    /// Build a verifier from the configured accounts.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config
                .accounts
                .iter()
                .map(|a| (a.username.clone(), a.password.clone())),
        )
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, username: &str, password: &str) -> AppResult<Subject> {
        match self.accounts.get(username) {
            Some(expected) if expected == password => Ok(Subject::new(username)),
            _ => Err(AppError::invalid_credentials(NO_SUCH_ACCOUNT)),
        }
    }
}
