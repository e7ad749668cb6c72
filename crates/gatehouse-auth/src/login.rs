//! Login and logout flows.

use std::sync::Arc;

use tracing::{info, warn};

use gatehouse_core::error::ErrorKind;
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::CredentialVerifier;
use gatehouse_core::types::Subject;

use crate::session::SessionStore;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Token of the new session.
    pub token: String,
    /// The authenticated subject.
    pub subject: Subject,
    /// Token of the session that was forced out, if any.
    pub replaced: Option<String>,
}

/// Verifies credentials and issues sessions.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    verifier: Arc<dyn CredentialVerifier>,
    sessions: Arc<SessionStore>,
}

impl LoginFlow {
    /// Creates a new login flow.
    pub fn new(verifier: Arc<dyn CredentialVerifier>, sessions: Arc<SessionStore>) -> Self {
        Self { verifier, sessions }
    }

    /// The session store sessions are issued into.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Verify `username`/`password` and issue a session.
    ///
    /// A previous session of the same subject is invalidated in the same
    /// step the new one is created.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let subject = match self.verifier.verify(username, password).await {
            Ok(subject) => subject,
            Err(e) => {
                if e.kind == ErrorKind::InvalidCredentials {
                    warn!(username = %username, "Login rejected");
                }
                return Err(e);
            }
        };

        let issued = self.sessions.issue(&subject);
        if issued.evicted.is_some() {
            info!(subject = %subject, "Forced previous session of {subject} to log out");
        }
        info!(subject = %subject, "{subject} has logged in");

        Ok(LoginOutcome {
            token: issued.token,
            subject,
            replaced: issued.evicted,
        })
    }

    /// Invalidate the session behind `token`. Idempotent.
    pub fn logout(&self, token: &str) -> Option<Subject> {
        let subject = self.sessions.invalidate(token);
        if let Some(subject) = &subject {
            info!(subject = %subject, "{subject} has logged out");
        }
        subject
    }
}
