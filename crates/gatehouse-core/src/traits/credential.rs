//! Credential verification capability.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::Subject;

/// Validates a username/password pair and yields the subject it identifies.
///
/// Implementations return an error of kind `InvalidCredentials` when the pair
/// matches no account. Any other error kind is an infrastructure failure.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + std::fmt::Debug + 'static {
    /// Verify the pair.
    async fn verify(&self, username: &str, password: &str) -> AppResult<Subject>;
}
