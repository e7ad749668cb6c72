//! Request DTOs.

use serde::Deserialize;

/// `application/x-www-form-urlencoded` login form.
///
/// Missing fields read as empty strings and fail credential verification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    /// Account name.
    #[serde(default)]
    pub username: String,
    /// Account password.
    #[serde(default)]
    pub password: String,
}
