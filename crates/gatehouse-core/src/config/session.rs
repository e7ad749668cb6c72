//! Session cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session cache and cookie transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session time-to-live in seconds, measured from creation.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Path prefix the cookie is scoped to.
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    /// Whether the cookie is marked `Secure`.
    #[serde(default)]
    pub secure_cookie: bool,
    /// Interval between eager sweeps of expired sessions, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            cookie_name: default_cookie_name(),
            cookie_path: default_cookie_path(),
            secure_cookie: false,
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl SessionConfig {
    /// The session TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// The reaper interval as a `Duration` (never zero).
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

fn default_ttl() -> u64 {
    30 * 60
}

fn default_cookie_name() -> String {
    "current_subject".to_string()
}

fn default_cookie_path() -> String {
    "/api".to_string()
}

fn default_cleanup_interval() -> u64 {
    60
}
