//! Response DTOs.

use serde::Serialize;

/// Payload of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// `"ok"` or `"degraded"`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Policy store variant in use.
    pub policy_store: &'static str,
    /// Whether the policy store answered its health check.
    pub policy_store_reachable: bool,
    /// Number of live sessions.
    pub active_sessions: usize,
}
