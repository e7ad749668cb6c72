//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use gatehouse_core::types::RestResponse;

use crate::dto::response::HealthReport;
use crate::state::AppState;

/// GET /health
///
/// `503` when the policy store does not answer within the load timeout.
pub async fn health(
    State(state): State<AppState>,
) -> (StatusCode, Json<RestResponse<HealthReport>>) {
    let store = state.enforcer.store();
    let timeout = state.config.policy.load_timeout();

    let reachable = match tokio::time::timeout(timeout, store.health_check()).await {
        Ok(Ok(healthy)) => healthy,
        Ok(Err(e)) => {
            warn!(store = store.backend(), error = %e, "Policy store health check failed");
            false
        }
        Err(_) => {
            warn!(store = store.backend(), "Policy store health check timed out");
            false
        }
    };

    let report = HealthReport {
        status: if reachable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        policy_store: store.backend(),
        policy_store_reachable: reachable,
        active_sessions: state.sessions.len(),
    };

    if reachable {
        (StatusCode::OK, Json(RestResponse::ok("healthy", report)))
    } else {
        let mut body = RestResponse::ok("policy store unreachable", report);
        body.code = gatehouse_core::types::response::CODE_FAILURE;
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}
