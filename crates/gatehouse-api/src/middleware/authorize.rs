//! Authorization gate: one policy decision per guarded route.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info};

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::types::Subject;
use gatehouse_policy::PolicyEnforcer;

use crate::error::ApiError;
use crate::middleware::authenticate::NOT_LOGGED_IN;

/// Message returned when the enforcer denies the request.
pub const FORBIDDEN: &str = "forbidden";
/// Message returned when the enforcer could not reach a decision.
pub const AUTHORIZATION_FAILED: &str = "error occurred when authorizing user";

/// The `(object, action)` pair a route is guarded by.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    enforcer: Arc<PolicyEnforcer>,
    object: &'static str,
    action: &'static str,
}

impl RouteGuard {
    /// Guard a route with `(object, action)`.
    pub fn new(enforcer: Arc<PolicyEnforcer>, object: &'static str, action: &'static str) -> Self {
        Self {
            enforcer,
            object,
            action,
        }
    }
}

/// Asks the enforcer whether the authenticated subject may perform the
/// route's action on its object.
///
/// Must run after [`crate::middleware::authenticate`]. Deny is `403`; an
/// enforcer failure is `500` and never falls through to the handler.
pub async fn authorize(
    State(guard): State<RouteGuard>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(subject) = request.extensions().get::<Subject>().cloned() else {
        return Err(AppError::unauthenticated(NOT_LOGGED_IN).into());
    };

    match guard
        .enforcer
        .enforce(subject.as_str(), guard.object, guard.action)
        .await
    {
        Ok(true) => Ok(next.run(request).await),
        Ok(false) => {
            info!(
                subject = %subject,
                object = guard.object,
                action = guard.action,
                "Access denied"
            );
            Err(AppError::forbidden(FORBIDDEN).into())
        }
        Err(e) => {
            error!(
                subject = %subject,
                object = guard.object,
                action = guard.action,
                error = %e,
                "Policy enforcement failed"
            );
            Err(AppError::with_source(ErrorKind::Enforcement, AUTHORIZATION_FAILED, e).into())
        }
    }
}
