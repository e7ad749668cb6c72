//! Authentication gate: binds the session cookie to a subject.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use tracing::debug;

use gatehouse_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Message returned when no live session backs the request.
pub const NOT_LOGGED_IN: &str = "user hasn't logged in yet";

/// Rejects requests without a live session cookie with `401`.
///
/// On success the resolved [`gatehouse_core::Subject`] is stored in the
/// request extensions for the authorization gate and handlers.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = jar
        .get(&state.config.session.cookie_name)
        .and_then(|cookie| state.sessions.lookup(cookie.value()));

    let Some(subject) = subject else {
        debug!(path = %request.uri().path(), "Request without a live session");
        return Err(AppError::unauthenticated(NOT_LOGGED_IN).into());
    };

    request.extensions_mut().insert(subject);
    Ok(next.run(request).await)
}
