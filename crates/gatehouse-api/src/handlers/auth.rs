//! Auth handlers: login and logout.

use axum::Form;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;

use gatehouse_core::config::{LoginFailureStatus, SessionConfig};
use gatehouse_core::error::ErrorKind;
use gatehouse_core::types::RestResponse;

use crate::dto::request::LoginForm;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /user/login
///
/// On success the session token is set as an `HttpOnly` cookie scoped to
/// the configured path. Rejected credentials answer with a failure envelope
/// and the configured status.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    match state.login.login(&form.username, &form.password).await {
        Ok(outcome) => {
            let cookie = session_cookie(&state.config.session, outcome.token);
            let body = RestResponse::<()>::ok_empty(format!(
                "{} logged in successfully",
                outcome.subject
            ));
            Ok((jar.add(cookie), Json(body)).into_response())
        }
        Err(e) if e.kind == ErrorKind::InvalidCredentials => {
            let status = match state.config.auth.login_failure_status {
                LoginFailureStatus::Ok => StatusCode::OK,
                LoginFailureStatus::Unauthorized => StatusCode::UNAUTHORIZED,
            };
            Ok((status, Json(RestResponse::<()>::failure(e.message))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/logout
///
/// Idempotent: succeeds whether or not the cookie names a live session.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let config = &state.config.session;
    if let Some(cookie) = jar.get(&config.cookie_name) {
        state.login.logout(cookie.value());
    }

    let removal = Cookie::build((config.cookie_name.clone(), ""))
        .path(config.cookie_path.clone())
        .build();
    (
        jar.remove(removal),
        Json(RestResponse::<()>::ok_empty("logged out successfully")),
    )
}

fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    let max_age = i64::try_from(config.ttl_seconds).unwrap_or(i64::MAX);
    Cookie::build((config.cookie_name.clone(), token))
        .path(config.cookie_path.clone())
        .max_age(time::Duration::seconds(max_age))
        .http_only(true)
        .secure(config.secure_cookie)
        .build()
}
