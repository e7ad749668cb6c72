//! Route definitions for the Gatehouse HTTP API.
//!
//! Protected routes are mounted under `/api`, the path the session cookie is
//! scoped to. Login and health live outside it.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware::{self, RouteGuard};
use crate::state::AppState;

/// Object name of the protected sample resource.
pub const RESOURCE_OBJECT: &str = "resource";

/// Build the Axum router with every route and its gates.
///
/// Each guarded route is wrapped by the authentication gate first and its
/// own authorization gate second.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(&state))
        .merge(user_routes())
        .merge(health_routes())
        .with_state(state)
}

/// Routes behind the session cookie.
fn api_routes(state: &AppState) -> Router<AppState> {
    let read_guard = RouteGuard::new(state.enforcer.clone(), RESOURCE_OBJECT, "read");
    let write_guard = RouteGuard::new(state.enforcer.clone(), RESOURCE_OBJECT, "write");

    let resource = get(handlers::resource::read_resource)
        .route_layer(axum_middleware::from_fn_with_state(
            read_guard,
            middleware::authorize,
        ))
        .merge(
            post(handlers::resource::write_resource).route_layer(
                axum_middleware::from_fn_with_state(write_guard, middleware::authorize),
            ),
        );

    Router::new()
        .route("/resource", resource)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ))
        // Logout must work without a live session, so it sits outside the gate.
        .route("/logout", post(handlers::auth::logout))
}

/// Login endpoint.
fn user_routes() -> Router<AppState> {
    Router::new().route("/user/login", post(handlers::auth::login))
}

/// Liveness and store reachability.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
