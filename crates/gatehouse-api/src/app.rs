//! Application builder: wires router, middleware and state into an Axum app.

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use gatehouse_core::config::ServerConfig;
use gatehouse_core::error::{AppError, ErrorKind};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(request_logging))
}

/// Serve `app` on the configured address until `shutdown` flips to `true`.
///
/// After the signal no new connections are accepted and the future resolves
/// once in-flight requests have finished.
pub async fn serve(
    app: Router,
    config: &ServerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Initialization,
            format!("Failed to bind {addr}: {e}"),
            e,
        )
    })?;
    info!(address = %addr, "Gatehouse listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            info!("Shutting down HTTP server");
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, format!("Server error: {e}"), e))
}
