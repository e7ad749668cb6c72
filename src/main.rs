//! Gatehouse Server: session authentication and policy-guarded routes.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use gatehouse_api::{AppState, build_app};
use gatehouse_auth::{LoginFlow, SessionCleanup, SessionStore, StaticCredentialVerifier};
use gatehouse_core::config::AppConfig;
use gatehouse_core::error::AppError;
use gatehouse_policy::{PolicyEnforcer, PolicyStoreManager};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(kind = %e.kind, "Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("GATEHOUSE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Gatehouse v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Policy store + enforcer ──────────────────────────
    tracing::info!("Initializing policy store (variant: {})...", config.policy.store);
    let store = PolicyStoreManager::new(&config.policy, config.database.as_ref()).await?;
    let enforcer = Arc::new(PolicyEnforcer::from_config(&config.policy, Arc::new(store))?);

    // ── Step 2: Sessions + login ─────────────────────────────────
    let sessions = Arc::new(SessionStore::from_config(&config.session));
    let verifier = Arc::new(StaticCredentialVerifier::from_config(&config.auth));
    let login = Arc::new(LoginFlow::new(verifier, Arc::clone(&sessions)));
    tracing::info!(
        ttl_seconds = config.session.ttl_seconds,
        accounts = config.auth.accounts.len(),
        "Session store initialized"
    );

    // ── Step 3: Background session reaper ────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = SessionCleanup::new(Arc::clone(&sessions), config.session.cleanup_interval())
        .spawn(shutdown_rx.clone());

    // ── Step 4: HTTP server ──────────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let server_config = config.server.clone();
    let state = AppState::new(Arc::new(config), login, enforcer);
    let app = build_app(state);

    let mut server = tokio::spawn(async move {
        gatehouse_api::serve(app, &server_config, shutdown_rx).await
    });

    let early_exit = tokio::select! {
        joined = &mut server => Some(joined),
        _ = shutdown_signal() => None,
    };

    let _ = shutdown_tx.send(true);

    let result = match early_exit {
        // The server stopped on its own, typically a bind failure.
        Some(joined) => flatten(joined),
        None => {
            tracing::info!("Shutdown signal received, draining connections...");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(joined) => flatten(joined),
                Err(_) => {
                    tracing::warn!(
                        grace_seconds = grace.as_secs(),
                        "In-flight requests did not finish in time, aborting"
                    );
                    server.abort();
                    Ok(())
                }
            }
        }
    };

    if let Err(e) = reaper.await {
        tracing::warn!("Session reaper task failed: {}", e);
    }

    tracing::info!("Gatehouse stopped");
    result
}

fn flatten(
    joined: Result<Result<(), AppError>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    joined.map_err(|e| AppError::internal(format!("Server task failed: {e}")))?
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
