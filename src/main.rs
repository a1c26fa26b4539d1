//! Gatehouse Server: authentication and session lifecycle service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use gatehouse_api::{AppState, build_app};
use gatehouse_auth::{
    AuthRateLimiter, LedgerCleanup, LifecycleSettings, LogNotifier, SessionLifecycle, TokenCodec,
};
use gatehouse_core::config::AppConfig;
use gatehouse_core::error::AppError;
use gatehouse_database::{DatabasePool, PgIdentityRepository, PgRefreshTokenLedger};

#[tokio::main]
async fn main() {
    let env = std::env::var("GATEHOUSE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
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

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = DatabasePool::connect(&config.database).await?;

    let identities = Arc::new(PgIdentityRepository::new(db_pool.pool().clone()));
    let ledger = Arc::new(PgRefreshTokenLedger::new(db_pool.pool().clone()));

    // ── Step 2: Auth core ────────────────────────────────────────
    let codec = Arc::new(TokenCodec::from_config(&config.auth));
    let mut lifecycle = SessionLifecycle::new(
        identities,
        ledger.clone(),
        codec,
        LifecycleSettings::from_config(&config.auth),
    );
    if config.notification.enabled {
        lifecycle = lifecycle.with_notifier(Arc::new(LogNotifier::new()));
    } else {
        tracing::info!("Notification channel disabled; forgot-password is a no-op");
    }

    let rate_limiter = config
        .rate_limit
        .enabled
        .then(|| AuthRateLimiter::from_config(&config.rate_limit));

    // ── Step 3: Background cleanup ───────────────────────────────
    let mut cleanup = LedgerCleanup::new(
        ledger,
        Duration::from_secs(config.cleanup.interval_seconds),
    );
    if let Some(limiter) = &rate_limiter {
        cleanup = cleanup.with_rate_limiter(limiter.clone());
    }
    let cleanup_handle = cleanup.spawn();

    // ── Step 4: Build and start HTTP server ──────────────────────
    let mut state = AppState::new(
        Arc::new(lifecycle),
        Duration::from_secs(config.server.request_timeout_seconds),
    )
    .with_db_pool(db_pool.clone());
    if let Some(limiter) = rate_limiter {
        state = state.with_rate_limiter(limiter);
    }

    let app = build_app(state, &config.server.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "Gatehouse server listening");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    cleanup_handle.abort();
    db_pool
        .close_within(Duration::from_secs(config.server.shutdown_grace_seconds))
        .await;

    tracing::info!("Gatehouse server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
