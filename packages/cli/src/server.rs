// ABOUTME: Server lifecycle: database, signing keys, router, and graceful shutdown
// ABOUTME: Startup fails fast when the store or the identity provider's keys are unavailable

use anyhow::{bail, Context};
use tokio::net::TcpListener;
use tracing::{info, warn};

use slips_api::{create_router, AppState};
use slips_auth::{fetch_jwks, DetachedTasks, JwtVerifier, KeySet};
use slips_storage::{connect, DatabaseOptions};

use crate::config::Config;

/// Fetch the identity provider's signing keys once
pub async fn load_verifier(config: &Config) -> anyhow::Result<JwtVerifier> {
    let client = reqwest::Client::new();
    let jwks = fetch_jwks(&client, &config.jwks_url)
        .await
        .with_context(|| format!("Failed to fetch JWKS from {}", config.jwks_url))?;

    let keys = KeySet::from_jwks(&jwks).context("Failed to load signing keys")?;
    if keys.is_empty() {
        bail!("JWKS at {} contains no usable RSA signing keys", config.jwks_url);
    }

    info!(keys = keys.len(), "Loaded signing keys");
    Ok(JwtVerifier::new(keys, config.expected_issuer.clone()))
}

/// Run until Ctrl-C or SIGTERM, then drain background work
pub async fn run(config: Config) -> anyhow::Result<()> {
    let pool = connect(
        &DatabaseOptions::new(config.database_url.clone())
            .max_connections(config.database_max_connections),
    )
    .await
    .context("Failed to open database")?;

    let verifier = load_verifier(&config).await?;

    let detached = DetachedTasks::new();
    let state = AppState::new(pool.clone(), verifier, detached.clone());
    let app = create_router(state, config.request_timeout);

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if !detached.shutdown(config.shutdown_grace).await {
        warn!("Some background tasks were aborted during shutdown");
    }
    pool.close().await;
    info!("Server stopped");

    Ok(())
}

/// Apply migrations and exit
pub async fn migrate(config: &Config) -> anyhow::Result<()> {
    let pool = connect(&DatabaseOptions::new(config.database_url.clone()))
        .await
        .context("Failed to migrate database")?;
    pool.close().await;
    info!("Database is up to date");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}
