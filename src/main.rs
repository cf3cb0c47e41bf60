// =============================================================================
// Stockcast Backend - Main Entry Point
// =============================================================================
//
// Serves technical indicators for uploaded price files and forwards each file
// to the remote prediction service in the background. Clients poll for the
// prediction by ticker.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod indicators;
mod ingest;
mod prediction;
mod runtime_config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "backend_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    if config.ml_backend_url.is_none() {
        warn!("ML_BACKEND is not set - every prediction job will fail");
    }

    info!(
        bind_addr = %config.bind_addr,
        ml_backend = ?config.ml_backend_url,
        workers = config.prediction_workers,
        queue_capacity = config.prediction_queue_capacity,
        timeout_secs = config.prediction_timeout_secs,
        "Stockcast backend starting"
    );

    // ── 2. Build shared state (spawns prediction workers) ────────────────
    let state = Arc::new(AppState::new(config)?);

    // ── 3. Serve the API until Ctrl+C ────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {}", state.config.bind_addr))?;
    info!(addr = %state.config.bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received - stopping gracefully");
        })
        .await
        .context("API server failed")?;

    // ── 4. Stop accepting prediction jobs ────────────────────────────────
    state.dispatcher.close();
    info!(
        unconsumed_results = state.results.len(),
        "Stockcast backend shut down complete."
    );
    Ok(())
}
