//! SubSync Daemon - Main Entry Point
//! Transfer engine + job reaper behind a JSON-RPC server

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use settings::DaemonSettings;
use subsync_api_rpc::{RpcHandler, RpcServer};
use subsync_core::application::{
    shutdown_channel, JobReaper, ProviderRegistry, TransferEngine,
};
use subsync_core::port::id_provider::UuidProvider;
use subsync_core::port::time_provider::SystemTimeProvider;
use subsync_infra_memory::{
    InMemoryPendingAuthStore, InMemorySessionStore, InMemoryTransferJobRepository,
};
use subsync_infra_platforms::{register_enabled, PlatformsConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let settings = DaemonSettings::from_env()?;
    let platforms = PlatformsConfig::from_env().context("Failed to read platform credentials")?;

    // 2. Initialize logging
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("subsync=info"))
        .context("Failed to create env filter")?;
    let (otel, otel_error) = match telemetry::layer() {
        Ok(layer) => (layer, None),
        Err(e) => (None, Some(e)),
    };

    match settings.log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("SubSync daemon v{} starting...", VERSION);
    if let Some(e) = otel_error {
        warn!(error = %e, "OpenTelemetry disabled (continuing without it)");
    }

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let job_repo = Arc::new(InMemoryTransferJobRepository::new());

    let mut registry = ProviderRegistry::new();
    register_enabled(&mut registry, &platforms);
    if registry.list_available().is_empty() {
        warn!("No platform credentials configured; transfers will be rejected");
    }

    let engine = Arc::new(TransferEngine::new(
        Arc::new(registry),
        job_repo.clone(),
        id_provider.clone(),
        time_provider.clone(),
        settings.rate_limits.clone(),
    ));

    let sessions = Arc::new(InMemorySessionStore::new(
        id_provider.clone(),
        time_provider.clone(),
    ));
    let pending = Arc::new(InMemoryPendingAuthStore::new(
        time_provider.clone(),
        InMemoryPendingAuthStore::DEFAULT_TTL,
    ));

    // 4. Start JSON-RPC server
    let handler = RpcHandler::new(engine, sessions.clone(), pending, time_provider.clone());
    let (addr, rpc_handle) = RpcServer::new(settings.rpc.clone(), handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 5. Start job & session reaper
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let reaper = JobReaper::new(job_repo, time_provider, settings.reaper)
        .with_sessions(sessions, settings.session_ttl);
    let reaper_handle = tokio::spawn(reaper.run(shutdown_rx));

    info!(addr = %addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown (in-flight transfers are dropped with the process)
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), reaper_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
