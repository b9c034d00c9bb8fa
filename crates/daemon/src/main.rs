//! Homewatch - Main Entry Point
//! Home network monitor: alerts, plug power-cycling, latency metrics, page checks

mod app;
mod config;
mod logging;

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, info, warn};

use app::Monitors;
use config::{config_path, Settings};
use homewatch_api_http::{StatusServer, StatusServerConfig};
use homewatch_core::application::shutdown_channel;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (guard flushes the file writer on exit)
    let _log_guard = logging::init();
    logging::install_panic_hook();

    info!("Homewatch v{} starting...", VERSION);

    // 2. Load and validate configuration (any failure is fatal here)
    let path = config_path();
    info!(path = %path.display(), "Loading configuration...");
    let settings = Settings::load(&path).context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;

    let enabled = settings.enabled_monitors();
    if enabled.is_empty() {
        warn!("No monitor section configured; only the status endpoint will run");
    }
    if settings.contacts.is_empty() {
        warn!("No contacts configured; alerts will not be delivered to anyone");
    }

    // 3. Setup dependencies (DI wiring)
    let monitors = Monitors::build(&settings)?;

    // 4. Bind the status endpoint before anything starts polling
    let server = StatusServer::bind(&StatusServerConfig::with_port(settings.port))
        .await
        .context("Status server start failed")?;

    // 5. Start monitors and the status server
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let mut handles = monitors.spawn(&shutdown_tx);
    handles.push(tokio::spawn(async move {
        if let Err(e) = server.serve(shutdown_rx).await {
            error!(error = %e, "Status server failed");
        }
    }));

    info!(monitors = ?enabled, "System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown: in-flight cycles finish, idle tasks stop at once
    shutdown_tx.shutdown();
    let all = wait_for_tasks(handles);
    if tokio::time::timeout(SHUTDOWN_GRACE, all).await.is_err() {
        warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Some tasks did not stop in time"
        );
    }

    info!("Shutdown complete.");
    Ok(())
}

async fn wait_for_tasks(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Task ended abnormally");
        }
    }
}
