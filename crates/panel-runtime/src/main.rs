//! # Panel Runtime
//!
//! Listens for the inspector agent and keeps one session alive per
//! connection.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics from the environment
//! 2. Load the panel configuration
//! 3. Bind the listener
//! 4. Run the supervisor until Ctrl+C

use anyhow::{Context, Result};
use inspector_telemetry::{init_telemetry, TelemetryConfig};
use panel_runtime::{PanelConfig, Supervisor};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = PanelConfig::from_env().context("Invalid panel configuration")?;
    info!(
        listen = %config.listen_addr,
        drain_mode = ?config.scheduler.drain_mode,
        starvation_bound = ?config.scheduler.starvation_bound,
        "Starting panel runtime"
    );

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervisor = tokio::spawn(Supervisor::new(config).run(listener, shutdown_rx));

    info!("Panel is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutting down");
    // The supervisor may already have exited on its own.
    let _ = shutdown_tx.send(true);
    supervisor
        .await
        .context("Supervisor task failed")?
        .context("Supervisor stopped with an error")?;

    Ok(())
}
