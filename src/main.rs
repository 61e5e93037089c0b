//! seeder-control server entry point.
//!
//! Opens the hardware backend, starts the seed monitor and serves the
//! line protocol until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use seeder_control::app_state::AppState;
use seeder_control::config::ServerConfig;
use seeder_control::service::SensorMonitor;
use seeder_control::{hardware, logging, net};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("loading configuration")?;
    logging::init(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.backend,
        poll_ms = config.poll_interval.as_millis(),
        "starting seeder-control"
    );

    let hardware = hardware::open(config.backend, &config.pins).context("opening hardware")?;
    let state = AppState::new(hardware.actuator, config.initial_duty_cycle)
        .context("initialising motor")?;

    let monitor = SensorMonitor::new(
        hardware.sensor,
        Arc::clone(&state.seed_level),
        Arc::clone(&state.connections),
        config.poll_interval,
        config.error_backoff,
    );
    // First reading before any client can connect.
    match monitor.poll() {
        Ok(Some(status)) => tracing::info!(%status, "initial seed status"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "initial seed read failed"),
    }
    let _monitor = monitor.spawn_supervised();

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;

    net::serve(listener, state, net::shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}
