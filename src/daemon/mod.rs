//! Daemon module for wmbridge.
//!
//! The daemon is the main process that stays running: it publishes the
//! bridge on the session bus and serves calls until SIGINT or SIGTERM.

mod event_handler;
mod init;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::bridge::{Bridge, ZbusTransport};
use crate::config::BridgeConfig;
use crate::events::create_daemon_channel;
use crate::process::SystemLauncher;

pub use init::init_logging;

/// Run the bridge daemon.
///
/// This is the main entry point when no subcommand is provided.
/// It loads the config, detects the desktop and runs the control loop on a
/// single-threaded runtime.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    init::init_logging();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting wmbridge daemon"
    );

    let config = crate::config::load_config(config_path);
    init::report_config_warnings(&config);

    // Capture the full session environment early
    crate::desktop::env::capture_session_environment();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build the async runtime")?;

    runtime.block_on(serve(config));
    info!("wmbridge daemon stopped");
    Ok(())
}

async fn serve(config: BridgeConfig) {
    // Create unified event channel
    let (event_tx, event_rx) = create_daemon_channel();

    let desktop = init::init_desktop(&config);
    let launcher = Arc::new(SystemLauncher::new(config.shell.clone()));
    let transport = ZbusTransport::new(event_tx.clone());
    let mut bridge = Bridge::new(desktop, launcher, transport, &config);

    init::spawn_shutdown_listener(event_tx.clone());
    bridge.enable(&event_tx);

    event_handler::run_event_loop(&mut bridge, event_rx).await;
}
