//! Daemon initialization functions.
//!
//! Handles setting up logging, the desktop backend and the shutdown signals.

use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::desktop::{DesktopBackend, detect_backend};
use crate::events::{DaemonEvent, DaemonEventSender};

/// Initialize the tracing subscriber for logging.
pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // By default, only log from the wmbridge crate at info level
    // Users can override with RUST_LOG environment variable
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wmbridge=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Log config warnings; none of them stop the daemon.
pub fn report_config_warnings(config: &BridgeConfig) {
    for warning in crate::config::validate_config(config) {
        warn!(field = %warning.field, "{}", warning.message);
    }
}

/// Detect and return the desktop backend.
pub fn init_desktop(config: &BridgeConfig) -> DesktopBackend {
    let desktop = detect_backend(config);
    info!(backend = desktop.name(), "Desktop backend ready");
    desktop
}

/// Send [`DaemonEvent::Shutdown`] on SIGINT or SIGTERM.
pub fn spawn_shutdown_listener(event_tx: DaemonEventSender) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown requested");
        let _ = event_tx.send(DaemonEvent::Shutdown);
    });
}

async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}
