//! Desktop backend detection logic.

use std::sync::Arc;

use tracing::{info, warn};

use super::hyprland::HyprlandSession;
use super::noop::NoopDesktop;
use super::{DesktopSession, WorkspaceManager};
use crate::config::{BackendKind, BridgeConfig};

/// The desktop collaborators the bridge runs against.
#[derive(Clone)]
pub struct DesktopBackend {
    pub session: Arc<dyn DesktopSession>,
    pub workspaces: Arc<dyn WorkspaceManager>,
}

impl DesktopBackend {
    /// Use one object for both the session and the workspace manager.
    pub fn from_shared<D>(desktop: D) -> Self
    where
        D: DesktopSession + WorkspaceManager + 'static,
    {
        let desktop = Arc::new(desktop);
        Self {
            session: desktop.clone(),
            workspaces: desktop,
        }
    }

    pub fn name(&self) -> &'static str {
        self.session.name()
    }
}

/// Detect and create the desktop backend.
///
/// With `backend = "auto"` the order is:
/// 1. Hyprland (via HYPRLAND_INSTANCE_SIGNATURE env var)
/// 2. Fallback to NoopDesktop
///
/// The no-op fallback keeps the bus surface reachable (with empty results)
/// on compositors that are not supported.
pub fn detect_backend(config: &BridgeConfig) -> DesktopBackend {
    match config.backend {
        BackendKind::Noop => {
            info!("Using no-op desktop backend");
            DesktopBackend::from_shared(NoopDesktop::new())
        }
        BackendKind::Hyprland | BackendKind::Auto => {
            if let Some(session) = HyprlandSession::new(&config.minimized_workspace) {
                info!("Detected Hyprland compositor");
                return DesktopBackend::from_shared(session);
            }

            if config.backend == BackendKind::Hyprland {
                warn!("Hyprland backend requested but no Hyprland instance found");
            }
            warn!("No supported compositor detected, window management disabled");
            DesktopBackend::from_shared(NoopDesktop::new())
        }
    }
}
