//! Lifecycle of the published bridge.
//!
//! ```text
//! Disabled --enable()--> Acquiring --Connected + export--> Active
//!     ^                      |                               |
//!     +------disable()-------+---------------disable()-------+
//! ```
//!
//! "Enabled" and "exported" are distinct moments: subscriptions go live in
//! `enable()`, the object is exported later when the bus connection is up.

use tracing::{debug, error, info, warn};

use super::accessor::Accessor;
use super::notifier::{ChangeNotifier, windows_changed_payload};
use super::transport::{BusEvent, OwnerId, Transport};
use crate::desktop::DesktopSession;
use crate::events::DaemonEventSender;

/// Lifecycle state of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Disabled,
    /// Name ownership requested, export pending
    Acquiring,
    /// Exported, subscriptions live
    Active,
}

/// The published bridge: name registration, export and subscriptions.
pub struct BridgeSession<T: Transport> {
    transport: T,
    bus_name: String,
    object_path: String,
    state: BridgeState,
    owner: Option<OwnerId>,
    exported: bool,
    notifier: ChangeNotifier,
}

impl<T: Transport> BridgeSession<T> {
    pub fn new(transport: T, bus_name: impl Into<String>, object_path: impl Into<String>) -> Self {
        Self {
            transport,
            bus_name: bus_name.into(),
            object_path: object_path.into(),
            state: BridgeState::Disabled,
            owner: None,
            exported: false,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Owner id of the current name request, if any.
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    pub fn is_subscribed(&self) -> bool {
        self.notifier.is_subscribed()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request the bus name and subscribe to desktop events.
    ///
    /// Only acts from `Disabled`; otherwise this is a logged no-op.
    pub fn enable(&mut self, desktop: &dyn DesktopSession, events: &DaemonEventSender) {
        if self.state != BridgeState::Disabled {
            debug!(state = ?self.state, "Bridge already enabled");
            return;
        }

        match self.transport.own_name(&self.bus_name, events.clone()) {
            Ok(owner) => {
                debug!(?owner, name = %self.bus_name, "Requested bus name");
                self.owner = Some(owner);
            }
            Err(e) => error!(name = %self.bus_name, error = %e, "Failed to request bus name"),
        }

        self.notifier.subscribe(desktop, events);
        self.state = BridgeState::Acquiring;
        info!("Bridge enabled");
    }

    /// React to progress of the name request.
    pub async fn handle_bus_event(&mut self, event: BusEvent) {
        if self.owner != Some(event.owner()) {
            debug!(?event, "Ignoring bus event from an earlier session");
            return;
        }

        match event {
            BusEvent::Connected(owner) => {
                if self.exported {
                    return;
                }
                match self.transport.export(owner, &self.object_path).await {
                    Ok(()) => {
                        self.exported = true;
                        self.state = BridgeState::Active;
                        info!(path = %self.object_path, "Exported on session bus");
                    }
                    Err(e) => error!(path = %self.object_path, error = %e, "Export failed"),
                }
            }
            BusEvent::NameAcquired(_) => {
                info!(name = %self.bus_name, "Acquired bus name");
            }
            BusEvent::NameLost { reason, .. } => {
                warn!(name = %self.bus_name, %reason, "Could not own bus name");
            }
        }
    }

    /// Emit one `WindowsChanged` with the current snapshot.
    ///
    /// Nothing is emitted while the object is not exported.
    pub async fn notify_windows_changed(&self, accessor: &Accessor) {
        if !self.exported {
            debug!("Not exported, skipping WindowsChanged");
            return;
        }

        let Some(payload) = windows_changed_payload(accessor) else {
            return;
        };

        if let Err(e) = self.transport.emit_windows_changed(&payload).await {
            warn!(error = %e, "Failed to emit WindowsChanged");
        }
    }

    /// Tear everything down. Each step runs even if an earlier one failed,
    /// and only resources actually held are released, so repeated calls are
    /// harmless.
    pub async fn disable(&mut self, desktop: &dyn DesktopSession) {
        self.notifier.unsubscribe(desktop);

        if self.exported {
            self.exported = false;
            if let Err(e) = self.transport.unexport().await {
                warn!(error = %e, "Failed to unexport");
            }
        }

        if let Some(owner) = self.owner.take() {
            if let Err(e) = self.transport.unown_name(owner).await {
                warn!(error = %e, "Failed to release bus name");
            }
        }

        if self.state != BridgeState::Disabled {
            self.state = BridgeState::Disabled;
            info!("Bridge disabled");
        }
    }
}
