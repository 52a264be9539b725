//! The window-management bridge.
//!
//! [`Bridge`] ties the pieces together: the [`Accessor`] and [`Executor`]
//! answer bus calls, the [`BridgeSession`] owns the published surface and the
//! desktop subscriptions. Everything runs on the control loop, one event at a
//! time.

mod accessor;
mod executor;
pub mod interface;
mod notifier;
pub mod serializer;
mod session;
mod transport;

pub use accessor::Accessor;
pub use executor::Executor;
pub use interface::{BridgeClientProxyBlocking, BridgeInterface};
pub use notifier::ChangeNotifier;
pub use session::{BridgeSession, BridgeState};
pub use transport::{BusEvent, OwnerId, Transport, ZbusTransport};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::desktop::{DesktopBackend, DesktopSignal, WindowHandle};
use crate::error::CommandError;
use crate::events::{DaemonEventSender, Reply, Request};
use crate::process::AppLauncher;

/// The bridge between bus callers and the desktop session.
pub struct Bridge<T: Transport> {
    accessor: Accessor,
    executor: Executor,
    session: BridgeSession<T>,
}

impl<T: Transport> Bridge<T> {
    pub fn new(
        desktop: DesktopBackend,
        launcher: Arc<dyn AppLauncher>,
        transport: T,
        config: &BridgeConfig,
    ) -> Self {
        let accessor = Accessor::new(desktop);
        let executor = Executor::new(accessor.clone(), launcher);
        let session = BridgeSession::new(transport, &config.bus_name, &config.object_path);
        Self {
            accessor,
            executor,
            session,
        }
    }

    pub fn session(&self) -> &BridgeSession<T> {
        &self.session
    }

    /// Answer one bus call. Failures are logged and reduced to the wire
    /// defaults.
    pub fn dispatch(&self, request: Request) -> Reply {
        debug!(?request, "Dispatching");
        match request {
            Request::GetWindows => Reply::Json(serializer::windows_snapshot(&self.accessor)),
            Request::GetWorkspaces => {
                Reply::Json(serializer::workspaces_snapshot(&self.accessor))
            }
            Request::GetFocusedWindow => Reply::Window(self.focused_window()),
            Request::FocusWindow(handle) => outcome("focus", self.executor.focus(handle)),
            Request::CloseWindow(handle) => outcome("close", self.executor.close(handle)),
            Request::MoveResizeWindow { handle, frame } => {
                outcome("move-resize", self.executor.move_resize(handle, frame))
            }
            Request::MinimizeWindow(handle) => {
                outcome("minimize", self.executor.minimize(handle))
            }
            Request::MaximizeWindow { handle, maximize } => {
                outcome("maximize", self.executor.set_maximized(handle, maximize))
            }
            Request::SwitchWorkspace(index) => {
                outcome("switch-workspace", self.executor.switch_workspace(index))
            }
            Request::LaunchApp(command_line) => {
                outcome("launch", self.executor.launch_app(&command_line))
            }
        }
    }

    fn focused_window(&self) -> WindowHandle {
        match self.accessor.focused_window() {
            Ok(handle) => handle.unwrap_or(WindowHandle::NONE),
            Err(e) => {
                warn!(error = %e, "Failed to read focused window");
                WindowHandle::NONE
            }
        }
    }

    pub fn enable(&mut self, events: &DaemonEventSender) {
        self.session.enable(self.accessor.session(), events);
    }

    pub async fn disable(&mut self) {
        self.session.disable(self.accessor.session()).await;
    }

    /// A window was created or destroyed.
    pub async fn on_desktop_event(&self, signal: DesktopSignal) {
        debug!(signal = signal.name(), "Desktop event");
        self.session.notify_windows_changed(&self.accessor).await;
    }

    pub async fn on_bus_event(&mut self, event: BusEvent) {
        self.session.handle_bus_event(event).await;
    }
}

fn outcome(action: &'static str, result: Result<(), CommandError>) -> Reply {
    match result {
        Ok(()) => Reply::Success(true),
        Err(e) if e.is_not_found() => {
            debug!(action, "{}", e);
            Reply::Success(false)
        }
        Err(e) => {
            warn!(action, error = %e, "Command failed");
            Reply::Success(false)
        }
    }
}
