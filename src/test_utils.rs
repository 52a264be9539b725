//! Test utilities and fakes.
//!
//! This module provides window builders and in-memory stand-ins for the
//! desktop session, the bus transport and the launcher. Only compiled in
//! test builds.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::bridge::{OwnerId, Transport};
use crate::desktop::{
    DesktopBackend, DesktopSession, DesktopSignal, MaximizeFlags, Rect, SubscriptionId,
    WindowHandle, WindowInfo, WindowType, WorkspaceManager,
};
use crate::error::{ProcessError, SessionError, TransportError};
use crate::events::{DaemonEvent, DaemonEventSender};
use crate::process::AppLauncher;

/// Create a normal window on workspace 0.
pub fn window(handle: u32, title: &str) -> WindowInfo {
    WindowInfo {
        handle: WindowHandle(handle),
        address: format!("0x{:x}", handle),
        legacy_id: None,
        title: Some(title.to_string()),
        class: Some(format!("app-{}", handle)),
        pid: 1000 + handle as i32,
        window_type: WindowType::Normal,
        skip_taskbar: false,
        focused: false,
        minimized: false,
        maximized: MaximizeFlags::NONE,
        workspace: Some(0),
        frame: Rect::new(0, 0, 800, 600),
    }
}

/// Wire a fake desktop into a backend.
pub fn backend(fake: &Arc<FakeDesktop>) -> DesktopBackend {
    DesktopBackend {
        session: fake.clone(),
        workspaces: fake.clone(),
    }
}

struct FakeState {
    windows: Vec<WindowInfo>,
    workspace_count: u32,
    active_workspace: u32,
    sinks: HashMap<SubscriptionId, (DesktopSignal, DaemonEventSender)>,
    next_subscription: u64,
    calls: Vec<String>,
    fail_queries: bool,
    fail_actions: bool,
    fail_unsubscribe: bool,
}

/// In-memory desktop session and workspace manager.
pub struct FakeDesktop {
    state: Mutex<FakeState>,
}

impl FakeDesktop {
    pub fn with_windows(windows: Vec<WindowInfo>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                windows,
                workspace_count: 1,
                active_workspace: 0,
                sinks: HashMap::new(),
                next_subscription: 0,
                calls: Vec::new(),
                fail_queries: false,
                fail_actions: false,
                fail_unsubscribe: false,
            }),
        })
    }

    pub fn set_workspaces(&self, count: u32, active: u32) {
        let mut state = self.state.lock().unwrap();
        state.workspace_count = count;
        state.active_workspace = active;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.state.lock().unwrap().fail_queries = fail;
    }

    pub fn fail_actions(&self, fail: bool) {
        self.state.lock().unwrap().fail_actions = fail;
    }

    /// Make unsubscribe fail with an IPC error, keeping the subscription.
    pub fn fail_unsubscribe(&self, fail: bool) {
        self.state.lock().unwrap().fail_unsubscribe = fail;
    }

    /// Current state of a window, regardless of its type.
    pub fn window(&self, handle: WindowHandle) -> Option<WindowInfo> {
        let state = self.state.lock().unwrap();
        state.windows.iter().find(|w| w.handle == handle).cloned()
    }

    pub fn remove_window(&self, handle: WindowHandle) {
        self.state
            .lock()
            .unwrap()
            .windows
            .retain(|w| w.handle != handle);
    }

    pub fn active_workspace(&self) -> u32 {
        self.state.lock().unwrap().active_workspace
    }

    /// Mutating calls in order, as "<action> <handle>".
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().unwrap().sinks.len()
    }

    /// Forget every subscription, as if the session dropped them itself.
    pub fn drop_subscriptions(&self) {
        self.state.lock().unwrap().sinks.clear();
    }

    /// Deliver `signal` to every subscriber of it.
    pub fn fire(&self, signal: DesktopSignal) {
        let state = self.state.lock().unwrap();
        for (subscribed, sink) in state.sinks.values() {
            if *subscribed == signal {
                let _ = sink.send(DaemonEvent::Desktop(signal));
            }
        }
    }

    fn query<R>(&self, f: impl FnOnce(&FakeState) -> R) -> Result<R, SessionError> {
        let state = self.state.lock().unwrap();
        if state.fail_queries {
            return Err(SessionError::IpcError("query failed".into()));
        }
        Ok(f(&state))
    }

    fn act(
        &self,
        action: &str,
        window: &WindowInfo,
        f: impl FnOnce(&mut Vec<WindowInfo>),
    ) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_actions {
            return Err(SessionError::CommandFailed(action.to_string()));
        }
        state.calls.push(format!("{} {}", action, window.handle));
        f(&mut state.windows);
        Ok(())
    }

    fn update(window: &WindowInfo, f: impl Fn(&mut WindowInfo)) -> impl FnOnce(&mut Vec<WindowInfo>) {
        let handle = window.handle;
        move |windows| {
            windows
                .iter_mut()
                .filter(|w| w.handle == handle)
                .for_each(f)
        }
    }
}

impl DesktopSession for FakeDesktop {
    fn windows(&self) -> Result<Vec<WindowInfo>, SessionError> {
        self.query(|state| state.windows.clone())
    }

    fn focused_window(&self) -> Result<Option<WindowHandle>, SessionError> {
        self.query(|state| state.windows.iter().find(|w| w.focused).map(|w| w.handle))
    }

    fn activate(&self, window: &WindowInfo, _timestamp: u32) -> Result<(), SessionError> {
        let handle = window.handle;
        self.act("activate", window, |windows| {
            for w in windows.iter_mut() {
                w.focused = w.handle == handle;
            }
        })
    }

    fn delete(&self, window: &WindowInfo, _timestamp: u32) -> Result<(), SessionError> {
        let handle = window.handle;
        self.act("delete", window, |windows| {
            windows.retain(|w| w.handle != handle)
        })
    }

    fn move_resize_frame(&self, window: &WindowInfo, frame: Rect) -> Result<(), SessionError> {
        self.act(
            "move_resize",
            window,
            Self::update(window, move |w| w.frame = frame),
        )
    }

    fn minimize(&self, window: &WindowInfo) -> Result<(), SessionError> {
        self.act("minimize", window, Self::update(window, |w| w.minimized = true))
    }

    fn maximize(&self, window: &WindowInfo, flags: MaximizeFlags) -> Result<(), SessionError> {
        self.act(
            "maximize",
            window,
            Self::update(window, move |w| {
                w.maximized.horizontal |= flags.horizontal;
                w.maximized.vertical |= flags.vertical;
            }),
        )
    }

    fn unmaximize(&self, window: &WindowInfo, flags: MaximizeFlags) -> Result<(), SessionError> {
        self.act(
            "unmaximize",
            window,
            Self::update(window, move |w| {
                w.maximized.horizontal &= !flags.horizontal;
                w.maximized.vertical &= !flags.vertical;
            }),
        )
    }

    fn subscribe(
        &self,
        signal: DesktopSignal,
        sink: DaemonEventSender,
    ) -> Result<SubscriptionId, SessionError> {
        let mut state = self.state.lock().unwrap();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.sinks.insert(id, (signal, sink));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_unsubscribe {
            return Err(SessionError::IpcError("unsubscribe failed".into()));
        }
        state
            .sinks
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionError::NotSubscribed(id))
    }

    fn name(&self) -> &'static str {
        "Fake"
    }
}

impl WorkspaceManager for FakeDesktop {
    fn workspace_count(&self) -> Result<u32, SessionError> {
        self.query(|state| state.workspace_count)
    }

    fn active_workspace_index(&self) -> Result<u32, SessionError> {
        self.query(|state| state.active_workspace)
    }

    fn activate_workspace(&self, index: u32, _timestamp: u32) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_actions {
            return Err(SessionError::CommandFailed("workspace".into()));
        }
        state.calls.push(format!("workspace {}", index));
        state.active_workspace = index;
        Ok(())
    }
}

/// A call made on [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    OwnName(String),
    Export(String),
    Unexport,
    UnownName(OwnerId),
}

/// Transport that records calls instead of touching a bus.
#[derive(Default)]
pub struct FakeTransport {
    fail_export: bool,
    fail_unexport: bool,
    fail_unown: bool,
    calls: Vec<TransportCall>,
    emitted: Mutex<Vec<String>>,
    next_owner: u64,
}

impl FakeTransport {
    /// Export attempts fail without exporting anything.
    pub fn failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    /// Unexport and name release are recorded, then fail.
    pub fn failing_teardown(mut self) -> Self {
        self.fail_unexport = true;
        self.fail_unown = true;
        self
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.clone()
    }

    /// `WindowsChanged` payloads in emission order.
    pub fn emitted(&self) -> Vec<String> {
        self.emitted.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn own_name(
        &mut self,
        name: &str,
        _events: DaemonEventSender,
    ) -> Result<OwnerId, TransportError> {
        self.calls.push(TransportCall::OwnName(name.to_string()));
        self.next_owner += 1;
        Ok(OwnerId(self.next_owner))
    }

    async fn export(&mut self, _owner: OwnerId, path: &str) -> Result<(), TransportError> {
        if self.fail_export {
            return Err(TransportError::AlreadyExported(path.to_string()));
        }
        self.calls.push(TransportCall::Export(path.to_string()));
        Ok(())
    }

    async fn unexport(&mut self) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Unexport);
        if self.fail_unexport {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    async fn unown_name(&mut self, owner: OwnerId) -> Result<(), TransportError> {
        self.calls.push(TransportCall::UnownName(owner));
        if self.fail_unown {
            return Err(TransportError::NotOwned);
        }
        Ok(())
    }

    async fn emit_windows_changed(&self, windows_json: &str) -> Result<(), TransportError> {
        self.emitted.lock().unwrap().push(windows_json.to_string());
        Ok(())
    }
}

/// Launcher that records command lines and fails on request.
#[derive(Default)]
pub struct FakeLauncher {
    desktop_fails: bool,
    shell_fails: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeLauncher {
    /// Launcher whose direct launch and shell fallback fail as requested.
    pub fn failing(desktop: bool, shell: bool) -> Self {
        Self {
            desktop_fails: desktop,
            shell_fails: shell,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AppLauncher for FakeLauncher {
    fn launch_command_line(&self, command_line: &str) -> Result<(), ProcessError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("launch {}", command_line));
        if self.desktop_fails {
            return Err(ProcessError::NeedsShell(command_line.to_string()));
        }
        Ok(())
    }

    fn spawn_shell(&self, command_line: &str) -> Result<(), ProcessError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("shell {}", command_line));
        if self.shell_fails {
            return Err(ProcessError::EmptyCommand);
        }
        Ok(())
    }
}
