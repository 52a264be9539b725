//! No-op desktop session for unsupported environments.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{
    DesktopSession, DesktopSignal, MaximizeFlags, Rect, SubscriptionId, WindowHandle, WindowInfo,
    WorkspaceManager,
};
use crate::error::SessionError;
use crate::events::DaemonEventSender;

/// A desktop session with no windows and a single workspace.
///
/// Used as a fallback when no supported compositor is detected, so the bus
/// surface still comes up and answers queries with empty results. Every
/// window action fails with [`SessionError::Unsupported`] and subscriptions
/// never fire.
#[derive(Default)]
pub struct NoopDesktop {
    next_subscription: AtomicU64,
    subscriptions: Mutex<HashSet<SubscriptionId>>,
}

impl NoopDesktop {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DesktopSession for NoopDesktop {
    fn windows(&self) -> Result<Vec<WindowInfo>, SessionError> {
        Ok(Vec::new())
    }

    fn focused_window(&self) -> Result<Option<WindowHandle>, SessionError> {
        Ok(None)
    }

    fn activate(&self, _window: &WindowInfo, _timestamp: u32) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("activate"))
    }

    fn delete(&self, _window: &WindowInfo, _timestamp: u32) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("delete"))
    }

    fn move_resize_frame(&self, _window: &WindowInfo, _frame: Rect) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("move_resize_frame"))
    }

    fn minimize(&self, _window: &WindowInfo) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("minimize"))
    }

    fn maximize(&self, _window: &WindowInfo, _flags: MaximizeFlags) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("maximize"))
    }

    fn unmaximize(&self, _window: &WindowInfo, _flags: MaximizeFlags) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("unmaximize"))
    }

    fn subscribe(
        &self,
        _signal: DesktopSignal,
        _sink: DaemonEventSender,
    ) -> Result<SubscriptionId, SessionError> {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed) + 1);
        self.subscriptions
            .lock()
            .map_err(|_| SessionError::IpcError("subscription table poisoned".into()))?
            .insert(id);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), SessionError> {
        let removed = self
            .subscriptions
            .lock()
            .map_err(|_| SessionError::IpcError("subscription table poisoned".into()))?
            .remove(&id);
        if removed {
            Ok(())
        } else {
            Err(SessionError::NotSubscribed(id))
        }
    }

    fn name(&self) -> &'static str {
        "Noop"
    }
}

impl WorkspaceManager for NoopDesktop {
    fn workspace_count(&self) -> Result<u32, SessionError> {
        Ok(1)
    }

    fn active_workspace_index(&self) -> Result<u32, SessionError> {
        Ok(0)
    }

    fn activate_workspace(&self, index: u32, _timestamp: u32) -> Result<(), SessionError> {
        if index == 0 {
            Ok(())
        } else {
            Err(SessionError::Unsupported("activate_workspace"))
        }
    }
}
