//! Read-only queries against the live desktop session.

use std::sync::Arc;

use crate::desktop::{
    DesktopBackend, DesktopSession, WindowHandle, WindowInfo, WorkspaceManager, is_normal_window,
};
use crate::error::{CommandError, SessionError};

/// Queries windows and workspaces. Nothing here is cached: every call reads
/// the session again.
#[derive(Clone)]
pub struct Accessor {
    session: Arc<dyn DesktopSession>,
    workspaces: Arc<dyn WorkspaceManager>,
}

impl Accessor {
    pub fn new(desktop: DesktopBackend) -> Self {
        Self {
            session: desktop.session,
            workspaces: desktop.workspaces,
        }
    }

    pub fn session(&self) -> &dyn DesktopSession {
        self.session.as_ref()
    }

    pub fn workspaces(&self) -> &dyn WorkspaceManager {
        self.workspaces.as_ref()
    }

    /// Normal, taskbar-listed windows in the session's stacking order.
    pub fn list_windows(&self) -> Result<Vec<WindowInfo>, SessionError> {
        let windows = self.session.windows()?;
        Ok(windows.into_iter().filter(is_normal_window).collect())
    }

    /// Resolve a handle to a live normal window.
    pub fn find_window(&self, handle: WindowHandle) -> Result<WindowInfo, CommandError> {
        self.list_windows()?
            .into_iter()
            .find(|w| w.handle == handle)
            .ok_or(CommandError::WindowNotFound(handle))
    }

    /// Workspace count and active index.
    pub fn list_workspaces(&self) -> Result<(u32, u32), SessionError> {
        let count = self.workspaces.workspace_count()?;
        let active = self.workspaces.active_workspace_index()?;
        Ok((count, active))
    }

    /// The focused window, whatever its type.
    pub fn focused_window(&self) -> Result<Option<WindowHandle>, SessionError> {
        self.session.focused_window()
    }
}
