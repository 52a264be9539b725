//! Wire representation of window and workspace snapshots.
//!
//! Snapshots are JSON arrays of flat records. Missing strings are encoded as
//! `""`, a missing legacy id as `0` and a missing workspace as `-1`, so a
//! record never contains `null`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::accessor::Accessor;
use crate::desktop::WindowInfo;

/// What an empty or failed query looks like on the wire.
pub const EMPTY_SNAPSHOT: &str = "[]";

/// One window as seen by bus clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: u32,
    pub xid: u64,
    pub title: String,
    pub wm_class: String,
    pub pid: i32,
    pub focused: bool,
    pub minimized: bool,
    pub maximized: bool,
    pub workspace: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<&WindowInfo> for WindowRecord {
    fn from(window: &WindowInfo) -> Self {
        Self {
            id: window.handle.get(),
            xid: window.legacy_id.unwrap_or(0),
            title: window.title.clone().unwrap_or_default(),
            wm_class: window.class.clone().unwrap_or_default(),
            pid: window.pid,
            focused: window.focused,
            minimized: window.minimized,
            maximized: window.maximized.is_any(),
            workspace: window
                .workspace
                .and_then(|index| i32::try_from(index).ok())
                .unwrap_or(-1),
            x: window.frame.x,
            y: window.frame.y,
            width: window.frame.width,
            height: window.frame.height,
        }
    }
}

/// One workspace as seen by bus clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub index: u32,
    pub active: bool,
}

/// Records in enumeration order.
pub fn window_records(windows: &[WindowInfo]) -> Vec<WindowRecord> {
    windows.iter().map(WindowRecord::from).collect()
}

/// Records for `0..count`, exactly one of them active when `active < count`.
pub fn workspace_records(count: u32, active: u32) -> Vec<WorkspaceRecord> {
    (0..count)
        .map(|index| WorkspaceRecord {
            index,
            active: index == active,
        })
        .collect()
}

pub fn serialize_windows(records: &[WindowRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

pub fn serialize_workspaces(records: &[WorkspaceRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

/// Current windows as JSON. A failing session yields the empty snapshot;
/// only an encoding failure is an error.
pub fn windows_json(accessor: &Accessor) -> Result<String, serde_json::Error> {
    match accessor.list_windows() {
        Ok(windows) => serialize_windows(&window_records(&windows)),
        Err(e) => {
            warn!(error = %e, "Failed to enumerate windows");
            Ok(EMPTY_SNAPSHOT.to_string())
        }
    }
}

/// Reply to `GetWindows`.
pub fn windows_snapshot(accessor: &Accessor) -> String {
    windows_json(accessor).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to encode windows");
        EMPTY_SNAPSHOT.to_string()
    })
}

/// Reply to `GetWorkspaces`.
pub fn workspaces_snapshot(accessor: &Accessor) -> String {
    let records = match accessor.list_workspaces() {
        Ok((count, active)) => workspace_records(count, active),
        Err(e) => {
            warn!(error = %e, "Failed to read workspaces");
            return EMPTY_SNAPSHOT.to_string();
        }
    };

    serialize_workspaces(&records).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to encode workspaces");
        EMPTY_SNAPSHOT.to_string()
    })
}
