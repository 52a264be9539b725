//! Event types for the daemon control loop.
//!
//! Bus calls, bus lifecycle callbacks and desktop mutation events all travel
//! over one unbounded channel and are drained by a single consumer, so no two
//! of them ever touch desktop state at the same time.

use tokio::sync::oneshot;

use crate::bridge::BusEvent;
use crate::desktop::{DesktopSignal, Rect, WindowHandle};

/// A call received on the exported bus object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetWindows,
    FocusWindow(WindowHandle),
    CloseWindow(WindowHandle),
    MoveResizeWindow { handle: WindowHandle, frame: Rect },
    MinimizeWindow(WindowHandle),
    MaximizeWindow { handle: WindowHandle, maximize: bool },
    GetWorkspaces,
    SwitchWorkspace(i32),
    LaunchApp(String),
    GetFocusedWindow,
}

impl Request {
    /// The reply sent when the request never reaches the control loop.
    pub fn fallback_reply(&self) -> Reply {
        match self {
            Request::GetWindows | Request::GetWorkspaces => Reply::Json("[]".to_string()),
            Request::GetFocusedWindow => Reply::Window(WindowHandle::NONE),
            _ => Reply::Success(false),
        }
    }
}

/// Reply to a [`Request`], already reduced to its wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Json(String),
    Success(bool),
    Window(WindowHandle),
}

impl Reply {
    pub fn into_json(self) -> String {
        match self {
            Reply::Json(json) => json,
            _ => "[]".to_string(),
        }
    }

    pub fn into_success(self) -> bool {
        matches!(self, Reply::Success(true))
    }

    pub fn into_window(self) -> u32 {
        match self {
            Reply::Window(handle) => handle.get(),
            _ => WindowHandle::NONE.get(),
        }
    }
}

/// Unified event type for the daemon control loop.
#[derive(Debug)]
pub enum DaemonEvent {
    /// A bus method call awaiting its reply
    Call {
        request: Request,
        response_tx: oneshot::Sender<Reply>,
    },

    /// A desktop mutation event from a live subscription
    Desktop(DesktopSignal),

    /// Progress of the bus name acquisition
    Bus(BusEvent),

    /// Tear the bridge down and leave the loop
    Shutdown,
}

impl From<DesktopSignal> for DaemonEvent {
    fn from(signal: DesktopSignal) -> Self {
        Self::Desktop(signal)
    }
}

impl From<BusEvent> for DaemonEvent {
    fn from(event: BusEvent) -> Self {
        Self::Bus(event)
    }
}

/// Sender side of the control channel.
pub type DaemonEventSender = flume::Sender<DaemonEvent>;

/// Receiver side of the control channel.
pub type DaemonEventReceiver = flume::Receiver<DaemonEvent>;

/// Create an unbounded channel for daemon events.
pub fn create_daemon_channel() -> (DaemonEventSender, DaemonEventReceiver) {
    flume::unbounded()
}
