//! Desktop session abstraction for window management.
//!
//! The bridge never talks to a compositor directly. It consumes the two
//! traits defined here, [`DesktopSession`] and [`WorkspaceManager`].
//! Implementations are provided for Hyprland (IPC socket) and a no-op
//! fallback for unsupported environments.

mod base;
mod detect;
pub mod env;
pub mod hyprland;
mod noop;

pub use base::{fold_address, is_normal_window};
pub use detect::{DesktopBackend, detect_backend};
pub use noop::NoopDesktop;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::events::DaemonEventSender;

/// Opaque window identifier assigned by the desktop session.
///
/// Unique among live windows and stable for a window's lifetime. The
/// session may reuse a value once the window is gone, so the bridge never
/// caches handles between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u32);

impl WindowHandle {
    /// Wire value meaning "no window".
    pub const NONE: WindowHandle = WindowHandle(0);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for WindowHandle {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Window type as reported by the session.
///
/// Sessions only tell normal application windows apart from everything else
/// (panels, layer surfaces, popups), and only normal ones are ever exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Normal,
    Other,
}

/// Frame rectangle in screen-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Maximize state per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaximizeFlags {
    pub horizontal: bool,
    pub vertical: bool,
}

impl MaximizeFlags {
    pub const NONE: MaximizeFlags = MaximizeFlags {
        horizontal: false,
        vertical: false,
    };

    pub const BOTH: MaximizeFlags = MaximizeFlags {
        horizontal: true,
        vertical: true,
    };

    /// Whether either axis is maximized.
    pub fn is_any(self) -> bool {
        self.horizontal || self.vertical
    }
}

/// Information about a window from the desktop session.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    /// Session-assigned handle exposed on the wire
    pub handle: WindowHandle,
    /// Compositor-specific address used to target the window (e.g. "0x5678abcd" for Hyprland)
    pub address: String,
    /// Numeric id from a lower-level windowing protocol (X11), when there is one
    pub legacy_id: Option<u64>,
    /// Window title
    pub title: Option<String>,
    /// Application class/ID (e.g., "firefox", "org.gnome.Nautilus")
    pub class: Option<String>,
    /// Owning process id, -1 if unknown
    pub pid: i32,
    pub window_type: WindowType,
    /// Whether the window opts out of taskbar listing
    pub skip_taskbar: bool,
    pub focused: bool,
    pub minimized: bool,
    pub maximized: MaximizeFlags,
    /// Workspace index, `None` when the window is on no regular workspace
    pub workspace: Option<u32>,
    /// Visible frame geometry
    pub frame: Rect,
}

/// Desktop mutation event streams the bridge listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesktopSignal {
    /// A window was created
    WindowCreated,
    /// The window manager destroyed a window
    WindowDestroyed,
}

impl DesktopSignal {
    pub const ALL: [DesktopSignal; 2] = [DesktopSignal::WindowCreated, DesktopSignal::WindowDestroyed];

    pub fn name(self) -> &'static str {
        match self {
            DesktopSignal::WindowCreated => "window-created",
            DesktopSignal::WindowDestroyed => "destroy",
        }
    }
}

/// Handle for a live event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Window enumeration and window actions of a desktop session.
///
/// Implementations must be thread-safe (Send + Sync): event readers run on
/// their own threads even though every call from the bridge comes from the
/// single control loop.
pub trait DesktopSession: Send + Sync {
    /// All top-level windows in stacking order, unfiltered.
    fn windows(&self) -> Result<Vec<WindowInfo>, SessionError>;

    /// The window holding keyboard focus, if any.
    fn focused_window(&self) -> Result<Option<WindowHandle>, SessionError>;

    /// Activate (raise and focus) a window.
    fn activate(&self, window: &WindowInfo, timestamp: u32) -> Result<(), SessionError>;

    /// Ask the window to close. Returns once the request is sent.
    fn delete(&self, window: &WindowInfo, timestamp: u32) -> Result<(), SessionError>;

    /// Move and resize the window frame.
    fn move_resize_frame(&self, window: &WindowInfo, frame: Rect) -> Result<(), SessionError>;

    fn minimize(&self, window: &WindowInfo) -> Result<(), SessionError>;

    fn maximize(&self, window: &WindowInfo, flags: MaximizeFlags) -> Result<(), SessionError>;

    fn unmaximize(&self, window: &WindowInfo, flags: MaximizeFlags) -> Result<(), SessionError>;

    /// Timestamp of the event being processed, 0 when the session has none.
    fn current_time(&self) -> u32 {
        0
    }

    /// Start delivering `signal` events into `sink` as [`crate::events::DaemonEvent::Desktop`].
    fn subscribe(
        &self,
        signal: DesktopSignal,
        sink: DaemonEventSender,
    ) -> Result<SubscriptionId, SessionError>;

    /// Stop a subscription. Unknown ids yield [`SessionError::NotSubscribed`].
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), SessionError>;

    /// Get the backend name for logging/debugging.
    fn name(&self) -> &'static str;
}

/// Workspace queries and switching.
pub trait WorkspaceManager: Send + Sync {
    fn workspace_count(&self) -> Result<u32, SessionError>;

    fn active_workspace_index(&self) -> Result<u32, SessionError>;

    fn activate_workspace(&self, index: u32, timestamp: u32) -> Result<(), SessionError>;
}

impl fmt::Debug for dyn DesktopSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DesktopSession({})", self.name())
    }
}
