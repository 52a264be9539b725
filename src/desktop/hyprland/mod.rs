//! Hyprland desktop session using the compositor's IPC sockets.
//!
//! Queries and dispatchers go over `.socket.sock`; window events are read
//! from `.socket2.sock` (see [`events`]).

mod events;

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    DesktopSession, DesktopSignal, MaximizeFlags, Rect, SubscriptionId, WindowHandle, WindowInfo,
    WindowType, WorkspaceManager, fold_address,
};
use crate::error::SessionError;
use crate::events::DaemonEventSender;
use events::{EventReader, Subscribers};

/// Hyprland session client using IPC socket communication.
pub struct HyprlandSession {
    socket_path: PathBuf,
    events_path: PathBuf,
    /// Name of the special workspace that stands in for "minimized"
    minimized_workspace: String,
    next_subscription: AtomicU64,
    subscribers: Subscribers,
    /// Running while at least one subscription exists
    reader: Mutex<Option<EventReader>>,
}

impl HyprlandSession {
    /// Create a new Hyprland session client.
    ///
    /// Returns None if the required environment variables are not set.
    pub fn new(minimized_workspace: &str) -> Option<Self> {
        let signature = std::env::var("HYPRLAND_INSTANCE_SIGNATURE").ok()?;
        let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
        let instance_dir = PathBuf::from(format!("{}/hypr/{}", runtime_dir, signature));
        Some(Self::at(&instance_dir, minimized_workspace))
    }

    /// Session talking to the sockets in `instance_dir`.
    fn at(instance_dir: &Path, minimized_workspace: &str) -> Self {
        Self {
            socket_path: instance_dir.join(".socket.sock"),
            events_path: instance_dir.join(".socket2.sock"),
            minimized_workspace: minimized_workspace.to_string(),
            next_subscription: AtomicU64::new(1),
            subscribers: Subscribers::default(),
            reader: Mutex::new(None),
        }
    }

    /// Send a command to Hyprland and receive the response.
    fn send_command(&self, cmd: &str) -> Result<String, SessionError> {
        let mut stream = UnixStream::connect(&self.socket_path)?;

        stream
            .write_all(cmd.as_bytes())
            .map_err(|e| SessionError::IpcError(format!("write to Hyprland socket: {}", e)))?;

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .map_err(|e| SessionError::IpcError(format!("read from Hyprland socket: {}", e)))?;

        Ok(response)
    }

    /// Run a `j/` query and parse its JSON reply.
    fn query<T: DeserializeOwned>(&self, what: &str) -> Result<T, SessionError> {
        let json = self.send_command(&format!("j/{}", what))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Run a dispatcher; Hyprland answers "ok" on success and an error text otherwise.
    fn dispatch(&self, dispatcher: &str) -> Result<(), SessionError> {
        let reply = self.send_command(&format!("dispatch {}", dispatcher))?;
        if reply.trim() == "ok" {
            Ok(())
        } else {
            Err(SessionError::CommandFailed(format!(
                "{}: {}",
                dispatcher,
                reply.trim()
            )))
        }
    }

    /// Ids of the regular workspaces, ascending. Their positions are the
    /// workspace indices exposed by the bridge.
    fn workspace_ids(&self) -> Result<Vec<i64>, SessionError> {
        let workspaces: Vec<HyprlandWorkspace> = self.query("workspaces")?;
        Ok(regular_workspace_ids(workspaces))
    }

    fn minimized_workspace_name(&self) -> String {
        format!("special:{}", self.minimized_workspace)
    }
}

impl DesktopSession for HyprlandSession {
    fn windows(&self) -> Result<Vec<WindowInfo>, SessionError> {
        let clients: Vec<HyprlandClient> = self.query("clients")?;
        let workspace_ids = self.workspace_ids()?;
        let minimized = self.minimized_workspace_name();

        Ok(clients
            .into_iter()
            .filter_map(|c| {
                let info = c.to_window_info(&workspace_ids, &minimized);
                if info.is_none() {
                    debug!(address = %c.address, "Skipping client with unusable address");
                }
                info
            })
            .collect())
    }

    fn focused_window(&self) -> Result<Option<WindowHandle>, SessionError> {
        // j/activewindow answers `{}` when nothing is focused
        let active: HyprlandActiveWindow = self.query("activewindow")?;
        Ok(fold_address(&active.address))
    }

    fn activate(&self, window: &WindowInfo, _timestamp: u32) -> Result<(), SessionError> {
        self.dispatch(&format!("focuswindow address:{}", window.address))
    }

    fn delete(&self, window: &WindowInfo, _timestamp: u32) -> Result<(), SessionError> {
        self.dispatch(&format!("closewindow address:{}", window.address))
    }

    fn move_resize_frame(&self, window: &WindowInfo, frame: Rect) -> Result<(), SessionError> {
        // Tiled windows ignore pixel moves
        self.dispatch(&format!("setfloating address:{}", window.address))?;
        self.dispatch(&format!(
            "movewindowpixel exact {} {},address:{}",
            frame.x, frame.y, window.address
        ))?;
        self.dispatch(&format!(
            "resizewindowpixel exact {} {},address:{}",
            frame.width, frame.height, window.address
        ))
    }

    fn minimize(&self, window: &WindowInfo) -> Result<(), SessionError> {
        self.dispatch(&format!(
            "movetoworkspacesilent {},address:{}",
            self.minimized_workspace_name(),
            window.address
        ))
    }

    fn maximize(&self, window: &WindowInfo, flags: MaximizeFlags) -> Result<(), SessionError> {
        // Requesting the mode a window already has toggles it back off
        if !flags.is_any() || window.maximized.is_any() {
            return Ok(());
        }
        // fullscreenstate acts on the focused window
        self.dispatch(&format!("focuswindow address:{}", window.address))?;
        self.dispatch("fullscreenstate 1 -1")
    }

    fn unmaximize(&self, window: &WindowInfo, flags: MaximizeFlags) -> Result<(), SessionError> {
        if !flags.is_any() || !window.maximized.is_any() {
            return Ok(());
        }
        self.dispatch(&format!("focuswindow address:{}", window.address))?;
        self.dispatch("fullscreenstate 0 -1")
    }

    fn subscribe(
        &self,
        signal: DesktopSignal,
        sink: DaemonEventSender,
    ) -> Result<SubscriptionId, SessionError> {
        let mut reader = self.reader.lock().map_err(|_| poisoned("event reader"))?;
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .map_err(|_| poisoned("subscriber table"))?
            .insert(id, (signal, sink));

        if reader.is_none() {
            match EventReader::spawn(&self.events_path, self.subscribers.clone()) {
                Ok(spawned) => *reader = Some(spawned),
                Err(e) => {
                    if let Ok(mut subscribers) = self.subscribers.lock() {
                        subscribers.remove(&id);
                    }
                    return Err(e);
                }
            }
        }

        debug!(signal = signal.name(), ?id, "Subscribed to Hyprland events");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), SessionError> {
        let mut reader = self.reader.lock().map_err(|_| poisoned("event reader"))?;
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|_| poisoned("subscriber table"))?;
        subscribers
            .remove(&id)
            .ok_or(SessionError::NotSubscribed(id))?;

        if subscribers.is_empty() {
            drop(subscribers);
            if let Some(reader) = reader.take() {
                reader.stop();
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Hyprland"
    }
}

impl WorkspaceManager for HyprlandSession {
    fn workspace_count(&self) -> Result<u32, SessionError> {
        Ok(self.workspace_ids()?.len() as u32)
    }

    fn active_workspace_index(&self) -> Result<u32, SessionError> {
        let active: HyprlandWorkspace = self.query("activeworkspace")?;
        self.workspace_ids()?
            .iter()
            .position(|id| *id == active.id)
            .map(|index| index as u32)
            .ok_or_else(|| {
                SessionError::IpcError(format!("active workspace {} is not listed", active.id))
            })
    }

    fn activate_workspace(&self, index: u32, _timestamp: u32) -> Result<(), SessionError> {
        let ids = self.workspace_ids()?;
        let id = ids.get(index as usize).ok_or_else(|| {
            SessionError::IpcError(format!("workspace index {} vanished", index))
        })?;
        self.dispatch(&format!("workspace {}", id))
    }
}

fn poisoned(what: &str) -> SessionError {
    SessionError::IpcError(format!("{} lock poisoned", what))
}

/// Hyprland client (window) information from IPC.
#[derive(Debug, Deserialize)]
struct HyprlandClient {
    address: String,
    #[serde(default)]
    mapped: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    at: [i32; 2],
    #[serde(default)]
    size: [i32; 2],
    workspace: HyprlandWorkspace,
    #[serde(default)]
    class: String,
    #[serde(default)]
    title: String,
    #[serde(default = "unknown_pid")]
    pid: i32,
    #[serde(default)]
    fullscreen: FullscreenState,
    /// 0 means currently focused, higher numbers mean less recently focused
    #[serde(rename = "focusHistoryID", default = "unknown_pid")]
    focus_history_id: i32,
}

fn unknown_pid() -> i32 {
    -1
}

impl HyprlandClient {
    fn to_window_info(&self, workspace_ids: &[i64], minimized_workspace: &str) -> Option<WindowInfo> {
        let handle = fold_address(&self.address)?;
        let minimized = self.workspace.name == minimized_workspace;
        let workspace = workspace_ids
            .iter()
            .position(|id| *id == self.workspace.id)
            .map(|index| index as u32);

        Some(WindowInfo {
            handle,
            address: self.address.clone(),
            legacy_id: None,
            title: Some(self.title.clone()),
            class: Some(self.class.clone()),
            pid: self.pid,
            // Clients without a class are layer surfaces and other special windows
            window_type: if self.class.is_empty() {
                WindowType::Other
            } else {
                WindowType::Normal
            },
            skip_taskbar: !self.mapped || self.hidden,
            focused: self.focus_history_id == 0,
            minimized,
            maximized: if self.fullscreen.is_maximized() {
                MaximizeFlags::BOTH
            } else {
                MaximizeFlags::NONE
            },
            workspace,
            frame: Rect::new(self.at[0], self.at[1], self.size[0], self.size[1]),
        })
    }
}

/// Fullscreen state; an integer mode on current Hyprland, a bool on older releases.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FullscreenState {
    Mode(u8),
    Legacy(bool),
}

impl Default for FullscreenState {
    fn default() -> Self {
        FullscreenState::Mode(0)
    }
}

impl FullscreenState {
    /// Mode 1 is "maximized", 3 is maximized and fullscreen.
    fn is_maximized(&self) -> bool {
        match self {
            FullscreenState::Mode(mode) => *mode == 1 || *mode == 3,
            FullscreenState::Legacy(on) => *on,
        }
    }
}

/// Hyprland workspace information.
#[derive(Debug, Deserialize)]
struct HyprlandWorkspace {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct HyprlandActiveWindow {
    #[serde(default)]
    address: String,
}

/// Regular workspaces have positive ids; special ones are negative.
fn regular_workspace_ids(workspaces: Vec<HyprlandWorkspace>) -> Vec<i64> {
    let mut ids: Vec<i64> = workspaces
        .into_iter()
        .map(|w| w.id)
        .filter(|id| *id > 0)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
