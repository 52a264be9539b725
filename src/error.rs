//! Domain-specific error types for wmbridge.
//!
//! Every layer reports failures with its own enum. None of them reach a bus
//! caller: the bridge reduces them to `false`, `[]` or `0` at the RPC
//! boundary and logs the detail.

use thiserror::Error;

use crate::desktop::{SubscriptionId, WindowHandle};

/// Errors raised by a desktop session backend.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Failed to connect to the compositor socket.
    #[error("Failed to connect to compositor socket: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    /// Error during IPC communication.
    #[error("IPC communication error: {0}")]
    IpcError(String),

    /// Failed to parse compositor response.
    #[error("Failed to parse compositor response: {0}")]
    ParseError(#[source] serde_json::Error),

    /// The compositor refused a dispatched command.
    #[error("Compositor rejected command: {0}")]
    CommandFailed(String),

    /// The backend does not implement this operation.
    #[error("Operation not supported by this desktop session: {0}")]
    Unsupported(&'static str),

    /// The subscription was never registered or is already gone.
    #[error("No live subscription {0:?}")]
    NotSubscribed(SubscriptionId),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::ConnectionFailed(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::ParseError(err)
    }
}

/// Outcome of a single command against the desktop.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The handle does not resolve to a live normal window.
    #[error("Window {0} not found")]
    WindowNotFound(WindowHandle),

    /// The workspace index is outside `0..count`.
    #[error("Workspace index {index} out of range (count {count})")]
    WorkspaceOutOfRange { index: i32, count: u32 },

    /// The desktop session failed while resolving or applying the command.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Both the desktop launch and the shell fallback failed.
    #[error("Launch failed ({desktop}); shell fallback failed ({shell})")]
    LaunchFailed {
        desktop: ProcessError,
        shell: ProcessError,
    },
}

impl CommandError {
    /// Whether the target simply did not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommandError::WindowNotFound(_) | CommandError::WorkspaceOutOfRange { .. }
        )
    }
}

/// Message bus errors.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The bus connection has not been established yet.
    #[error("Not connected to the bus")]
    NotConnected,

    /// No object is currently exported.
    #[error("Object is not exported")]
    NotExported,

    /// An object is already exported at the path.
    #[error("Object already exported at {0}")]
    AlreadyExported(String),

    /// The owner id does not match the current name registration.
    #[error("Bus name is not owned by this session")]
    NotOwned,

    /// The name or path is not valid on the bus.
    #[error("Invalid bus address: {0}")]
    InvalidAddress(String),

    /// Error reported by zbus.
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),
}

/// Process execution errors.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The command line was empty.
    #[error("Empty command line")]
    EmptyCommand,

    /// The command line uses shell syntax and cannot be run as plain argv.
    #[error("Command line needs a shell: {0}")]
    NeedsShell(String),

    /// Failed to spawn the process.
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[source] std::io::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config directory could not be determined.
    #[error("Config directory not found")]
    NoDirFound,

    /// Failed to read the config file.
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// Failed to parse the config file.
    #[error("Failed to parse config: {0}")]
    ParseFailed(#[source] toml::de::Error),
}
