//! Process execution for launching detached applications.
//!
//! Launched programs must outlive the bridge, so every spawn goes through
//! `setsid()` and has its stdio redirected to `/dev/null`.

use std::ffi::OsStr;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use crate::desktop::env::get_session_environment;
use crate::error::ProcessError;

/// Characters that only a shell can interpret.
const SHELL_SYNTAX: &[char] = &[
    '"', '\'', '\\', '$', '`', '|', '&', ';', '<', '>', '(', ')', '{', '}', '*', '?', '~', '#',
];

/// Builder for creating detached processes.
///
/// A detached process runs in its own session (via `setsid()`) and survives
/// when the bridge exits. All stdio is redirected to null.
///
/// # Example
/// ```ignore
/// use wmbridge::process::DetachedProcess;
///
/// DetachedProcess::new("firefox")
///     .arg("https://example.com")
///     .with_session_env()
///     .spawn()?;
/// ```
pub struct DetachedProcess {
    command: Command,
    use_session_env: bool,
}

impl DetachedProcess {
    /// Create a new detached process builder for the given program.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            command: Command::new(program),
            use_session_env: false,
        }
    }

    /// Run `command_line` through `shell -c`.
    pub fn shell(shell: &str, command_line: &str) -> Self {
        Self::new(shell).arg("-c").arg(command_line)
    }

    /// Add an argument to the process.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.command.arg(arg);
        self
    }

    /// Add multiple arguments to the process.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Replace the environment with the session environment captured at startup.
    pub fn with_session_env(mut self) -> Self {
        self.use_session_env = true;
        self
    }

    /// Spawn the detached process without waiting for it.
    pub fn spawn(mut self) -> Result<(), ProcessError> {
        if self.use_session_env {
            self.command.env_clear();
            self.command.envs(get_session_environment().iter());
        }

        self.command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // SAFETY: setsid() is async-signal-safe, so calling it between fork
        // and exec is sound.
        unsafe {
            self.command.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        self.command.spawn().map_err(ProcessError::SpawnFailed)?;

        Ok(())
    }
}

/// Split a command line into argv.
///
/// Only plain whitespace-separated words are accepted. Quoting, expansion,
/// redirection and leading `VAR=value` assignments are left to the shell
/// fallback.
pub fn parse_command_line(command_line: &str) -> Result<Vec<String>, ProcessError> {
    let argv: Vec<String> = command_line
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let Some(program) = argv.first() else {
        return Err(ProcessError::EmptyCommand);
    };

    if command_line.contains(SHELL_SYNTAX) || program.contains('=') {
        return Err(ProcessError::NeedsShell(command_line.to_string()));
    }

    Ok(argv)
}

/// Launch a command line directly, with the session environment.
pub fn launch_command_line(command_line: &str) -> Result<(), ProcessError> {
    let argv = parse_command_line(command_line)?;

    DetachedProcess::new(&argv[0])
        .args(&argv[1..])
        .with_session_env()
        .spawn()
}

/// Execute a shell command in a detached process.
pub fn run_shell_command(shell: &str, command_line: &str) -> Result<(), ProcessError> {
    if command_line.trim().is_empty() {
        return Err(ProcessError::EmptyCommand);
    }
    DetachedProcess::shell(shell, command_line)
        .with_session_env()
        .spawn()
}

/// The application launch facility used by the bridge.
pub trait AppLauncher: Send + Sync {
    /// Launch a command line the way the desktop launches applications.
    fn launch_command_line(&self, command_line: &str) -> Result<(), ProcessError>;

    /// Run a command line through the shell.
    fn spawn_shell(&self, command_line: &str) -> Result<(), ProcessError>;
}

/// Launcher that spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    shell: String,
}

impl SystemLauncher {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl AppLauncher for SystemLauncher {
    fn launch_command_line(&self, command_line: &str) -> Result<(), ProcessError> {
        launch_command_line(command_line)
    }

    fn spawn_shell(&self, command_line: &str) -> Result<(), ProcessError> {
        run_shell_command(&self.shell, command_line)
    }
}
