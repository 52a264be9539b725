//! Session environment for launched applications.
//!
//! The bridge is usually started by the compositor or a user unit and may
//! miss variables that the graphical session exports later (theming,
//! `XDG_CURRENT_DESKTOP`, `WAYLAND_DISPLAY`). Launched programs get the
//! union of the process environment and the systemd user environment.

use std::collections::HashMap;
use std::process::Command;
use std::sync::OnceLock;

use tracing::debug;

static SESSION_ENV: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Capture the user session environment. Call once at daemon startup.
pub fn capture_session_environment() {
    SESSION_ENV.get_or_init(|| {
        let mut env: HashMap<String, String> = std::env::vars().collect();

        if let Some(systemd_env) = read_systemd_user_environment() {
            debug!(count = systemd_env.len(), "Merged systemd user environment");
            merge_missing(&mut env, systemd_env);
        }

        env
    });
}

/// Get the captured session environment for passing to child processes.
pub fn get_session_environment() -> &'static HashMap<String, String> {
    SESSION_ENV.get_or_init(|| std::env::vars().collect())
}

/// Add entries from `extra` that `env` does not define yet.
fn merge_missing(env: &mut HashMap<String, String>, extra: HashMap<String, String>) {
    for (key, value) in extra {
        env.entry(key).or_insert(value);
    }
}

/// Read environment variables from the systemd user manager.
fn read_systemd_user_environment() -> Option<HashMap<String, String>> {
    let output = Command::new("systemctl")
        .args(["--user", "show-environment"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    Some(parse_environment(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `KEY=value` lines; systemd may quote values.
fn parse_environment(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| {
            let value = value.trim_matches('"').trim_matches('\'');
            (key.to_string(), value.to_string())
        })
        .collect()
}
