use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use zbus::blocking::Connection;
use zbus::blocking::fdo::DBusProxy;
use zbus::names::BusName;

use crate::bridge::BridgeClientProxyBlocking;
use crate::config::BridgeConfig;

#[derive(Parser)]
#[command(name = "wmbridge")]
#[command(about = "Desktop window management over the session bus")]
pub struct Cli {
    /// Config file to use instead of ~/.config/wmbridge/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the normal windows as JSON
    Windows,
    /// Print the workspaces as JSON
    Workspaces,
    /// Print the handle of the focused window (0 if none)
    Focused,
    /// Focus a window
    Focus { id: u32 },
    /// Ask a window to close
    Close { id: u32 },
    /// Move and resize a window
    Move {
        id: u32,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        width: i32,
        height: i32,
    },
    /// Minimize a window
    Minimize { id: u32 },
    /// Maximize a window
    Maximize {
        id: u32,
        /// Restore instead of maximizing
        #[arg(long)]
        restore: bool,
    },
    /// Switch to a workspace by index
    Switch {
        #[arg(allow_negative_numbers = true)]
        index: i32,
    },
    /// Launch a command line
    Launch {
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Print every WindowsChanged payload
    Watch,
}

/// Handle a client command by calling the running bridge.
pub fn handle_client_command(cmd: Commands, config: &BridgeConfig) -> Result<()> {
    let connection = Connection::session().context("Failed to connect to the session bus")?;

    if !is_bridge_running(&connection, &config.bus_name)? {
        bail!(
            "No bridge owns {} on the session bus. Start it first by running: wmbridge",
            config.bus_name
        );
    }

    let proxy = BridgeClientProxyBlocking::builder(&connection)
        .destination(config.bus_name.as_str())?
        .path(config.object_path.as_str())?
        .build()
        .context("Failed to create bridge proxy")?;

    match cmd {
        Commands::Windows => print_json(&proxy.get_windows()?)?,
        Commands::Workspaces => print_json(&proxy.get_workspaces()?)?,
        Commands::Focused => println!("{}", proxy.get_focused_window()?),
        Commands::Focus { id } => expect_success(proxy.focus_window(id)?, "focus", id)?,
        Commands::Close { id } => expect_success(proxy.close_window(id)?, "close", id)?,
        Commands::Move {
            id,
            x,
            y,
            width,
            height,
        } => expect_success(
            proxy.move_resize_window(id, x, y, width, height)?,
            "move",
            id,
        )?,
        Commands::Minimize { id } => {
            expect_success(proxy.minimize_window(id)?, "minimize", id)?
        }
        Commands::Maximize { id, restore } => {
            expect_success(proxy.maximize_window(id, !restore)?, "maximize", id)?
        }
        Commands::Switch { index } => {
            if !proxy.switch_workspace(index)? {
                bail!("Could not switch to workspace {}", index);
            }
        }
        Commands::Launch { command } => {
            let command_line = command.join(" ");
            if !proxy.launch_app(&command_line)? {
                bail!("Could not launch: {}", command_line);
            }
        }
        Commands::Watch => {
            for signal in proxy.receive_windows_changed()? {
                let args = signal.args()?;
                print_json(args.windows_json())?;
            }
        }
    }

    Ok(())
}

fn is_bridge_running(connection: &Connection, bus_name: &str) -> Result<bool> {
    let name = BusName::try_from(bus_name)
        .with_context(|| format!("Invalid bus name: {}", bus_name))?;
    let dbus = DBusProxy::new(connection)?;
    Ok(dbus.name_has_owner(name)?)
}

fn expect_success(success: bool, action: &str, id: u32) -> Result<()> {
    if !success {
        bail!("Could not {} window {}", action, id);
    }
    Ok(())
}

/// Pretty-print a JSON reply, or print it raw if it does not parse.
fn print_json(json: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", json),
    }
    Ok(())
}
