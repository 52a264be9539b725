//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Default well-known bus name, shared with existing clients of the bridge.
pub const DEFAULT_BUS_NAME: &str = "org.gnome.AIBridge";

/// Default path of the exported object.
pub const DEFAULT_OBJECT_PATH: &str = "/org/gnome/AIBridge";

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Well-known name to own on the session bus.
    pub bus_name: String,
    /// Object path the bridge interface is exported at.
    pub object_path: String,
    /// Which desktop backend to use.
    pub backend: BackendKind,
    /// Special workspace used to emulate minimizing on compositors without it.
    pub minimized_workspace: String,
    /// Shell used when a command line cannot be launched directly.
    pub shell: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bus_name: DEFAULT_BUS_NAME.to_string(),
            object_path: DEFAULT_OBJECT_PATH.to_string(),
            backend: BackendKind::Auto,
            minimized_workspace: "minimized".to_string(),
            shell: "/bin/sh".to_string(),
        }
    }
}

/// Desktop backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Detect from the environment.
    #[default]
    Auto,
    Hyprland,
    /// No compositor; empty results and failing actions.
    Noop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: BridgeConfig = toml::from_str(r#"backend = "noop""#).unwrap();
        assert_eq!(config.backend, BackendKind::Noop);
        assert_eq!(config.bus_name, DEFAULT_BUS_NAME);
        assert_eq!(config.object_path, DEFAULT_OBJECT_PATH);
        assert_eq!(config.shell, "/bin/sh");
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(toml::from_str::<BridgeConfig>(r#"backend = "sway""#).is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = BridgeConfig {
            bus_name: "org.example.Bridge".to_string(),
            ..BridgeConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: BridgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
