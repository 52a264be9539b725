//! Configuration validation utilities.
//!
//! Provides validation for configuration values, returning warnings for
//! non-fatal issues that should be logged but don't prevent startup.

use zbus::names::WellKnownName;
use zbus::zvariant::ObjectPath;

use super::types::BridgeConfig;

/// Non-fatal validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    /// The field that has an issue.
    pub field: String,
    /// A description of the issue.
    pub message: String,
}

/// Validate the entire config, returning warnings for non-fatal issues.
///
/// This function checks for:
/// - Bus names that the bus daemon would refuse
/// - Malformed object paths
/// - An empty shell or minimized workspace name
pub fn validate_config(config: &BridgeConfig) -> Vec<ValidationWarning> {
    let mut warnings = vec![];

    if let Err(e) = WellKnownName::try_from(config.bus_name.as_str()) {
        warnings.push(ValidationWarning {
            field: "bus_name".to_string(),
            message: format!(
                "'{}' is not a valid well-known bus name ({}). The bridge will not be reachable.",
                config.bus_name, e
            ),
        });
    }

    if let Err(e) = ObjectPath::try_from(config.object_path.as_str()) {
        warnings.push(ValidationWarning {
            field: "object_path".to_string(),
            message: format!(
                "'{}' is not a valid object path ({}). The bridge will not be exported.",
                config.object_path, e
            ),
        });
    }

    if config.shell.trim().is_empty() {
        warnings.push(ValidationWarning {
            field: "shell".to_string(),
            message: "Shell is empty. The launch fallback will always fail.".to_string(),
        });
    }

    if config.minimized_workspace.trim().is_empty() {
        warnings.push(ValidationWarning {
            field: "minimized_workspace".to_string(),
            message: "Minimized workspace name is empty. Minimizing may fail.".to_string(),
        });
    }

    warnings
}
