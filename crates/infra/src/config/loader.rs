//! Configuration loader
//!
//! Reads the bridge configuration from a single file. The format is chosen by
//! extension: `.toml` (and extensionless files) as TOML, `.json` as JSON.
//!
//! The daemon resolves the path from its first argument, then
//! `UPLINK_BRIDGE_CONFIG`, then [`DEFAULT_CONFIG_PATH`].

use std::path::Path;

use uplinkbridge_domain::{BridgeConfig, ConfigError};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "UPLINK_BRIDGE_CONFIG";

/// Used when neither an argument nor the environment names a file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/uplink-bridge/config.toml";

/// Load and validate configuration from a file
///
/// # Errors
/// Returns `ConfigError` if:
/// - The file cannot be read (`Io`)
/// - The extension is not supported (`UnsupportedFormat`)
/// - The content does not deserialize (`Parse`)
/// - A value fails validation (`Invalid`)
pub fn load_from_file(path: &Path) -> Result<BridgeConfig, ConfigError> {
    tracing::debug!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

    let config = parse_config(&contents, path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension; no validation is performed.
///
/// # Errors
/// Returns `ConfigError::UnsupportedFormat` or `ConfigError::Parse`.
pub fn parse_config(contents: &str, path: &Path) -> Result<BridgeConfig, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension.to_ascii_lowercase().as_str() {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("Invalid JSON format: {e}"))),
        _ => Err(ConfigError::UnsupportedFormat(extension.to_string())),
    }
}
