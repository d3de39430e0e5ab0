//! Bridge configuration
//!
//! The file format (TOML or JSON) is chosen by the loader in the infra crate;
//! this module only defines the shape, the defaults and validation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_INTERVAL_SECS, DEFAULT_MQTT_PORT, DEFAULT_TOKEN_DIR,
    DEFAULT_TOPIC_PREFIX,
};
use crate::errors::ConfigError;
use crate::types::ParameterId;

/// Complete configuration of one bridge process
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub client_id: String,
    pub client_secret: String,
    pub system_id: u64,

    #[serde(default)]
    pub parameters: Vec<ParameterId>,

    pub mqtt_host: String,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    #[serde(default)]
    pub mqtt_username: Option<String>,
    #[serde(default)]
    pub mqtt_password: Option<String>,

    /// Poll interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_token_dir")]
    pub token_dir: PathBuf,

    /// Extra or overriding divisors keyed by parameter id. Keys are strings
    /// because TOML table keys always are.
    #[serde(default)]
    pub scaling: BTreeMap<String, f64>,
}

fn default_mqtt_port() -> u16 {
    DEFAULT_MQTT_PORT
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_token_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TOKEN_DIR)
}

impl BridgeConfig {
    /// Check the values serde cannot check.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("client_id must not be empty".into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("client_secret must not be empty".into()));
        }
        if self.system_id == 0 {
            return Err(ConfigError::Invalid("system_id must be non-zero".into()));
        }
        if self.mqtt_host.trim().is_empty() {
            return Err(ConfigError::Invalid("mqtt_host must not be empty".into()));
        }
        if self.interval == 0 {
            return Err(ConfigError::Invalid("interval must be at least 1 second".into()));
        }
        let level = self.log_level.to_ascii_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(ConfigError::Invalid(format!("unknown log_level '{}'", self.log_level)));
        }
        self.scale_overrides()?;
        Ok(())
    }

    #[must_use]
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Broker connection settings; a change here requires a reconnect
    #[must_use]
    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings {
            host: self.mqtt_host.clone(),
            port: self.mqtt_port,
            username: self.mqtt_username.clone(),
            password: self.mqtt_password.clone(),
        }
    }

    /// Scaling overrides with parsed ids.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for a non-numeric id or a zero or
    /// non-finite divisor.
    pub fn scale_overrides(&self) -> Result<BTreeMap<ParameterId, f64>, ConfigError> {
        self.scaling
            .iter()
            .map(|(key, divisor)| {
                let id = key.trim().parse::<ParameterId>().map_err(|_| {
                    ConfigError::Invalid(format!("scaling key '{key}' is not a parameter id"))
                })?;
                if *divisor == 0.0 || !divisor.is_finite() {
                    return Err(ConfigError::Invalid(format!(
                        "scaling divisor for {id} must be a non-zero number"
                    )));
                }
                Ok((id, *divisor))
            })
            .collect()
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("system_id", &self.system_id)
            .field("parameters", &self.parameters)
            .field("mqtt", &self.mqtt_settings())
            .field("interval", &self.interval)
            .field("log_level", &self.log_level)
            .field("topic_prefix", &self.topic_prefix)
            .field("api_base_url", &self.api_base_url)
            .field("token_dir", &self.token_dir)
            .field("scaling", &self.scaling)
            .finish()
    }
}

/// Broker connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for MqttSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
