//! Protocol and runtime constants
//!
//! Centralized location for the values the vendor API and the topic layout
//! impose on the bridge.

use std::time::Duration;

// Vendor API
pub const DEFAULT_API_BASE_URL: &str = "https://api.nibeuplink.com";
pub const TOKEN_ENDPOINT: &str = "/oauth/token";
pub const SYSTEMS_ENDPOINT: &str = "/api/v1/systems";
pub const DEFAULT_SCOPE: &str = "READSYSTEM WRITESYSTEM";
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// Page size of the parameter read call.
pub const MAX_BATCH_SIZE: usize = 15;

// Scheduling
pub const PUBLISH_SPACING: Duration = Duration::from_secs(5);
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

// Broker
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const MQTT_CLIENT_ID: &str = "uplink-bridge";
pub const MQTT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const RECONNECT_INITIAL_DELAY: Duration = Duration::from_secs(1);
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);

// Topics (relative to the configured prefix)
pub const DEFAULT_TOPIC_PREFIX: &str = "Bridge";
pub const TOPIC_PARAMETERS: &str = "Parameters";
pub const TOPIC_STATUS: &str = "Status";
pub const TOPIC_SYSTEM: &str = "System";
pub const TOPIC_HEARTBEAT: &str = "Service/Heartbeat";
pub const TOPIC_SOFTWARE: &str = "Software";
pub const TOPIC_SET: &str = "Set";

// Token storage
pub const DEFAULT_TOKEN_DIR: &str = "/var/lib/misc";
pub const TOKEN_FILE_PREFIX: &str = ".oauth_token_";
