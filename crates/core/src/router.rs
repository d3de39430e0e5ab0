//! Command router - dispatches inbound commands to API write calls

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uplinkbridge_domain::{error_label, ApiError, ApiErrorCategory, ApiResult, Command};

use crate::codec::parse_inbound_command;
use crate::ports::UplinkApi;

/// Turns inbound bus messages into vendor API writes
///
/// Every failure is logged here; nothing propagates back to the listener.
pub struct CommandRouter {
    api: Arc<dyn UplinkApi>,
}

impl CommandRouter {
    /// Create a router writing through `api`
    pub fn new(api: Arc<dyn UplinkApi>) -> Self {
        Self { api }
    }

    /// Parse and route one inbound message
    ///
    /// Returns `true` when a command was dispatched successfully.
    pub async fn handle(&self, topic: &str, payload: &str) -> bool {
        match parse_inbound_command(topic, payload) {
            Ok(command) => self.route(command).await,
            Err(err) => {
                warn!(topic = %topic, error = %err, "Discarding inbound command");
                false
            }
        }
    }

    /// Dispatch a parsed command
    ///
    /// Returns `true` when the API accepted the write.
    pub async fn route(&self, command: Command) -> bool {
        let family = command.family();
        match self.dispatch(command).await {
            Ok(()) => true,
            Err(err) => {
                log_api_error(family.as_str(), &err);
                false
            }
        }
    }

    async fn dispatch(&self, command: Command) -> ApiResult<()> {
        match command {
            Command::SetMode(mode) => {
                info!(mode = %mode, "Setting smart-home mode");
                self.api.set_mode(&mode).await
            }
            Command::SetParameter(id, value) => {
                info!(parameter_id = id, value = %value, "Setting parameter");
                let settings = BTreeMap::from([(id, value)]);
                self.api.set_parameters(&settings).await
            }
            Command::SetThermostat(thermostat) => {
                info!("Updating thermostat");
                self.api.set_thermostat(&thermostat).await
            }
        }
    }
}

/// Log an API failure at the level its category calls for
///
/// Rate limiting and server errors are routine and stay at debug; everything
/// else is a warning.
pub fn log_api_error(operation: &str, error: &ApiError) {
    let label = error_label(error);
    let transient = error.is_transient();
    match error.category() {
        ApiErrorCategory::RateLimit | ApiErrorCategory::Server => {
            debug!(operation, error_type = label, transient, error = %error, "Vendor API call failed");
        }
        ApiErrorCategory::Authorization
        | ApiErrorCategory::Transport
        | ApiErrorCategory::Client => {
            warn!(operation, error_type = label, transient, error = %error, "Vendor API call failed");
        }
    }
}
