//! Topic layout under the configured prefix

use std::fmt::Display;

use uplinkbridge_domain::constants::{
    TOPIC_HEARTBEAT, TOPIC_PARAMETERS, TOPIC_SET, TOPIC_SOFTWARE, TOPIC_STATUS, TOPIC_SYSTEM,
};

/// Builds every topic the bridge publishes or subscribes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self { prefix: prefix.trim_end_matches('/').to_string() }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn parameter(&self, id: impl Display) -> String {
        format!("{}/{TOPIC_PARAMETERS}/{id}", self.prefix)
    }

    #[must_use]
    pub fn status(&self, subsystem: &str) -> String {
        format!("{}/{TOPIC_STATUS}/{subsystem}", self.prefix)
    }

    #[must_use]
    pub fn system(&self, field: &str) -> String {
        format!("{}/{TOPIC_SYSTEM}/{field}", self.prefix)
    }

    #[must_use]
    pub fn heartbeat(&self) -> String {
        format!("{}/{TOPIC_HEARTBEAT}", self.prefix)
    }

    #[must_use]
    pub fn software(&self) -> String {
        format!("{}/{TOPIC_SOFTWARE}", self.prefix)
    }

    /// Wildcard subscription for inbound commands
    #[must_use]
    pub fn command_pattern(&self) -> String {
        format!("{}/{TOPIC_SET}/#", self.prefix)
    }
}
