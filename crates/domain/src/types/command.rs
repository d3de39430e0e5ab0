//! Inbound control commands

use serde::{Deserialize, Serialize};

use super::batch::ParameterId;
use crate::impl_domain_enum_conversions;

/// A typed control action addressed to the device.
///
/// Built from an inbound topic/payload pair, consumed once by the API client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Switch the smart-home mode (e.g. `"DEFAULT_OPERATION"`, `"AWAY_FROM_HOME"`)
    SetMode(String),
    /// Write a single device parameter
    SetParameter(ParameterId, String),
    /// Create or update a virtual thermostat; always carries `externalId` and `name`
    SetThermostat(serde_json::Map<String, serde_json::Value>),
}

impl Command {
    #[must_use]
    pub fn family(&self) -> CommandFamily {
        match self {
            Self::SetMode(_) => CommandFamily::Mode,
            Self::SetParameter(..) => CommandFamily::Parameters,
            Self::SetThermostat(_) => CommandFamily::Thermostats,
        }
    }
}

/// Topic segment naming a command family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFamily {
    Mode,
    Parameters,
    Thermostats,
}

impl_domain_enum_conversions!(CommandFamily {
    Mode => "mode",
    Parameters => "parameters",
    Thermostats => "thermostats",
});

impl CommandFamily {
    /// Static name, used in error values
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::Parameters => "parameters",
            Self::Thermostats => "thermostats",
        }
    }
}
