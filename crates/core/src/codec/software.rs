//! Software upgrade availability

use serde_json::Value;
use uplinkbridge_domain::{CodecError, Switch};

/// Installed software descriptor, reduced to the pending upgrade
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareStatus {
    pub upgrade: Option<Value>,
}

impl SoftwareStatus {
    /// ON when an upgrade is offered
    #[must_use]
    pub fn switch(&self) -> Switch {
        Switch::from(self.upgrade.is_some())
    }
}

/// # Errors
/// Returns `CodecError::Parse` when the response is not an object.
pub fn parse_software(raw: &Value) -> Result<SoftwareStatus, CodecError> {
    let object = raw
        .as_object()
        .ok_or_else(|| CodecError::Parse("software response is not an object".into()))?;

    let upgrade = object.get("upgrade").filter(|value| !value.is_null()).cloned();
    Ok(SoftwareStatus { upgrade })
}
