//! Inbound command messages

use serde_json::Value;
use uplinkbridge_domain::constants::TOPIC_SET;
use uplinkbridge_domain::{Command, CommandFamily, CommandParseError, ParameterId};

/// Parse `<prefix>/Set/...` plus payload into a [`Command`]
///
/// The family is the first segment after `Set` naming a known family
/// (case-insensitive); segments before it are ignored. The segment after the
/// family, if any, is the subfield.
///
/// # Errors
/// - `UnknownCommand` when the topic names no known family
/// - `Malformed` when the family is known but subfield or payload is unusable
pub fn parse_inbound_command(topic: &str, payload: &str) -> Result<Command, CommandParseError> {
    let unknown = || CommandParseError::UnknownCommand(topic.to_string());

    let segments: Vec<&str> = topic.split('/').collect();
    let set_at = segments
        .iter()
        .position(|segment| segment.eq_ignore_ascii_case(TOPIC_SET))
        .ok_or_else(unknown)?;
    let routed = &segments[set_at + 1..];

    let (family_at, family) = routed
        .iter()
        .enumerate()
        .find_map(|(i, segment)| segment.parse::<CommandFamily>().ok().map(|family| (i, family)))
        .ok_or_else(unknown)?;
    let subfield = routed.get(family_at + 1).copied().filter(|s| !s.is_empty());

    match family {
        CommandFamily::Mode => Ok(Command::SetMode(scalar(family, payload)?)),
        CommandFamily::Parameters => {
            let raw_id = subfield.ok_or_else(|| malformed(family, "missing parameter id"))?;
            let id = raw_id.trim().parse::<ParameterId>().map_err(|_| {
                malformed(family, format!("'{raw_id}' is not a parameter id"))
            })?;
            Ok(Command::SetParameter(id, scalar(family, payload)?))
        }
        CommandFamily::Thermostats => {
            let value: Value = serde_json::from_str(payload)
                .map_err(|e| malformed(family, format!("invalid JSON: {e}")))?;
            let Value::Object(object) = value else {
                return Err(malformed(family, "payload must be a JSON object"));
            };
            for required in ["externalId", "name"] {
                if object.get(required).map_or(true, Value::is_null) {
                    return Err(malformed(family, format!("missing '{required}'")));
                }
            }
            Ok(Command::SetThermostat(object))
        }
    }
}

fn scalar(family: CommandFamily, payload: &str) -> Result<String, CommandParseError> {
    let value = payload.trim();
    if value.is_empty() {
        return Err(malformed(family, "empty payload"));
    }
    Ok(value.to_string())
}

fn malformed(family: CommandFamily, reason: impl Into<String>) -> CommandParseError {
    CommandParseError::Malformed { family: family.as_str(), reason: reason.into() }
}
