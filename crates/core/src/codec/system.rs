//! System summary

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use uplinkbridge_domain::{CodecError, Switch};

/// Connection, activity and alarm state of the device
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    /// `YYYY-MM-DDTHH:MM:SS+0000`
    pub last_activity_date: Option<String>,
    /// 0 = online, 1 = pending, 2 = anything else
    pub connection_status: u8,
    pub has_alarmed: bool,
    /// Notifications payload, only attached when `has_alarmed`
    pub alarm: Option<Value>,
}

impl SystemSummary {
    /// Attach the notifications fetched by the caller
    #[must_use]
    pub fn with_alarm(mut self, alarm: Value) -> Self {
        if self.has_alarmed {
            self.alarm = Some(alarm);
        }
        self
    }

    /// `(field, payload)` pairs in publication order
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(4);
        if let Some(date) = &self.last_activity_date {
            fields.push(("LastActivityDate", date.clone()));
        }
        fields.push(("ConnectionStatus", self.connection_status.to_string()));
        fields.push(("HasAlarmed", Switch::from(self.has_alarmed).to_string()));
        if let Some(alarm) = &self.alarm {
            fields.push(("Alarm", alarm.to_string()));
        }
        fields
    }
}

/// Extract the summary fields from the system descriptor
///
/// # Errors
/// Returns `CodecError::Parse` when the response is not an object.
pub fn parse_system_summary(raw: &Value) -> Result<SystemSummary, CodecError> {
    let object = raw
        .as_object()
        .ok_or_else(|| CodecError::Parse("system response is not an object".into()))?;

    let connection_status = match object.get("connectionStatus").and_then(Value::as_str) {
        Some("ONLINE") => 0,
        Some("PENDING") => 1,
        _ => 2,
    };

    Ok(SystemSummary {
        last_activity_date: object
            .get("lastActivityDate")
            .and_then(Value::as_str)
            .map(normalize_activity_date),
        connection_status,
        has_alarmed: object.get("hasAlarmed").and_then(Value::as_bool).unwrap_or(false),
        alarm: None,
    })
}

/// Render a timestamp in UTC with an explicit `+0000` offset
///
/// RFC 3339 input with a `T` separator is converted properly; anything else
/// has its final character (the zone designator) replaced.
#[must_use]
pub fn normalize_activity_date(raw: &str) -> String {
    if let Some(parsed) = parse_strict_rfc3339(raw) {
        return parsed.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%S+0000").to_string();
    }
    let mut chopped = raw.to_string();
    chopped.pop();
    chopped.push_str("+0000");
    chopped
}

/// chrono also accepts a space between date and time; only `T` counts here
fn parse_strict_rfc3339(raw: &str) -> Option<DateTime<FixedOffset>> {
    if raw.as_bytes().get(10) != Some(&b'T') {
        return None;
    }
    DateTime::parse_from_rfc3339(raw).ok()
}
