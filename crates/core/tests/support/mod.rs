//! Shared fixtures for `uplinkbridge-core` integration tests.
//!
//! Response bodies are shaped like the vendor API's JSON so codec tests read
//! like the payloads they decode.

#![allow(dead_code)]

use serde_json::{json, Value};

/// One entry of a parameter read response
pub fn parameter(id: u32, raw_value: Value) -> Value {
    json!({
        "parameterId": id,
        "name": format!("param{id}"),
        "title": "fixture",
        "designation": "",
        "unit": "",
        "displayValue": raw_value.to_string(),
        "rawValue": raw_value,
    })
}

/// Parameter read response for `(id, rawValue)` pairs
pub fn parameter_page(entries: &[(u32, Value)]) -> Value {
    Value::Array(entries.iter().map(|(id, raw)| parameter(*id, raw.clone())).collect())
}

/// Status response listing the given active subsystem titles
pub fn status_page(titles: &[&str]) -> Value {
    Value::Array(
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| json!({"title": title, "parameters": [], "designation": i}))
            .collect(),
    )
}

/// System descriptor
pub fn system(connection_status: &str, has_alarmed: bool) -> Value {
    json!({
        "systemId": 36563,
        "name": "Heat pump",
        "productName": "F1255",
        "securityLevel": "ADMIN",
        "serialNumber": "06513218123456",
        "lastActivityDate": "2024-03-01T10:15:30Z",
        "connectionStatus": connection_status,
        "hasAlarmed": has_alarmed,
    })
}

/// Consecutive parameter ids starting at 40001
pub fn parameter_ids(count: u32) -> Vec<u32> {
    (0..count).map(|i| 40_001 + i).collect()
}
