//! Subsystem activity flags

use serde_json::Value;
use uplinkbridge_domain::{CodecError, Switch};

/// Subsystems always reported, OFF unless listed as active
pub const SUBSYSTEMS: [&str; 7] = [
    "Ventilation",
    "Heating Medium Pump",
    "Holiday",
    "Hot Water",
    "Compressor",
    "Addition",
    "Heating",
];

/// On/off state per subsystem title, in report order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsystemStatus {
    flags: Vec<(String, Switch)>,
}

impl SubsystemStatus {
    #[must_use]
    pub fn get(&self, title: &str) -> Option<Switch> {
        self.flags.iter().find(|(name, _)| name == title).map(|(_, switch)| *switch)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Switch)> {
        self.flags.iter().map(|(name, switch)| (name.as_str(), *switch))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flags keyed by their topic-safe name (see [`normalize_key`])
    #[must_use]
    pub fn normalized(&self) -> Vec<(String, Switch)> {
        self.iter().map(|(name, switch)| (normalize_key(name), switch)).collect()
    }

    fn set_on(&mut self, title: &str) {
        match self.flags.iter_mut().find(|(name, _)| name == title) {
            Some((_, switch)) => *switch = Switch::On,
            None => self.flags.push((title.to_string(), Switch::On)),
        }
    }
}

impl Default for SubsystemStatus {
    fn default() -> Self {
        Self { flags: SUBSYSTEMS.iter().map(|name| ((*name).to_string(), Switch::Off)).collect() }
    }
}

/// Spaces removed, first letter upper-cased, the rest lower-cased:
/// `"Hot Water"` becomes `"Hotwater"`
#[must_use]
pub fn normalize_key(title: &str) -> String {
    let compact: String = title.chars().filter(|c| !c.is_whitespace()).collect();
    let mut chars = compact.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Turn the list of active items into the full flag set
///
/// Titles outside [`SUBSYSTEMS`] are appended as extra ON entries.
///
/// # Errors
/// Returns `CodecError::Parse` when the response is not an array.
pub fn parse_status(raw: &Value) -> Result<SubsystemStatus, CodecError> {
    let items = raw
        .as_array()
        .ok_or_else(|| CodecError::Parse("status response is not an array".into()))?;

    let mut status = SubsystemStatus::default();
    for title in items.iter().filter_map(|item| item.get("title")?.as_str()) {
        status.set_on(title);
    }
    Ok(status)
}
