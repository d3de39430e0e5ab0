//! MQTT message bus

pub mod bridge;

pub use bridge::{mqtt_options, MqttBridge};
