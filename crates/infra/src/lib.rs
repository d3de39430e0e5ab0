//! # Uplink Bridge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The vendor API client and OAuth token endpoint (`reqwest`)
//! - The MQTT message bus (`rumqttc`)
//! - Configuration loading and hot reload
//! - The polling scheduler
//!
//! ## Architecture
//! - Implements traits defined in `uplinkbridge-core`
//! - Depends on `uplinkbridge-common` for token lifecycle and backoff
//! - Contains all "impure" code (network, filesystem, timers)

pub mod api;
pub mod config;
pub mod mqtt;
pub mod scheduling;

// Re-export commonly used items
pub use api::{AccessTokenProvider, OAuthEndpoint, UplinkClient};
pub use config::ConfigHandle;
pub use mqtt::MqttBridge;
pub use scheduling::{PollScheduler, SchedulerError, SchedulerState};
