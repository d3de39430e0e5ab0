//! # Uplink Bridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the vendor API and the message bus
//! - The telemetry codec (batching, scaling, status and command parsing)
//! - The command router
//!
//! ## Architecture Principles
//! - Only depends on `uplinkbridge-domain`
//! - No HTTP, MQTT, or filesystem code
//! - All external dependencies via traits

pub mod codec;
pub mod ports;
pub mod router;

pub use codec::{ScaleTable, SubsystemStatus, SystemSummary, Topics};
pub use ports::{InboundMessage, MessageBus, UplinkApi};
pub use router::{log_api_error, CommandRouter};
