//! Port interfaces for the two external systems
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uplinkbridge_domain::{ApiResult, BusError, MqttSettings, ParameterBatch, ParameterId};

/// Read and write operations of the vendor telemetry API
///
/// Implementations obtain a valid bearer token for every call and classify
/// failures into [`uplinkbridge_domain::ApiError`].
#[async_trait]
pub trait UplinkApi: Send + Sync {
    /// System descriptor (`lastActivityDate`, `connectionStatus`, `hasAlarmed`)
    async fn system(&self) -> ApiResult<Value>;

    /// Active subsystems
    async fn status(&self) -> ApiResult<Value>;

    /// Installed software and pending upgrade
    async fn software(&self) -> ApiResult<Value>;

    /// Current values of one page of parameters
    async fn parameters(&self, batch: &ParameterBatch) -> ApiResult<Value>;

    /// Alarms registered on the system
    async fn notifications(&self) -> ApiResult<Value>;

    async fn set_mode(&self, mode: &str) -> ApiResult<()>;

    async fn set_parameters(&self, settings: &BTreeMap<ParameterId, String>) -> ApiResult<()>;

    async fn set_thermostat(&self, thermostat: &Map<String, Value>) -> ApiResult<()>;
}

/// A message delivered on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

impl InboundMessage {
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self { topic: topic.into(), payload: payload.into() }
    }
}

/// Publish/subscribe connection owned by the bridge
///
/// All methods are safe to call from concurrent tasks. Transport failures are
/// handled inside the implementation by reconnecting with backoff; callers
/// only see [`BusError::Closed`] once the bus has been shut down.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Establish the connection, retrying until it succeeds
    async fn connect(&self) -> Result<(), BusError>;

    /// Close the connection and wake any pending `receive` with `Closed`
    async fn disconnect(&self) -> Result<(), BusError>;

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError>;

    /// Register a pattern; it is re-subscribed after every reconnect
    async fn subscribe(&self, pattern: &str) -> Result<(), BusError>;

    /// Wait for the next inbound message
    async fn receive(&self) -> Result<InboundMessage, BusError>;

    fn is_connected(&self) -> bool;

    /// Drop the connection and reconnect with new broker settings
    async fn reconfigure(&self, settings: MqttSettings) -> Result<(), BusError>;
}
