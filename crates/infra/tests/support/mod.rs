//! Shared test doubles for `uplinkbridge-infra` integration tests.
//!
//! [`RecordingApi`] and [`RecordingBus`] write into one [`Timeline`] so tests
//! can assert the interleaving of API calls and publishes.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uplinkbridge_core::{InboundMessage, MessageBus, UplinkApi};
use uplinkbridge_domain::{
    ApiError, ApiResult, BridgeConfig, BusError, MqttSettings, ParameterBatch, ParameterId,
};
use uplinkbridge_infra::AccessTokenProvider;

/// Something observable the bridge did
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// API call name and seconds since the timeline started
    Call(&'static str, u64),
    Publish(String, String),
}

/// Ordered record of calls and publishes
#[derive(Debug)]
pub struct Timeline {
    start: Instant,
    entries: Mutex<Vec<Entry>>,
}

impl Timeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { start: Instant::now(), entries: Mutex::new(Vec::new()) })
    }

    pub fn call(&self, name: &'static str) {
        let at = self.start.elapsed().as_secs();
        self.entries.lock().push(Entry::Call(name, at));
    }

    pub fn publish(&self, topic: &str, payload: &str) {
        self.entries.lock().push(Entry::Publish(topic.to_string(), payload.to_string()));
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    /// `(name, seconds)` of every API call
    pub fn calls(&self) -> Vec<(&'static str, u64)> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Call(name, at) => Some((name, at)),
                Entry::Publish(..) => None,
            })
            .collect()
    }

    /// Payload of the last publish on `topic`
    pub fn published(&self, topic: &str) -> Option<String> {
        self.entries().into_iter().rev().find_map(|entry| match entry {
            Entry::Publish(t, payload) if t == topic => Some(payload),
            _ => None,
        })
    }
}

/// Vendor API double returning canned responses
pub struct RecordingApi {
    timeline: Arc<Timeline>,
    pub has_alarmed: bool,
    pub upgrade: Option<Value>,
    pub failing: Mutex<Vec<&'static str>>,
    pub writes: Mutex<Vec<String>>,
}

impl RecordingApi {
    pub fn new(timeline: Arc<Timeline>) -> Self {
        Self {
            timeline,
            has_alarmed: false,
            upgrade: None,
            failing: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Make calls named `name` fail with a server error
    pub fn fail(&self, name: &'static str) {
        self.failing.lock().push(name);
    }

    fn record(&self, name: &'static str) -> ApiResult<()> {
        self.timeline.call(name);
        if self.failing.lock().contains(&name) {
            return Err(ApiError::Server { status: 503 });
        }
        Ok(())
    }
}

#[async_trait]
impl UplinkApi for RecordingApi {
    async fn system(&self) -> ApiResult<Value> {
        self.record("system")?;
        Ok(json!({
            "lastActivityDate": "2024-03-01T10:15:30Z",
            "connectionStatus": "ONLINE",
            "hasAlarmed": self.has_alarmed
        }))
    }

    async fn status(&self) -> ApiResult<Value> {
        self.record("status")?;
        Ok(json!([{"title": "Heating"}, {"title": "Compressor"}]))
    }

    async fn software(&self) -> ApiResult<Value> {
        self.record("software")?;
        Ok(json!({"current": {"name": "9.4"}, "upgrade": self.upgrade}))
    }

    async fn parameters(&self, batch: &ParameterBatch) -> ApiResult<Value> {
        self.record("parameters")?;
        Ok(Value::Array(
            batch.ids().iter().map(|id| json!({"parameterId": id, "rawValue": 205})).collect(),
        ))
    }

    async fn notifications(&self) -> ApiResult<Value> {
        self.record("notifications")?;
        Ok(json!([{"header": "High condenser out"}]))
    }

    async fn set_mode(&self, mode: &str) -> ApiResult<()> {
        self.record("set_mode")?;
        self.writes.lock().push(format!("mode={mode}"));
        Ok(())
    }

    async fn set_parameters(&self, settings: &BTreeMap<ParameterId, String>) -> ApiResult<()> {
        self.record("set_parameters")?;
        for (id, value) in settings {
            self.writes.lock().push(format!("{id}={value}"));
        }
        Ok(())
    }

    async fn set_thermostat(&self, thermostat: &Map<String, Value>) -> ApiResult<()> {
        self.record("set_thermostat")?;
        self.writes.lock().push(format!("thermostat={}", thermostat["externalId"]));
        Ok(())
    }
}

/// Message bus double; inbound messages are injected through [`RecordingBus::inject`]
pub struct RecordingBus {
    timeline: Arc<Timeline>,
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<InboundMessage>>,
    closed: CancellationToken,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub subscriptions: Mutex<Vec<String>>,
    pub reconfigured: Mutex<Vec<MqttSettings>>,
    connected: Mutex<bool>,
}

impl RecordingBus {
    pub fn new(timeline: Arc<Timeline>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            timeline,
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            closed: CancellationToken::new(),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            subscriptions: Mutex::new(Vec::new()),
            reconfigured: Mutex::new(Vec::new()),
            connected: Mutex::new(false),
        }
    }

    pub fn inject(&self, topic: &str, payload: &str) {
        self.inbound_tx.send(InboundMessage::new(topic, payload)).unwrap();
    }
}

#[async_trait]
impl MessageBus for RecordingBus {
    async fn connect(&self) -> Result<(), BusError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.connected.lock() = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BusError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        *self.connected.lock() = false;
        self.closed.cancel();
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        self.timeline.publish(topic, payload);
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), BusError> {
        self.subscriptions.lock().push(pattern.to_string());
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, BusError> {
        let mut inbound = self.inbound_rx.lock().await;
        tokio::select! {
            () = self.closed.cancelled() => Err(BusError::Closed),
            message = inbound.recv() => message.ok_or(BusError::Closed),
        }
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn reconfigure(&self, settings: MqttSettings) -> Result<(), BusError> {
        self.reconfigured.lock().push(settings);
        Ok(())
    }
}

/// Token provider handing out numbered tokens
#[derive(Default)]
pub struct CountingTokens {
    pub refreshes: AtomicUsize,
}

impl CountingTokens {
    pub fn current(&self) -> String {
        format!("token-{}", self.refreshes.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl AccessTokenProvider for CountingTokens {
    async fn access_token(&self) -> ApiResult<String> {
        Ok(self.current())
    }

    async fn force_refresh(&self, rejected: &str) -> ApiResult<String> {
        if rejected == self.current() {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(self.current())
    }
}

/// TOML for a valid configuration, followed by `extra` lines
pub fn config_toml(extra: &str) -> String {
    format!(
        r#"
client_id = "abc"
client_secret = "s3cret"
system_id = 36563
mqtt_host = "broker.local"
{extra}
"#
    )
}

pub fn config(extra: &str) -> BridgeConfig {
    toml::from_str(&config_toml(extra)).unwrap()
}

/// `count` consecutive parameter ids as a TOML array
pub fn parameter_list(count: u32) -> String {
    let ids: Vec<String> = (0..count).map(|i| (40_001 + i).to_string()).collect();
    format!("parameters = [{}]", ids.join(", "))
}

/// Let spawned tasks run without advancing time
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub const SECOND: Duration = Duration::from_secs(1);

impl RecordingBus {
    /// `MessageBus::is_connected` without importing the trait
    pub fn is_connected_now(&self) -> bool {
        *self.connected.lock()
    }
}
