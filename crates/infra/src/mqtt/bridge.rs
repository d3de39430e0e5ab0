//! [`MessageBus`] over an MQTT broker
//!
//! A driver task owns the rumqttc event loop. It reconnects after transport
//! failures with exponential backoff, re-subscribes every registered pattern
//! after each `ConnAck`, and forwards inbound publishes into a channel that
//! outlives individual connections.

use std::sync::Arc;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uplinkbridge_common::resilience::Backoff;
use uplinkbridge_core::{InboundMessage, MessageBus};
use uplinkbridge_domain::constants::{
    MQTT_CLIENT_ID, MQTT_KEEP_ALIVE, RECONNECT_INITIAL_DELAY, RECONNECT_MAX_DELAY,
};
use uplinkbridge_domain::{BusError, MqttSettings};

/// Capacity of the client request queue; publishes wait when it is full
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Inbound messages buffered between the driver and `receive`
const INBOUND_CHANNEL_CAPACITY: usize = 64;

/// Broker options for `settings`
pub fn mqtt_options(settings: &MqttSettings) -> MqttOptions {
    let mut options = MqttOptions::new(MQTT_CLIENT_ID, settings.host.clone(), settings.port);
    options.set_keep_alive(MQTT_KEEP_ALIVE);
    if let Some(username) = &settings.username {
        options.set_credentials(username.clone(), settings.password.clone().unwrap_or_default());
    }
    options
}

/// State shared between the bridge and its driver task
struct Shared {
    patterns: parking_lot::Mutex<Vec<String>>,
    connected: watch::Sender<bool>,
    inbound: mpsc::Sender<InboundMessage>,
}

/// One broker connection and the task driving it
struct Session {
    client: AsyncClient,
    cancel: CancellationToken,
    driver: JoinHandle<()>,
}

/// MQTT implementation of the bridge's message bus
pub struct MqttBridge {
    settings: parking_lot::Mutex<MqttSettings>,
    shared: Arc<Shared>,
    session: AsyncMutex<Option<Session>>,
    inbound_rx: AsyncMutex<mpsc::Receiver<InboundMessage>>,
    closed: parking_lot::Mutex<CancellationToken>,
}

impl MqttBridge {
    pub fn new(settings: MqttSettings) -> Self {
        let (inbound, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let (connected, _) = watch::channel(false);

        Self {
            settings: parking_lot::Mutex::new(settings),
            shared: Arc::new(Shared {
                patterns: parking_lot::Mutex::new(Vec::new()),
                connected,
                inbound,
            }),
            session: AsyncMutex::new(None),
            inbound_rx: AsyncMutex::new(inbound_rx),
            closed: parking_lot::Mutex::new(CancellationToken::new()),
        }
    }

    /// Settings used by the next connection
    pub fn settings(&self) -> MqttSettings {
        self.settings.lock().clone()
    }

    /// Registered subscription patterns
    pub fn patterns(&self) -> Vec<String> {
        self.shared.patterns.lock().clone()
    }

    async fn client(&self) -> Result<AsyncClient, BusError> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.client.clone())
            .ok_or(BusError::NotConnected)
    }

    /// Stop the driver and drop the connection
    async fn teardown(&self) {
        let Some(session) = self.session.lock().await.take() else {
            return;
        };

        if let Err(err) = session.client.try_disconnect() {
            debug!(error = %err, "Disconnect request not queued");
        }
        session.cancel.cancel();
        if let Err(err) = session.driver.await {
            warn!(error = %err, "MQTT driver task ended abnormally");
        }
        self.shared.connected.send_replace(false);
    }
}

#[async_trait]
impl MessageBus for MqttBridge {
    async fn connect(&self) -> Result<(), BusError> {
        {
            let mut closed = self.closed.lock();
            if closed.is_cancelled() {
                *closed = CancellationToken::new();
            }
        }

        let mut connected = self.shared.connected.subscribe();
        {
            let mut session = self.session.lock().await;
            if session.is_none() {
                let settings = self.settings();
                info!(host = %settings.host, port = settings.port, "Connecting to MQTT broker");

                let (client, eventloop) =
                    AsyncClient::new(mqtt_options(&settings), REQUEST_CHANNEL_CAPACITY);
                let cancel = CancellationToken::new();
                let driver = tokio::spawn(drive(
                    eventloop,
                    client.clone(),
                    Arc::clone(&self.shared),
                    cancel.clone(),
                ));
                *session = Some(Session { client, cancel, driver });
            }
        }

        // The driver retries with backoff until the broker accepts us
        connected.wait_for(|up| *up).await.map_err(|_| BusError::Closed)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BusError> {
        self.teardown().await;
        self.closed.lock().cancel();
        info!("Disconnected from MQTT broker");
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        let client = self.client().await?;
        debug!(topic = %topic, payload = %payload, "Publishing");
        client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), BusError> {
        {
            let mut patterns = self.shared.patterns.lock();
            if !patterns.iter().any(|p| p == pattern) {
                patterns.push(pattern.to_string());
            }
        }

        if !self.is_connected() {
            // Subscribed by the driver on the next ConnAck
            return Ok(());
        }
        let client = self.client().await?;
        client
            .subscribe(pattern, QoS::AtLeastOnce)
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        info!(pattern = %pattern, "Subscribed");
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, BusError> {
        let closed = self.closed.lock().clone();
        let mut inbound = self.inbound_rx.lock().await;

        tokio::select! {
            () = closed.cancelled() => Err(BusError::Closed),
            message = inbound.recv() => message.ok_or(BusError::Closed),
        }
    }

    fn is_connected(&self) -> bool {
        *self.shared.connected.borrow()
    }

    async fn reconfigure(&self, settings: MqttSettings) -> Result<(), BusError> {
        info!(host = %settings.host, port = settings.port, "Reconnecting with new broker settings");
        self.teardown().await;
        *self.settings.lock() = settings;
        self.connect().await
    }
}

/// What the driver does after handling one event
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    /// Broker accepted the connection; reset the backoff
    Connected,
    Continue,
}

/// Poll the event loop until cancelled
async fn drive(
    mut eventloop: EventLoop,
    client: AsyncClient,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) {
    let mut backoff = Backoff::new(RECONNECT_INITIAL_DELAY, RECONNECT_MAX_DELAY);

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(event) => {
                if handle_event(event, &shared, &client).await == Outcome::Connected {
                    backoff.reset();
                }
            }
            Err(err) => {
                handle_error(&err, &shared, backoff.attempt() + 1);
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = backoff.wait() => {}
                }
            }
        }
    }

    shared.connected.send_replace(false);
    debug!("MQTT driver stopped");
}

/// Apply one event-loop event to the shared state
async fn handle_event(event: Event, shared: &Shared, client: &AsyncClient) -> Outcome {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => {
            shared.connected.send_replace(true);
            info!("Connected to MQTT broker");

            let patterns = shared.patterns.lock().clone();
            for pattern in patterns {
                // Queued without waiting: the driver is the one draining the queue
                match client.try_subscribe(pattern.as_str(), QoS::AtLeastOnce) {
                    Ok(()) => info!(pattern = %pattern, "Subscribed"),
                    Err(err) => warn!(pattern = %pattern, error = %err, "Subscribe failed"),
                }
            }
            Outcome::Connected
        }
        Event::Incoming(Packet::Publish(publish)) => {
            let Ok(payload) = String::from_utf8(publish.payload.to_vec()) else {
                warn!(topic = %publish.topic, "Dropping message with non-UTF-8 payload");
                return Outcome::Continue;
            };
            let message = InboundMessage::new(publish.topic, payload);
            if shared.inbound.send(message).await.is_err() {
                debug!("Inbound receiver dropped");
            }
            Outcome::Continue
        }
        Event::Incoming(Packet::Disconnect) => {
            shared.connected.send_replace(false);
            warn!("Broker closed the connection");
            Outcome::Continue
        }
        _ => Outcome::Continue,
    }
}

fn handle_error(err: &ConnectionError, shared: &Shared, attempt: u32) {
    shared.connected.send_replace(false);
    warn!(error = %err, attempt, "MQTT connection error");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rumqttc::{ConnAck, ConnectReturnCode, Publish};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;

    use super::*;

    fn settings() -> MqttSettings {
        MqttSettings {
            host: "broker.invalid".into(),
            port: 1883,
            username: Some("bridge".into()),
            password: Some("hunter2".into()),
        }
    }

    #[test]
    fn test_options_from_settings() {
        let options = mqtt_options(&settings());

        assert_eq!(options.broker_address(), ("broker.invalid".to_string(), 1883));
        assert_eq!(options.client_id(), MQTT_CLIENT_ID);
        assert_eq!(options.keep_alive(), MQTT_KEEP_ALIVE);
        assert_eq!(options.credentials(), Some(("bridge".to_string(), "hunter2".to_string())));
    }

    #[test]
    fn test_anonymous_options() {
        let options =
            mqtt_options(&MqttSettings { username: None, password: None, ..settings() });
        assert!(options.credentials().is_none());
    }

    #[tokio::test]
    async fn test_publish_requires_connection() {
        let bridge = MqttBridge::new(settings());
        assert!(!bridge.is_connected());
        assert!(matches!(bridge.publish("Bridge/Software", "OFF").await, Err(BusError::NotConnected)));
    }

    #[tokio::test]
    async fn test_subscribe_while_disconnected_is_remembered() {
        let bridge = MqttBridge::new(settings());
        bridge.subscribe("Bridge/Set/#").await.unwrap();
        bridge.subscribe("Bridge/Set/#").await.unwrap();

        assert_eq!(bridge.patterns(), vec!["Bridge/Set/#".to_string()]);
    }

    #[tokio::test]
    async fn test_disconnect_wakes_receiver() {
        let bridge = Arc::new(MqttBridge::new(settings()));
        let receiver = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move { bridge.receive().await })
        };
        tokio::task::yield_now().await;

        bridge.disconnect().await.unwrap();
        let result = receiver.await.unwrap();
        assert!(matches!(result, Err(BusError::Closed)));
    }

    fn shared_with(patterns: &[&str]) -> (Shared, mpsc::Receiver<InboundMessage>) {
        let (inbound, inbound_rx) = mpsc::channel(8);
        let (connected, _) = watch::channel(false);
        let shared = Shared {
            patterns: parking_lot::Mutex::new(patterns.iter().map(ToString::to_string).collect()),
            connected,
            inbound,
        };
        (shared, inbound_rx)
    }

    fn incoming_publish(topic: &str, payload: impl Into<Vec<u8>>) -> Event {
        Event::Incoming(Packet::Publish(Publish::new(topic, QoS::AtLeastOnce, payload.into())))
    }

    #[tokio::test]
    async fn test_connack_marks_connected() {
        let (shared, _inbound) = shared_with(&["Bridge/Set/#"]);
        let (client, _eventloop) = AsyncClient::new(mqtt_options(&settings()), 8);

        let ack = Event::Incoming(Packet::ConnAck(ConnAck::new(ConnectReturnCode::Success, false)));
        assert_eq!(handle_event(ack, &shared, &client).await, Outcome::Connected);
        assert!(*shared.connected.borrow());
    }

    #[tokio::test]
    async fn test_publish_is_forwarded_and_binary_dropped() {
        let (shared, mut inbound) = shared_with(&[]);
        let (client, _eventloop) = AsyncClient::new(mqtt_options(&settings()), 8);

        let binary = incoming_publish("Bridge/Set/mode", vec![0xff, 0xfe]);
        assert_eq!(handle_event(binary, &shared, &client).await, Outcome::Continue);
        assert!(inbound.try_recv().is_err());

        let text = incoming_publish("Bridge/Set/mode", "away");
        handle_event(text, &shared, &client).await;
        let message = inbound.try_recv().unwrap();
        assert_eq!(message.topic, "Bridge/Set/mode");
        assert_eq!(message.payload, "away");
    }

    #[tokio::test]
    async fn test_disconnect_and_errors_mark_disconnected() {
        let (shared, _inbound) = shared_with(&[]);
        let (client, _eventloop) = AsyncClient::new(mqtt_options(&settings()), 8);

        shared.connected.send_replace(true);
        handle_event(Event::Incoming(Packet::Disconnect), &shared, &client).await;
        assert!(!*shared.connected.borrow());

        shared.connected.send_replace(true);
        let err = ConnectionError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        handle_error(&err, &shared, 1);
        assert!(!*shared.connected.borrow());
    }

    /// Read one MQTT packet; returns the packet type and the variable part
    async fn read_packet(stream: &mut TcpStream) -> (u8, Vec<u8>) {
        let kind = stream.read_u8().await.unwrap();
        let mut len = 0usize;
        let mut shift = 0;
        loop {
            let byte = stream.read_u8().await.unwrap();
            len |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let mut body = vec![0; len];
        stream.read_exact(&mut body).await.unwrap();
        (kind >> 4, body)
    }

    fn publish_packet(topic: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = u16::try_from(topic.len()).unwrap().to_be_bytes().to_vec();
        body.extend_from_slice(topic.as_bytes());
        body.extend_from_slice(payload);
        let mut packet = vec![0x30, u8::try_from(body.len()).unwrap()];
        packet.extend(body);
        packet
    }

    /// Accept one client, acknowledge it and return its first subscription
    async fn accept_session(listener: &TcpListener) -> (TcpStream, String) {
        let (mut stream, _) = listener.accept().await.unwrap();
        let (kind, _) = read_packet(&mut stream).await;
        assert_eq!(kind, 1, "expected CONNECT");
        stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();

        let (kind, body) = read_packet(&mut stream).await;
        assert_eq!(kind, 8, "expected SUBSCRIBE");
        let len = usize::from(u16::from_be_bytes([body[2], body[3]]));
        let pattern = String::from_utf8(body[4..4 + len].to_vec()).unwrap();
        stream.write_all(&[0x90, 0x03, body[0], body[1], 0x01]).await.unwrap();
        (stream, pattern)
    }

    #[tokio::test]
    async fn test_driver_forwards_and_resubscribes_after_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let bridge = MqttBridge::new(MqttSettings {
            host: "127.0.0.1".into(),
            port,
            username: None,
            password: None,
        });
        bridge.subscribe("Bridge/Set/#").await.unwrap();

        let mut states = bridge.shared.connected.subscribe();
        let transitions = tokio::spawn(async move {
            let mut seen: Vec<bool> = Vec::new();
            while seen.len() < 3 && states.changed().await.is_ok() {
                let up = *states.borrow_and_update();
                if seen.last() != Some(&up) {
                    seen.push(up);
                }
            }
            seen
        });

        let (release, released) = tokio::sync::oneshot::channel::<()>();
        let broker = tokio::spawn(async move {
            let (mut first, first_pattern) = accept_session(&listener).await;
            first.write_all(&publish_packet("Bridge/Set/mode", &[0xff, 0xfe])).await.unwrap();
            first.write_all(&publish_packet("Bridge/Set/mode", b"away")).await.unwrap();
            released.await.unwrap();
            drop(first);

            let (second, second_pattern) = accept_session(&listener).await;
            (first_pattern, second_pattern, second)
        });

        let wait = Duration::from_secs(10);
        timeout(wait, bridge.connect()).await.unwrap().unwrap();
        let message = timeout(wait, bridge.receive()).await.unwrap().unwrap();
        assert_eq!(message.topic, "Bridge/Set/mode");
        assert_eq!(message.payload, "away");
        release.send(()).unwrap();

        let (first, second, _session) = timeout(wait, broker).await.unwrap().unwrap();
        assert_eq!(first, "Bridge/Set/#");
        assert_eq!(second, "Bridge/Set/#");
        assert_eq!(timeout(wait, transitions).await.unwrap().unwrap(), vec![true, false, true]);

        bridge.disconnect().await.unwrap();
    }
}
