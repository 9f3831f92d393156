//! MQTT transport adapter over the ESP-IDF client.
//!
//! The client is owned by a sender thread, so the control loop never
//! calls into it: a publish is copied into [`LINK_REQUESTS`] and fails
//! fast when that queue is full or the session is down.  Inbound traffic
//! is received on a second thread and queued in [`LINK_EVENTS`], waiting
//! for room rather than dropping.  The client's event task blocks until
//! the receiver takes each event: no client call may be made from a
//! thread the receiver can end up waiting on.
//!
//! Sessions are numbered by the receiver.  [`MqttLink`] reports
//! connected only for the session the control loop has adopted through
//! [`MqttLink::session_started`], so a reconnect that the loop has not
//! seen yet never counts as reachable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{debug, info, trace, warn};

use crate::app::commands::for_each_subscription;
use crate::app::ports::{MessagingPort, PublishError};
use crate::config::NodeConfig;
use crate::events::{LINK_EVENTS, LINK_REQUESTS, LinkEvent, LinkRequest, OutboundMessage};

/// Client buffer; a full lighting universe must arrive in one piece.
const BUFFER_SIZE: usize = 1024;
const RX_STACK_SIZE: usize = 8 * 1024;
const TX_STACK_SIZE: usize = 6 * 1024;
/// Pause between enqueue attempts while the client outbox is full.
const ENQUEUE_RETRY: Duration = Duration::from_millis(5);

/// Session state shared by the receiver, the sender and the control loop.
#[derive(Default)]
struct Session {
    connected: AtomicBool,
    /// Incremented by the receiver on every connect.
    number: AtomicU32,
    resubscribe: AtomicBool,
}

pub struct MqttLink {
    session: Arc<Session>,
    adopted: u32,
}

impl MqttLink {
    /// Create the client and start the receiver and sender threads.
    pub fn start(config: &NodeConfig) -> anyhow::Result<Self> {
        let cfg = &config.mqtt;
        let conf = MqttClientConfiguration {
            client_id: Some(cfg.client_id.as_str()),
            username: cfg.username.as_ref().map(|u| u.as_str()),
            password: cfg.password.as_ref().map(|p| p.as_str()),
            buffer_size: BUFFER_SIZE,
            ..Default::default()
        };
        let (client, conn) = EspMqttClient::new(cfg.broker_url.as_str(), &conf)?;
        let session = Arc::new(Session::default());
        spawn_receiver(conn, session.clone())?;
        spawn_sender(client, config.clone(), session.clone())?;
        info!("MQTT: client started for {}", cfg.broker_url);
        Ok(Self {
            session,
            adopted: 0,
        })
    }

    /// Adopt the newest session after its `LinkEvent::Connected` and have
    /// the sender subscribe to every command topic again.
    pub fn session_started(&mut self) {
        self.adopted = self.session.number.load(Ordering::Acquire);
        self.session.resubscribe.store(true, Ordering::Release);
        // A full queue already has the sender awake; it sees the flag next.
        let _ = LINK_REQUESTS.try_send(LinkRequest::Resubscribe);
    }
}

impl MessagingPort for MqttLink {
    fn is_connected(&self) -> bool {
        self.session.connected.load(Ordering::Acquire)
            && self.session.number.load(Ordering::Acquire) == self.adopted
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::NotConnected);
        }
        let msg = OutboundMessage::new(topic, payload, retain)?;
        LINK_REQUESTS
            .try_send(LinkRequest::Publish(msg))
            .map_err(|_| PublishError::BufferFull)
    }
}

fn spawn_receiver(mut conn: EspMqttConnection, session: Arc<Session>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("mqtt-rx".into())
        .stack_size(RX_STACK_SIZE)
        .spawn(move || {
            while let Ok(event) = conn.next() {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        session.number.fetch_add(1, Ordering::AcqRel);
                        session.connected.store(true, Ordering::Release);
                        LINK_EVENTS.send(LinkEvent::Connected);
                    }
                    EventPayload::Disconnected => {
                        session.connected.store(false, Ordering::Release);
                        LINK_EVENTS.send(LinkEvent::Disconnected);
                    }
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        details: Details::Complete,
                        ..
                    } => {
                        LINK_EVENTS.send_message(topic, data);
                    }
                    EventPayload::Received { topic, .. } => {
                        warn!("MQTT: fragmented message on {:?} dropped", topic);
                    }
                    _ => {}
                }
            }
            session.connected.store(false, Ordering::Release);
            warn!("MQTT: connection closed, receiver exiting");
        })?;
    Ok(())
}

fn spawn_sender(
    mut client: EspMqttClient<'static>,
    config: NodeConfig,
    session: Arc<Session>,
) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("mqtt-tx".into())
        .stack_size(TX_STACK_SIZE)
        .spawn(move || {
            loop {
                let request = LINK_REQUESTS.receive();
                if session.resubscribe.swap(false, Ordering::AcqRel) {
                    subscribe_all(&mut client, &config);
                }
                if let LinkRequest::Publish(msg) = request {
                    enqueue(&mut client, &session, &msg);
                }
            }
        })?;
    Ok(())
}

fn subscribe_all(client: &mut EspMqttClient<'static>, config: &NodeConfig) {
    let mut failed = 0usize;
    for_each_subscription(config, |topic| {
        if let Err(e) = client.subscribe(topic, QoS::AtMostOnce) {
            warn!("MQTT: subscribe '{}' failed: {}", topic, e);
            failed += 1;
        }
    });
    if failed > 0 {
        warn!("MQTT: {} subscriptions failed", failed);
    }
}

/// Hand one publish to the client, retrying while the session lasts.  A
/// publish abandoned with its session is resent by the reconnect resync.
fn enqueue(client: &mut EspMqttClient<'static>, session: &Session, msg: &OutboundMessage) {
    while session.connected.load(Ordering::Acquire) {
        match client.enqueue(&msg.topic, QoS::AtLeastOnce, msg.retain, &msg.payload) {
            Ok(_) => return,
            Err(e) => {
                trace!("MQTT: enqueue '{}' deferred: {}", msg.topic, e);
                thread::sleep(ENQUEUE_RETRY);
            }
        }
    }
    debug!("MQTT: '{}' abandoned with its session", msg.topic);
}
