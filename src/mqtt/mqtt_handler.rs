//! [`Transport`] backed by the synchronous `rumqttc` client.
//!
//! Every connect attempt builds a fresh `Client`/`Connection` pair and waits a
//! bounded time for the broker's ConnAck. Afterwards the connection's event
//! loop is only driven from [`Transport::poll`], which also lets rumqttc
//! answer protocol-level keepalives.

use std::time::{Duration, Instant};

use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, LastWill, MqttOptions, Packet, QoS,
};
use tracing::{debug, info, warn};

use super::config::ConnectOptions;
use super::message_manager::InboundMessage;
use super::transport::{Transport, TransportError};

const REQUEST_CAPACITY: usize = 100;
const KEEP_ALIVE: Duration = Duration::from_secs(5);
/// Upper bound on events processed per receive pass
const MAX_EVENTS_PER_POLL: usize = 32;

struct Session {
    client: Client,
    connection: Connection,
}

pub struct RumqttTransport {
    session: Option<Session>,
    connected: bool,
    poll_timeout: Duration,
}

impl RumqttTransport {
    pub fn new(poll_timeout: Duration) -> Self {
        Self {
            session: None,
            connected: false,
            poll_timeout,
        }
    }

    /// Forgets the current session. Only reached once the session is dead,
    /// so nothing is sent to the broker.
    fn drop_session(&mut self) {
        self.session = None;
        self.connected = false;
    }
}

fn to_qos(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

impl Transport for RumqttTransport {
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), TransportError> {
        self.drop_session();

        let mut mqtt_options =
            MqttOptions::new(options.client_id.clone(), options.server.clone(), options.port);
        mqtt_options
            .set_credentials(options.user.clone(), options.pass.clone())
            .set_keep_alive(KEEP_ALIVE)
            .set_last_will(LastWill::new(
                options.will.topic.clone(),
                options.will.payload.clone(),
                to_qos(options.will.qos),
                options.will.retain,
            ));

        let (client, mut connection) = Client::new(mqtt_options, REQUEST_CAPACITY);
        let deadline = Instant::now() + options.connect_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout);
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(TransportError::Refused(format!("{:?}", ack.code)));
                    }
                    info!(
                        "Connected to {}:{} as {}",
                        options.server, options.port, options.client_id
                    );
                    self.session = Some(Session { client, connection });
                    self.connected = true;
                    return Ok(());
                }
                Ok(Ok(event)) => debug!("Event before ConnAck: {:?}", event),
                Ok(Err(e)) => return Err(TransportError::Connection(e.to_string())),
                Err(_) => return Err(TransportError::Timeout),
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected && self.session.is_some()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        let session = match &self.session {
            Some(session) if self.connected => session,
            _ => return Err(TransportError::NotConnected),
        };
        session
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|e| TransportError::Client(e.to_string()))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let session = match &self.session {
            Some(session) if self.connected => session,
            _ => return Err(TransportError::NotConnected),
        };
        session
            .client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| TransportError::Client(e.to_string()))
    }

    fn poll(&mut self) -> Vec<InboundMessage> {
        let mut inbound = Vec::new();
        let Some(session) = self.session.as_mut() else {
            return inbound;
        };

        let mut lost = false;
        for _ in 0..MAX_EVENTS_PER_POLL {
            match session.connection.recv_timeout(self.poll_timeout) {
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    inbound.push(InboundMessage::new(publish.topic, publish.payload.to_vec()));
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!("Broker connection lost: {}", e);
                    lost = true;
                    break;
                }
                // Nothing pending within the poll budget
                Err(_) => break,
            }
        }

        if lost {
            self.drop_session();
        }
        inbound
    }
}
