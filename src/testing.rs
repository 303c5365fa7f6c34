//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ConfigProvider;
use crate::mqtt::config::ConnectOptions;
use crate::mqtt::message_manager::InboundMessage;
use crate::mqtt::transport::{Transport, TransportError};
use crate::radio::{RadioController, RadioError};

#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub root: String,
    pub user: String,
    pub thing_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub board: u8,
}

impl StaticConfig {
    pub fn new(root: &str, user: &str, thing_name: &str) -> Self {
        Self {
            root: root.to_string(),
            user: user.to_string(),
            thing_name: thing_name.to_string(),
            latitude: 40.5,
            longitude: -3.25,
            board: 2,
        }
    }
}

impl ConfigProvider for StaticConfig {
    fn topic_root(&self) -> &str {
        &self.root
    }

    fn mqtt_server(&self) -> &str {
        "broker.test"
    }

    fn mqtt_port(&self) -> u16 {
        1883
    }

    fn mqtt_user(&self) -> &str {
        &self.user
    }

    fn mqtt_pass(&self) -> &str {
        "pass"
    }

    fn client_id(&self) -> String {
        format!("test-{}", self.thing_name)
    }

    fn thing_name(&self) -> &str {
        &self.thing_name
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn board(&self) -> u8 {
        self.board
    }
}

#[derive(Debug, Default)]
pub struct TransportLog {
    pub accept_connect: bool,
    pub connected: bool,
    pub connect_attempts: usize,
    pub last_options: Option<ConnectOptions>,
    pub published: Vec<(String, Vec<u8>)>,
    pub subscribed: Vec<String>,
    pub inbound: VecDeque<InboundMessage>,
    pub polls: usize,
}

/// Recording transport. Clones share the same log so a test can keep a handle
/// after moving the transport into the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl MockTransport {
    pub fn refusing() -> Self {
        Self::default()
    }

    pub fn accepting() -> Self {
        let transport = Self::default();
        transport.set_accept(true);
        transport
    }

    pub fn log(&self) -> MutexGuard<'_, TransportLog> {
        self.log.lock().unwrap()
    }

    pub fn set_accept(&self, accept: bool) {
        self.log().accept_connect = accept;
    }

    pub fn drop_connection(&self) {
        self.log().connected = false;
    }

    pub fn push_inbound(&self, topic: &str, payload: &[u8]) {
        self.log()
            .inbound
            .push_back(InboundMessage::new(topic, payload.to_vec()));
    }

    pub fn published_on(&self, topic: &str) -> Vec<Vec<u8>> {
        self.log()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn published_json(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published_on(topic)
            .iter()
            .map(|p| serde_json::from_slice(p).unwrap())
            .collect()
    }

    pub fn publish_count(&self) -> usize {
        self.log().published.len()
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), TransportError> {
        let mut log = self.log();
        log.connect_attempts += 1;
        log.last_options = Some(options.clone());
        if log.accept_connect {
            log.connected = true;
            Ok(())
        } else {
            log.connected = false;
            Err(TransportError::Refused("not authorized".to_string()))
        }
    }

    fn is_connected(&self) -> bool {
        self.log().connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        let mut log = self.log();
        if !log.connected {
            return Err(TransportError::NotConnected);
        }
        log.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let mut log = self.log();
        if !log.connected {
            return Err(TransportError::NotConnected);
        }
        log.subscribed.push(topic.to_string());
        Ok(())
    }

    fn poll(&mut self) -> Vec<InboundMessage> {
        let mut log = self.log();
        log.polls += 1;
        log.inbound.drain(..).collect()
    }
}

/// Radio that records every action it is asked to perform
#[derive(Debug, Clone, Default)]
pub struct MockRadio {
    calls: Arc<Mutex<Vec<(&'static str, Vec<u8>)>>>,
    reject: bool,
}

impl MockRadio {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(&'static str, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, action: &'static str, payload: &[u8]) -> Result<(), RadioError> {
        self.calls.lock().unwrap().push((action, payload.to_vec()));
        if self.reject {
            return Err(RadioError::Rejected(action.to_string()));
        }
        Ok(())
    }
}

impl RadioController for MockRadio {
    fn send_ping(&mut self) -> Result<(), RadioError> {
        self.record("ping", &[])
    }

    fn set_frequency(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("freq", payload)
    }

    fn set_bandwidth(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("bw", payload)
    }

    fn set_spreading_factor(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("sf", payload)
    }

    fn set_coding_rate(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("cr", payload)
    }

    fn set_crc(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("crc", payload)
    }

    fn set_preamble_length(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("pl", payload)
    }

    fn begin_lora(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("bl", payload)
    }

    fn begin_fsk(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.record("fs", payload)
    }
}
